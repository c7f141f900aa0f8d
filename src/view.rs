use crate::waveform::Waveform;

/// Presentation side of the panel. The widgets only push state into it.
pub trait View: Send {
    fn redraw(&mut self, waveform: &Waveform);
    fn show_marker(&mut self, time: f64, value: f64);
    fn hide_marker(&mut self);
    fn show_coordinates(&mut self, time: f64, value: f64);
    fn show_joystick(&mut self, info: &str);
    fn show_message(&mut self, message: &str);
}

const PLOT_WIDTH: usize = 60;
const PLOT_HEIGHT: usize = 10;

/// Plain stdout rendering for the terminal front end.
#[derive(Default)]
pub struct TerminalView {
    marker_visible: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    fn plot(waveform: &Waveform) -> Vec<String> {
        let mut rows = vec![vec![' '; PLOT_WIDTH]; PLOT_HEIGHT];
        if !waveform.is_empty() {
            let (first, last) = {
                let points = waveform.points();
                (points[0].x, points[points.len() - 1].x)
            };
            for col in 0..PLOT_WIDTH {
                let t = waveform.x_limit() * col as f64 / (PLOT_WIDTH - 1) as f64;
                if t < first || t > last {
                    continue;
                }
                let v = waveform.interpolate(t).clamp(0.0, 100.0);
                let row = ((100.0 - v) / 100.0 * (PLOT_HEIGHT - 1) as f64).round() as usize;
                rows[row][col] = '.';
            }
            for p in waveform.points() {
                let col = (p.x / waveform.x_limit() * (PLOT_WIDTH - 1) as f64).round() as usize;
                let row = ((100.0 - p.y) / 100.0 * (PLOT_HEIGHT - 1) as f64).round() as usize;
                rows[row.min(PLOT_HEIGHT - 1)][col.min(PLOT_WIDTH - 1)] = 'o';
            }
        }
        rows.into_iter()
            .enumerate()
            .map(|(i, row)| {
                let label = if i == 0 {
                    "100"
                } else if i == PLOT_HEIGHT - 1 {
                    "  0"
                } else {
                    "   "
                };
                format!("{} |{}", label, row.into_iter().collect::<String>())
            })
            .collect()
    }
}

impl View for TerminalView {
    fn redraw(&mut self, waveform: &Waveform) {
        for line in Self::plot(waveform) {
            println!("{}", line);
        }
        println!("    +{}", "-".repeat(PLOT_WIDTH));
        println!("     0{:>width$.0}", waveform.x_limit(), width = PLOT_WIDTH - 1);
        for p in waveform.points() {
            println!("  #{}  t={:.2}  v={:.2}", p.id, p.x, p.y);
        }
    }

    fn show_marker(&mut self, time: f64, value: f64) {
        self.marker_visible = true;
        log::trace!("marker at t={:.3} v={:.2}", time, value);
    }

    fn hide_marker(&mut self) {
        if self.marker_visible {
            self.marker_visible = false;
            println!("playback finished");
        }
    }

    fn show_coordinates(&mut self, time: f64, value: f64) {
        println!("({}, {})", time.round(), value.round());
    }

    fn show_joystick(&mut self, info: &str) {
        println!("{}", info);
    }

    fn show_message(&mut self, message: &str) {
        println!("{}", message);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::waveform::ControlPoint;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Drawn {
        Redraw { points: Vec<ControlPoint>, x_limit: f64 },
        Marker(f64, f64),
        HideMarker,
        Coordinates(f64, f64),
        Joystick(String),
        Message(String),
    }

    /// Keeps every draw call for inspection.
    #[derive(Clone, Default)]
    pub struct RecordingView {
        pub drawn: Arc<Mutex<Vec<Drawn>>>,
    }

    impl RecordingView {
        pub fn take(&self) -> Vec<Drawn> {
            std::mem::take(&mut *self.drawn.lock().unwrap())
        }
    }

    impl View for RecordingView {
        fn redraw(&mut self, waveform: &Waveform) {
            self.drawn.lock().unwrap().push(Drawn::Redraw {
                points: waveform.points().to_vec(),
                x_limit: waveform.x_limit(),
            });
        }

        fn show_marker(&mut self, time: f64, value: f64) {
            self.drawn.lock().unwrap().push(Drawn::Marker(time, value));
        }

        fn hide_marker(&mut self) {
            self.drawn.lock().unwrap().push(Drawn::HideMarker);
        }

        fn show_coordinates(&mut self, time: f64, value: f64) {
            self.drawn.lock().unwrap().push(Drawn::Coordinates(time, value));
        }

        fn show_joystick(&mut self, info: &str) {
            self.drawn.lock().unwrap().push(Drawn::Joystick(info.to_string()));
        }

        fn show_message(&mut self, message: &str) {
            self.drawn.lock().unwrap().push(Drawn::Message(message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_marks_points_and_curve() {
        let mut wf = Waveform::new(30.0);
        wf.add_point(0.0, 0.0, 1);
        wf.add_point(30.0, 100.0, 2);
        let rows = TerminalView::plot(&wf);
        assert_eq!(rows.len(), PLOT_HEIGHT);
        assert!(rows[0].ends_with('o'));
        assert!(rows[PLOT_HEIGHT - 1].starts_with("  0 |o"));
        assert!(rows.iter().any(|r| r.contains('.')));
    }

    #[test]
    fn empty_plot_is_blank() {
        let wf = Waveform::new(30.0);
        let rows = TerminalView::plot(&wf);
        assert!(rows.iter().all(|r| !r.contains('o') && !r.contains('.')));
    }
}
