use std::time::{Duration, Instant};

/// Fixed-rate virtual clock used to preview the waveform.
///
/// Each tick advances the clock by one frame (`1 / fps` seconds), independent
/// of how late the tick actually runs.
#[derive(Clone, Debug)]
pub struct Playback {
    fps: u32,
    frame: Duration,
    state: Option<Running>,
}

#[derive(Clone, Debug)]
struct Running {
    ticks: u64,
    end_time: f64,       // x_limit captured at start
    next_due: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tick {
    Frame(f64),   // virtual time of this frame
    Finished,
}

impl Playback {
    pub fn new(fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            fps,
            frame: Duration::from_secs_f64(1.0 / fps as f64),
            state: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    pub fn current_time(&self) -> f64 {
        self.state
            .as_ref()
            .map_or(0.0, |s| s.ticks as f64 / self.fps as f64)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.state.as_ref().map(|s| s.next_due)
    }

    /// (Re)starts the clock at 0. A running playback is replaced.
    pub fn start(&mut self, end_time: f64, now: Instant) {
        self.state = Some(Running {
            ticks: 0,
            end_time,
            next_due: now + self.frame,
        });
    }

    pub fn stop(&mut self) {
        self.state = None;
    }

    /// Advances by one frame if one is due. `Finished` is returned once the
    /// virtual clock passes the end time; the playback is then stopped.
    pub fn poll(&mut self, now: Instant) -> Option<Tick> {
        let fps = self.fps as f64;
        let frame = self.frame;
        let state = self.state.as_mut()?;
        if now < state.next_due {
            return None;
        }
        state.ticks += 1;
        state.next_due += frame;
        let current_time = state.ticks as f64 / fps;
        if current_time > state.end_time {
            self.state = None;
            return Some(Tick::Finished);
        }
        Some(Tick::Frame(current_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_never_ticks() {
        let mut pb = Playback::new(30);
        assert_eq!(pb.poll(Instant::now() + Duration::from_secs(5)), None);
        assert!(!pb.is_running());
    }

    #[test]
    fn first_frame_waits_one_period() {
        let mut pb = Playback::new(30);
        let t0 = Instant::now();
        pb.start(20.0, t0);
        assert_eq!(pb.poll(t0), None);
        assert_eq!(pb.poll(t0 + Duration::from_millis(34)), Some(Tick::Frame(1.0 / 30.0)));
    }

    #[test]
    fn runs_thirty_frames_per_second_then_finishes() {
        let mut pb = Playback::new(30);
        let t0 = Instant::now();
        pb.start(20.0, t0);
        let late = t0 + Duration::from_secs(30);
        let mut frames = Vec::new();
        loop {
            match pb.poll(late) {
                Some(Tick::Frame(t)) => frames.push(t),
                Some(Tick::Finished) => break,
                None => panic!("playback stalled at {}", pb.current_time()),
            }
        }
        assert_eq!(frames.len(), 600);
        assert_eq!(*frames.last().unwrap(), 20.0);
        assert!(!pb.is_running());
        assert_eq!(pb.poll(late), None);
    }

    #[test]
    fn restart_resets_clock() {
        let mut pb = Playback::new(30);
        let t0 = Instant::now();
        pb.start(20.0, t0);
        pb.poll(t0 + Duration::from_millis(100));
        pb.poll(t0 + Duration::from_millis(100));
        assert!(pb.current_time() > 0.0);
        pb.start(20.0, t0 + Duration::from_millis(100));
        assert_eq!(pb.current_time(), 0.0);
    }

    #[test]
    fn stop_cancels() {
        let mut pb = Playback::new(30);
        let t0 = Instant::now();
        pb.start(20.0, t0);
        pb.stop();
        assert_eq!(pb.next_due(), None);
        assert_eq!(pb.poll(t0 + Duration::from_secs(1)), None);
    }
}
