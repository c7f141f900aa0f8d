use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::config::PanelConfig;
use crate::joystick::{JoystickAdapter, JoystickEvent};
use crate::request::Transport;
use crate::scheduler::SchedulerWidget;
use crate::view::View;
use crate::watchdog::Heartbeat;
use crate::waveform::PointId;

/// Input-adapter boundary: everything a front end can ask the panel to do.
#[derive(Clone, Debug, PartialEq)]
pub enum PanelCommand {
    AddPoint { time: f64, value: f64 },
    Grab(PointId),
    DragTo { time: f64, value: f64 },
    MovePoint { id: PointId, time: f64, value: f64 },
    Release,
    Clear,
    SendSchedule,
    SendStop,
    Play,
    Halt,
    Extend,
    Value(f64),
    ShowPoints,
    ShowLimit,
    Joystick(JoystickEvent),
    Quit,
}

/// Owns all widget state and runs it on one thread: commands and timers are
/// handled strictly one after another.
pub struct Panel {
    scheduler: SchedulerWidget,
    joystick: JoystickAdapter,
    heartbeat: Option<Heartbeat>,
    view: Box<dyn View>,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Panel {
    pub fn new(
        config: &PanelConfig,
        transport: Arc<dyn Transport>,
        view: Box<dyn View>,
        watchdog: bool,
        now: Instant,
    ) -> Self {
        let heartbeat = watchdog.then(|| {
            Heartbeat::new(
                Duration::from_millis(config.watchdog_interval_ms),
                now,
                transport.clone(),
            )
        });
        Self {
            scheduler: SchedulerWidget::new(config, transport.clone()),
            joystick: JoystickAdapter::new(transport),
            heartbeat,
            view,
        }
    }

    pub fn scheduler(&self) -> &SchedulerWidget {
        &self.scheduler
    }

    /// Applies one command. Returns true when the panel should shut down.
    pub fn handle(&mut self, command: PanelCommand, now: Instant) -> bool {
        let view = &mut *self.view;
        match command {
            PanelCommand::AddPoint { time, value } => {
                self.scheduler.add_point(time, value, now_ms(), view);
            }
            PanelCommand::Grab(id) => {
                self.scheduler.grab(id);
            }
            PanelCommand::DragTo { time, value } => {
                self.scheduler.drag_to(time, value, now, view);
            }
            PanelCommand::MovePoint { id, time, value } => {
                if self.scheduler.grab(id) {
                    self.scheduler.drag_to(time, value, now, view);
                }
            }
            PanelCommand::Release => self.scheduler.release(),
            PanelCommand::Clear => self.scheduler.clear_all(view),
            PanelCommand::SendSchedule => self.scheduler.send_schedule(now, view),
            PanelCommand::SendStop => self.scheduler.send_stop(view),
            PanelCommand::Play => self.scheduler.start_playback(now, view),
            PanelCommand::Halt => self.scheduler.stop_playback(view),
            PanelCommand::Extend => self.scheduler.extend_domain(view),
            PanelCommand::Value(time) => {
                let value = self.scheduler.interpolate(time);
                view.show_message(&format!("value at {:.2}: {:.2}", time, value));
            }
            PanelCommand::ShowPoints => {
                view.redraw(self.scheduler.waveform());
            }
            PanelCommand::ShowLimit => {
                view.show_message(&format!("time axis: 0..{}", self.scheduler.waveform().x_limit()));
            }
            PanelCommand::Joystick(event) => self.joystick.handle(event, view),
            PanelCommand::Quit => return true,
        }
        false
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let heartbeat = self.heartbeat.as_ref().map(|hb| hb.next_due());
        match (self.scheduler.next_deadline(), heartbeat) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fires every timer due at `now`.
    pub fn poll(&mut self, now: Instant) {
        self.scheduler.poll(now, &mut *self.view);
        if let Some(hb) = self.heartbeat.as_mut() {
            hb.poll(now);
        }
    }

    /// Event loop. Returns when `Quit` arrives or every sender is dropped.
    pub fn run(mut self, commands: Receiver<PanelCommand>) {
        loop {
            let received = match self.next_deadline() {
                Some(deadline) => commands.recv_deadline(deadline),
                None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(command) => {
                    log::debug!("Command: {:?}", command);
                    if self.handle(command, Instant::now()) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.poll(Instant::now());
        }
        self.scheduler.stop_playback(&mut *self.view);
        log::info!("Panel stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::testing::RecordingTransport;
    use crate::request::ControllerRequest;
    use crate::view::testing::{Drawn, RecordingView};

    fn panel(watchdog: bool, now: Instant) -> (Panel, RecordingTransport, RecordingView) {
        let transport = RecordingTransport::default();
        let view = RecordingView::default();
        let config = PanelConfig {
            initial_x_limit: 20.0,
            ..PanelConfig::default()
        };
        let panel = Panel::new(
            &config,
            Arc::new(transport.clone()),
            Box::new(view.clone()),
            watchdog,
            now,
        );
        (panel, transport, view)
    }

    #[test]
    fn idle_panel_without_watchdog_has_no_deadline() {
        let (p, _, _) = panel(false, Instant::now());
        assert_eq!(p.next_deadline(), None);
    }

    #[test]
    fn heartbeat_runs_alongside_commands() {
        let t0 = Instant::now();
        let (mut p, transport, _) = panel(true, t0);
        assert_eq!(p.next_deadline(), Some(t0 + Duration::from_millis(100)));
        p.handle(PanelCommand::Joystick(JoystickEvent::Move { x: 0.1, y: 0.2, angle_degree: None }), t0);
        p.poll(t0 + Duration::from_millis(200));
        assert_eq!(
            transport.take(),
            vec![
                ControllerRequest::Joystick { x: 0.1, y: 0.2 },
                ControllerRequest::Watchdog { timestamp_ms: 100 },
                ControllerRequest::Watchdog { timestamp_ms: 200 },
            ]
        );
    }

    #[test]
    fn move_command_grabs_and_drags() {
        let t0 = Instant::now();
        let (mut p, _, _) = panel(false, t0);
        p.handle(PanelCommand::AddPoint { time: 5.0, value: 5.0 }, t0);
        let id = p.scheduler().waveform().points()[0].id;
        p.handle(PanelCommand::MovePoint { id, time: 25.0, value: 40.0 }, t0);
        assert_eq!(p.scheduler().dragging(), Some(id));
        let deadline = p.next_deadline().unwrap();
        p.poll(deadline);
        assert_eq!(p.scheduler().waveform().x_limit(), 30.0);
        p.handle(PanelCommand::Release, deadline);
        assert_eq!(p.scheduler().dragging(), None);
    }

    #[test]
    fn value_reports_interpolation() {
        let t0 = Instant::now();
        let (mut p, _, view) = panel(false, t0);
        p.handle(PanelCommand::AddPoint { time: 0.0, value: 0.0 }, t0);
        p.handle(PanelCommand::AddPoint { time: 10.0, value: 50.0 }, t0);
        view.take();
        p.handle(PanelCommand::Value(5.0), t0);
        assert_eq!(view.take(), vec![Drawn::Message("value at 5.00: 25.00".to_string())]);
    }

    #[test]
    fn quit_stops_run_loop() {
        let (p, _, _) = panel(true, Instant::now());
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(PanelCommand::Quit).unwrap();
        p.run(rx);
    }

    #[test]
    fn dropped_sender_stops_run_loop() {
        let (p, _, _) = panel(false, Instant::now());
        let (tx, rx) = crossbeam_channel::unbounded::<PanelCommand>();
        drop(tx);
        p.run(rx);
    }
}
