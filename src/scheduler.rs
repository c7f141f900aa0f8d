use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::PanelConfig;
use crate::domain::DomainExtender;
use crate::playback::{Playback, Tick};
use crate::request::{ControllerRequest, Transport};
use crate::view::View;
use crate::waveform::{ControlPoint, PointId, Waveform};

/// The waveform scheduler widget: control points, axis growth, drag state and
/// local playback, wired to the controller transport.
pub struct SchedulerWidget {
    waveform: Waveform,
    extender: DomainExtender,
    playback: Playback,
    transport: Arc<dyn Transport>,
    dragging: Option<PointId>,
}

impl SchedulerWidget {
    pub fn new(config: &PanelConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            waveform: Waveform::new(config.initial_x_limit),
            extender: DomainExtender::new(
                config.extension_threshold,
                Duration::from_millis(config.extension_delay_ms),
                config.extension_increment,
            ),
            playback: Playback::new(config.playback_fps),
            transport,
            dragging: None,
        }
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_running()
    }

    pub fn dragging(&self) -> Option<PointId> {
        self.dragging
    }

    /// Tap on empty canvas. Ignored while a point is being dragged.
    pub fn add_point(&mut self, time: f64, value: f64, created_ms: u64, view: &mut dyn View) -> Option<ControlPoint> {
        if let Some(id) = self.dragging {
            log::warn!("Point #{} is still grabbed, release it before adding", id);
            view.show_message(&format!("point #{} is grabbed; release it first", id));
            return None;
        }
        let point = self.waveform.add_point(time, value, created_ms);
        log::debug!("Added point #{} at ({:.2}, {:.2})", point.id, point.x, point.y);
        view.redraw(&self.waveform);
        Some(point)
    }

    pub fn grab(&mut self, id: PointId) -> bool {
        if self.waveform.get(id).is_none() {
            log::warn!("No control point #{}", id);
            return false;
        }
        if self.dragging != Some(id) {
            self.extender.cancel();
        }
        self.dragging = Some(id);
        true
    }

    /// Drags the grabbed point. Does nothing without a grab.
    pub fn drag_to(&mut self, time: f64, value: f64, now: Instant, view: &mut dyn View) {
        if let Some(id) = self.dragging {
            self.move_point(id, time, value, now, view);
        }
    }

    pub fn release(&mut self) {
        self.dragging = None;
        self.extender.cancel();
    }

    pub fn move_point(&mut self, id: PointId, time: f64, value: f64, now: Instant, view: &mut dyn View) -> Option<ControlPoint> {
        let x_limit = self.waveform.x_limit();
        let moved = match self.waveform.move_point(id, time, value) {
            Some(point) => point,
            None => {
                log::warn!("No control point #{}", id);
                return None;
            }
        };
        self.extender.observe_drag(time, x_limit, now);
        view.show_coordinates(moved.x, moved.y);
        view.redraw(&self.waveform);
        Some(moved)
    }

    pub fn extend_domain(&mut self, view: &mut dyn View) {
        let x_limit = self.waveform.extend(self.extender.increment());
        log::info!("Time axis extended to {}", x_limit);
        view.redraw(&self.waveform);
    }

    pub fn clear_all(&mut self, view: &mut dyn View) {
        self.waveform.clear();
        self.dragging = None;
        self.extender.cancel();
        log::debug!("Control points cleared");
        view.redraw(&self.waveform);
    }

    pub fn interpolate(&self, time: f64) -> f64 {
        self.waveform.interpolate(time)
    }

    pub fn start_playback(&mut self, now: Instant, view: &mut dyn View) {
        if self.playback.is_running() {
            view.hide_marker();
        }
        self.playback.start(self.waveform.x_limit(), now);
    }

    pub fn stop_playback(&mut self, view: &mut dyn View) {
        self.playback.stop();
        view.hide_marker();
    }

    pub fn send_schedule(&mut self, now: Instant, view: &mut dyn View) {
        log::info!("Sending schedule with {} points", self.waveform.len());
        log::debug!("Schedule: {}", self.waveform.to_json());
        self.transport
            .send(ControllerRequest::Schedule(self.waveform.points().to_vec()));
        self.start_playback(now, view);
    }

    pub fn send_stop(&mut self, view: &mut dyn View) {
        log::info!("Sending stop");
        self.transport.send(ControllerRequest::Stop);
        self.stop_playback(view);
    }

    /// Earliest instant at which `poll` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.extender.deadline(), self.playback.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Runs every timer that is due at `now`.
    pub fn poll(&mut self, now: Instant, view: &mut dyn View) {
        if self.extender.poll(now) {
            self.extend_domain(view);
        }
        while let Some(tick) = self.playback.poll(now) {
            match tick {
                Tick::Frame(time) => {
                    let value = self.waveform.interpolate(time);
                    view.show_marker(time, value);
                }
                Tick::Finished => {
                    view.hide_marker();
                    break;
                }
            }
        }
    }
}
