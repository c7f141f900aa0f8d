use std::sync::Arc;

use crate::request::{ControllerRequest, Transport};
use crate::view::View;

/// Events from a gesture tracker: stick displacement in `[-1, 1]` per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JoystickEvent {
    Move { x: f64, y: f64, angle_degree: Option<f64> },
    End,
}

/// Relays stick movement to the controller and keeps the readout current.
pub struct JoystickAdapter {
    transport: Arc<dyn Transport>,
}

/// Degrees counter-clockwise from +x, in [0, 360).
pub fn vector_angle(x: f64, y: f64) -> f64 {
    let deg = y.atan2(x).to_degrees();
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

impl JoystickAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn handle(&self, event: JoystickEvent, view: &mut dyn View) {
        match event {
            JoystickEvent::Move { x, y, angle_degree } => {
                let distance = (x * x + y * y).sqrt();
                let angle = angle_degree.unwrap_or_else(|| vector_angle(x, y));
                view.show_joystick(&format!(
                    "X: {:.2}, Y: {:.2}, Distance: {:.2}, Angle: {:.2}°",
                    x, y, distance, angle
                ));
                self.transport.send(ControllerRequest::Joystick { x, y });
            }
            JoystickEvent::End => {
                view.show_joystick("Joystick released");
            }
        }
    }
}
