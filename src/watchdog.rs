use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::request::{ControllerRequest, Transport};

/// Liveness heartbeat. Every period the counter grows by the period and is
/// sent to the controller, which falls back to a safe state when it stops.
pub struct Heartbeat {
    period: Duration,
    timestamp_ms: u64,
    next_due: Instant,
    transport: Arc<dyn Transport>,
}

impl Heartbeat {
    pub fn new(period: Duration, now: Instant, transport: Arc<dyn Transport>) -> Self {
        Self {
            period,
            timestamp_ms: 0,
            next_due: now + period,
            transport,
        }
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Sends one beat per elapsed period.
    pub fn poll(&mut self, now: Instant) {
        while now >= self.next_due {
            self.timestamp_ms += self.period.as_millis() as u64;
            self.next_due += self.period;
            self.transport.send(ControllerRequest::Watchdog {
                timestamp_ms: self.timestamp_ms,
            });
        }
    }
}
