use std::time::{Duration, Instant};

/// Debounced growth policy for the time axis.
///
/// A drag whose raw time lands beyond `x_limit * threshold` arms a one-shot
/// deadline. Coming back inside the safe zone, or releasing the point,
/// disarms it. Once the deadline passes the caller extends the axis.
#[derive(Clone, Debug)]
pub struct DomainExtender {
    threshold: f64,
    delay: Duration,
    increment: f64,
    pending: Option<Instant>, // deadline of the armed extension
}

impl DomainExtender {
    pub fn new(threshold: f64, delay: Duration, increment: f64) -> Self {
        Self {
            threshold,
            delay,
            increment,
            pending: None,
        }
    }

    pub fn increment(&self) -> f64 {
        self.increment
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed the pre-clamp drag time. Arms or disarms the pending extension.
    pub fn observe_drag(&mut self, raw_time: f64, x_limit: f64, now: Instant) {
        if raw_time > x_limit * self.threshold {
            if self.pending.is_none() {
                log::debug!("Drag past {:.2}, extension armed", x_limit * self.threshold);
                self.pending = Some(now + self.delay);
            }
        } else {
            self.cancel();
        }
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            log::debug!("Pending extension cancelled");
        }
    }

    /// Returns true exactly once when the armed deadline has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extender() -> DomainExtender {
        DomainExtender::new(1.05, Duration::from_millis(500), 10.0)
    }

    #[test]
    fn arms_only_past_threshold() {
        let mut ext = extender();
        let t0 = Instant::now();
        ext.observe_drag(20.5, 20.0, t0);
        assert!(!ext.is_pending());
        ext.observe_drag(21.0, 20.0, t0);
        assert!(!ext.is_pending());
        ext.observe_drag(22.0, 20.0, t0);
        assert_eq!(ext.deadline(), Some(t0 + Duration::from_millis(500)));
    }

    #[test]
    fn fires_after_delay_once() {
        let mut ext = extender();
        let t0 = Instant::now();
        ext.observe_drag(22.0, 20.0, t0);
        assert!(!ext.poll(t0 + Duration::from_millis(499)));
        assert!(ext.poll(t0 + Duration::from_millis(500)));
        assert!(!ext.poll(t0 + Duration::from_millis(900)));
    }

    #[test]
    fn sustained_drag_does_not_rearm() {
        let mut ext = extender();
        let t0 = Instant::now();
        ext.observe_drag(22.0, 20.0, t0);
        ext.observe_drag(23.0, 20.0, t0 + Duration::from_millis(300));
        assert_eq!(ext.deadline(), Some(t0 + Duration::from_millis(500)));
    }

    #[test]
    fn reentering_safe_zone_cancels() {
        let mut ext = extender();
        let t0 = Instant::now();
        ext.observe_drag(22.0, 20.0, t0);
        ext.observe_drag(19.0, 20.0, t0 + Duration::from_millis(100));
        assert!(!ext.poll(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn cancel_disarms() {
        let mut ext = extender();
        let t0 = Instant::now();
        ext.observe_drag(22.0, 20.0, t0);
        ext.cancel();
        assert!(!ext.poll(t0 + Duration::from_secs(1)));
    }
}
