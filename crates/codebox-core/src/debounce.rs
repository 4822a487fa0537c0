//! Restartable quiet-interval timer used for "delayed" notifications.
//!
//! The engine owns no threads: the host calls [`Debouncer::poll`] from its own timer or
//! event loop, and a burst of triggers collapses into one firing after the interval.

use std::time::{Duration, Instant};

/// Pending flag plus a deadline that every trigger pushes back.
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Create an idle debouncer.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Quiet interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the quiet interval; a pending deadline is kept as is.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Mark an event at `now`, restarting the interval.
    pub fn trigger_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// Mark an event now.
    pub fn trigger(&mut self) {
        self.trigger_at(Instant::now());
    }

    /// Returns `true` if an event is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Drop the pending event.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns `true` (once) if the interval elapsed since the last trigger.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_fires_once_after_quiet_interval() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));

        d.trigger_at(t0);
        d.trigger_at(t0 + Duration::from_millis(60));
        assert!(!d.poll(t0 + Duration::from_millis(120)));
        assert!(d.poll(t0 + Duration::from_millis(160)));
        assert!(!d.poll(t0 + Duration::from_millis(500)));
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(10));
        d.trigger_at(t0);
        d.cancel();
        assert!(!d.is_pending());
        assert!(!d.poll(t0 + Duration::from_secs(1)));
    }
}
