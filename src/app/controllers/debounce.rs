use std::time::{Duration, Instant};

/// Trailing-edge debounce timer.
///
/// Each `schedule` restarts the quiet period; the owner polls with the current time
/// and runs its work once `poll` reports the period has elapsed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    wait: Duration,
    last_trigger: Option<Instant>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            last_trigger: None,
        }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.last_trigger = Some(now);
    }

    /// Drop the pending call. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.last_trigger.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.last_trigger.is_some()
    }

    /// When the pending call becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.last_trigger.map(|t| t + self.wait)
    }

    /// True exactly once per burst, when `now` is past the quiet period.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.last_trigger = None;
                true
            }
            _ => false,
        }
    }

    /// Make a pending call due immediately. Returns whether one was pending.
    pub fn flush(&mut self) -> bool {
        self.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(180);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_collapses_to_one_call() {
        let start = Instant::now();
        let mut d = Debouncer::new(WAIT);
        let mut fired = 0;
        for i in 0..10 {
            let now = start + ms(i * 50);
            d.schedule(now);
            if d.poll(now) {
                fired += 1;
            }
        }
        // last trigger at 450ms
        assert!(!d.poll(start + ms(629)));
        assert!(d.poll(start + ms(630)));
        fired += 1;
        assert!(!d.poll(start + ms(2000)));
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_cancel_suppresses_pending_call() {
        let start = Instant::now();
        let mut d = Debouncer::new(WAIT);
        d.schedule(start);
        assert!(d.cancel());
        assert!(!d.poll(start + ms(500)));
        assert!(!d.cancel());
    }

    #[test]
    fn test_flush_reports_pending() {
        let start = Instant::now();
        let mut d = Debouncer::new(WAIT);
        assert!(!d.flush());
        d.schedule(start);
        assert_eq!(d.deadline(), Some(start + WAIT));
        assert!(d.flush());
        assert!(!d.is_pending());
    }
}
