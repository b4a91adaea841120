use std::time::{Duration, Instant};

/// Trailing-edge debouncer over an explicit clock.
///
/// Each [`schedule`](Debouncer::schedule) replaces the pending value and
/// pushes the deadline out to `now + delay`; [`poll`](Debouncer::poll) yields
/// the last value once the deadline has passed with no further schedule.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Cancels any pending value and schedules `value` for `now + delay`
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Takes the pending value if its deadline has been reached
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        debouncer.schedule(1, start);
        assert_eq!(debouncer.poll(start + Duration::from_millis(99)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(100)), Some(1));
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), None);
    }

    #[test]
    fn test_reschedule_keeps_only_last_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        for (i, ms) in [0_u64, 40, 80, 120].iter().enumerate() {
            debouncer.schedule(i, start + Duration::from_millis(*ms));
            assert_eq!(debouncer.poll(start + Duration::from_millis(*ms + 10)), None);
        }
        assert_eq!(debouncer.deadline(), Some(start + Duration::from_millis(220)));
        assert_eq!(debouncer.poll(start + Duration::from_millis(220)), Some(3));
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.schedule("a", start);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.cancel(), Some("a"));
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }
}
