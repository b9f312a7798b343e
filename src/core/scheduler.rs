use instant::Instant;
use std::time::Duration;

/// Throttle for tile-plan recomputation with a trailing-edge guarantee.
///
/// The first call runs immediately and locks the scheduler for `interval`.
/// Calls arriving while locked are not dropped: they mark a trailing run,
/// which the host drives through [`UpdateScheduler::take_trailing`] (or
/// [`UpdateScheduler::flush`]) once the interval has elapsed. The trailing
/// run reads fresh state, so it always acts on the latest viewport.
#[derive(Debug, Clone)]
pub struct UpdateScheduler {
    interval: Duration,
    locked_until: Option<Instant>,
    trailing: bool,
}

impl UpdateScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            locked_until: None,
            trailing: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when the caller may run now; otherwise a trailing run is queued.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        match self.locked_until {
            Some(until) if now < until => {
                self.trailing = true;
                false
            }
            _ => {
                self.locked_until = Some(now + self.interval);
                self.trailing = false;
                true
            }
        }
    }

    /// True when a queued trailing run is due; running it re-locks the scheduler.
    pub fn take_trailing(&mut self, now: Instant) -> bool {
        match self.locked_until {
            Some(until) if now >= until => {
                if self.trailing {
                    self.trailing = false;
                    self.locked_until = Some(now + self.interval);
                    true
                } else {
                    self.locked_until = None;
                    false
                }
            }
            _ => false,
        }
    }

    /// Whether a call arrived while locked and has not run yet.
    pub fn has_trailing(&self) -> bool {
        self.trailing
    }

    /// When the queued trailing run becomes due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.trailing {
            self.locked_until
        } else {
            None
        }
    }

    /// Run `op` now if the interval allows; otherwise queue the trailing run.
    pub fn call<R>(&mut self, now: Instant, op: impl FnOnce() -> R) -> Option<R> {
        if self.try_acquire(now) {
            Some(op())
        } else {
            None
        }
    }

    /// Run `op` as the trailing call if one is due.
    pub fn flush<R>(&mut self, now: Instant, op: impl FnOnce() -> R) -> Option<R> {
        if self.take_trailing(now) {
            Some(op())
        } else {
            None
        }
    }

    /// Forget the lock and any queued trailing run.
    pub fn cancel(&mut self) {
        self.locked_until = None;
        self.trailing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_call_runs_immediately() {
        let mut scheduler = UpdateScheduler::new(ms(150));
        let t0 = Instant::now();

        assert_eq!(scheduler.call(t0, || 1), Some(1));
        assert!(!scheduler.has_trailing());
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_calls_while_locked_collapse_into_one_trailing_run() {
        let mut scheduler = UpdateScheduler::new(ms(150));
        let t0 = Instant::now();
        let mut runs = 0;

        scheduler.call(t0, || runs += 1);
        scheduler.call(t0 + ms(10), || runs += 1);
        scheduler.call(t0 + ms(90), || runs += 1);
        assert_eq!(runs, 1);
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(150)));

        // Not due yet.
        scheduler.flush(t0 + ms(149), || runs += 1);
        assert_eq!(runs, 1);

        scheduler.flush(t0 + ms(150), || runs += 1);
        assert_eq!(runs, 2);

        // Only one trailing run per burst.
        scheduler.flush(t0 + ms(400), || runs += 1);
        assert_eq!(runs, 2);
    }

    #[test]
    fn test_trailing_run_relocks() {
        let mut scheduler = UpdateScheduler::new(ms(100));
        let t0 = Instant::now();

        assert!(scheduler.try_acquire(t0));
        assert!(!scheduler.try_acquire(t0 + ms(50)));
        assert!(scheduler.take_trailing(t0 + ms(120)));

        // Locked again until 220ms.
        assert!(!scheduler.try_acquire(t0 + ms(150)));
        assert!(scheduler.take_trailing(t0 + ms(220)));
        assert!(scheduler.try_acquire(t0 + ms(330)));
    }

    #[test]
    fn test_unlocks_without_pending_calls() {
        let mut scheduler = UpdateScheduler::new(ms(100));
        let t0 = Instant::now();

        assert!(scheduler.try_acquire(t0));
        assert!(!scheduler.take_trailing(t0 + ms(100)));
        assert!(scheduler.try_acquire(t0 + ms(101)));
    }

    #[test]
    fn test_cancel_drops_trailing_run() {
        let mut scheduler = UpdateScheduler::new(ms(100));
        let t0 = Instant::now();

        scheduler.try_acquire(t0);
        scheduler.try_acquire(t0 + ms(1));
        scheduler.cancel();

        assert!(!scheduler.take_trailing(t0 + ms(200)));
        assert!(scheduler.try_acquire(t0 + ms(2)));
    }
}
