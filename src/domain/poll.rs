//! Fixed-interval polling with a hard deadline.

use crate::ports::clock_port::Clock;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollResult<T, E> {
    Ready(T),
    Failed(E),
    TimedOut { attempts: u32, waited: Duration },
}

impl PollPolicy {
    /// Upper bound on probe calls a single [`run`](Self::run) can make.
    pub fn max_attempts(&self) -> u32 {
        if self.interval.is_zero() {
            return 1;
        }
        let attempts = (self.timeout.as_nanos() / self.interval.as_nanos()).max(1);
        u32::try_from(attempts).unwrap_or(u32::MAX)
    }

    /// Sleeps `interval`, then calls `probe`, until it yields a value or an
    /// error, or until sleeping again would pass `timeout`.
    ///
    /// `probe` returns `Ok(None)` while the resource is not ready.
    pub fn run<T, E>(
        &self,
        clock: &dyn Clock,
        mut probe: impl FnMut(u32) -> Result<Option<T>, E>,
    ) -> PollResult<T, E> {
        let started = clock.now();
        let mut attempts = 0u32;

        loop {
            let waited = clock.now().duration_since(started);
            if waited + self.interval > self.timeout || attempts >= self.max_attempts() {
                return PollResult::TimedOut { attempts, waited };
            }

            clock.sleep(self.interval);
            attempts += 1;

            match probe(attempts) {
                Ok(Some(value)) => return PollResult::Ready(value),
                Ok(None) => continue,
                Err(e) => return PollResult::Failed(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock_port::ManualClock;

    #[test]
    fn default_policy_allows_sixty_probes() {
        assert_eq!(PollPolicy::default().max_attempts(), 60);
    }

    #[test]
    fn sub_millisecond_interval_is_counted() {
        let policy = PollPolicy {
            interval: Duration::from_micros(500),
            timeout: Duration::from_millis(2),
        };
        assert_eq!(policy.max_attempts(), 4);
        let zero = PollPolicy {
            interval: Duration::ZERO,
            timeout: Duration::from_secs(1),
        };
        assert_eq!(zero.max_attempts(), 1);
    }

    #[test]
    fn returns_when_ready() {
        let clock = ManualClock::new();
        let result: PollResult<&str, ()> =
            PollPolicy::default().run(&clock, |n| Ok((n == 3).then_some("link")));
        assert_eq!(result, PollResult::Ready("link"));
        assert_eq!(clock.elapsed(), Duration::from_secs(15));
    }

    #[test]
    fn times_out_at_ceiling() {
        let clock = ManualClock::new();
        let mut calls = 0;
        let result: PollResult<(), ()> = PollPolicy::default().run(&clock, |_| {
            calls += 1;
            Ok(None)
        });
        assert_eq!(
            result,
            PollResult::TimedOut {
                attempts: 60,
                waited: Duration::from_secs(300)
            }
        );
        assert_eq!(calls, 60);
        assert!(clock.elapsed() <= Duration::from_secs(300));
    }

    #[test]
    fn slow_probes_count_against_deadline() {
        let clock = ManualClock::new();
        let policy = PollPolicy {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
        };
        let result: PollResult<(), ()> = policy.run(&clock, |_| {
            clock.advance(Duration::from_secs(10));
            Ok(None)
        });
        match result {
            PollResult::TimedOut { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn probe_error_stops_polling() {
        let clock = ManualClock::new();
        let result: PollResult<(), &str> = PollPolicy::default().run(&clock, |_| Err("gone"));
        assert_eq!(result, PollResult::Failed("gone"));
    }
}
