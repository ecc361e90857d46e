//! Minimum-interval gate for passive refresh triggers such as a UI focus
//! event. Explicit fetches never consult it.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

/// Admits at most one passive refresh per interval.
pub struct RefreshThrottle {
    clock: Arc<dyn Clock>,
    interval: TimeDelta,
    last_admitted: Mutex<Option<DateTime<Utc>>>,
}

impl RefreshThrottle {
    /// Throttle reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            clock,
            interval: TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX),
            last_admitted: Mutex::new(None),
        }
    }

    /// Record and allow a refresh if the interval has elapsed since the last
    /// admitted one.
    pub fn admit(&self) -> bool {
        let now = self.clock.utc();
        let mut last = self
            .last_admitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let due = last.is_none_or(|previous| now - previous >= self.interval);
        if due {
            *last = Some(now);
        }
        due
    }

    /// Forget the last admitted refresh.
    pub fn reset(&self) {
        *self
            .last_admitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl std::fmt::Debug for RefreshThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshThrottle")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MutableClock;

    #[test]
    fn admits_once_per_interval() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let throttle = RefreshThrottle::new(clock.clone(), Duration::from_secs(30));

        assert!(throttle.admit());
        assert!(!throttle.admit());

        clock.advance_seconds(29);
        assert!(!throttle.admit());

        clock.advance_seconds(1);
        assert!(throttle.admit());
    }

    #[test]
    fn reset_readmits_immediately() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let throttle = RefreshThrottle::new(clock, Duration::from_secs(30));

        assert!(throttle.admit());
        throttle.reset();
        assert!(throttle.admit());
    }
}
