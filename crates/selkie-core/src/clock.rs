//! Clock abstraction for deterministic tests
//!
//! TigerStyle: All time enters through an injected source.
//!
//! Deadline math throughout the runtime is a function of `Instant`s obtained
//! from a [`Clock`], never from `Instant::now()` buried in the logic. The
//! production implementation is [`MonotonicClock`]; tests drive
//! [`ManualClock`] by hand to observe timer behaviour without sleeping.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotonic time source
///
/// # Implementations
///
/// - [`MonotonicClock`]: production, reads the OS monotonic clock
/// - [`ManualClock`]: tests, advanced explicitly
pub trait Clock: Send + Sync + Debug {
    /// Current instant on this clock
    fn now(&self) -> Instant;
}

/// Production clock backed by the OS monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests
///
/// Starts at the construction instant and only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::new();
        let a = clock.now();
        assert_eq!(clock.now(), a);

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), a + Duration::from_millis(250));
    }
}
