//! Retry signalling for message handlers
//!
//! A handler that cannot process its current message yet returns
//! [`DispatchRetry`] through its [`Flow`] result. The dispatcher pauses the
//! normal band, schedules a one-shot timer for the requested interval, and
//! redelivers the same parcel when the timer fires (or immediately when a
//! high-priority parcel arrives).

use std::hash::{Hash, Hasher};
use std::time::Duration;

use selkie_core::constants::RETRY_INTERVAL_MS_DEFAULT;

/// Outcome of a message handler: deliver the next parcel, or back off and
/// redeliver this one.
pub type Flow = Result<(), DispatchRetry>;

/// Request to redeliver the current parcel after a back-off interval.
///
/// The token doubles as the payload key of the back-off timer. All retry
/// tokens compare equal and hash identically, so at most one retry timer
/// exists per entity: a newer request simply reprograms it.
#[derive(Debug, Clone)]
pub struct DispatchRetry {
    /// How long to pause the normal band before redelivery. An incoming
    /// high-priority parcel cuts the pause short.
    pub interval: Duration,
}

impl DispatchRetry {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for DispatchRetry {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(RETRY_INTERVAL_MS_DEFAULT),
        }
    }
}

impl PartialEq for DispatchRetry {
    fn eq(&self, _other: &Self) -> bool {
        true // singleton payload key: every token names the same timer
    }
}

impl Eq for DispatchRetry {}

impl Hash for DispatchRetry {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_retry_default_interval() {
        let retry = DispatchRetry::default();
        assert_eq!(
            retry.interval,
            Duration::from_millis(RETRY_INTERVAL_MS_DEFAULT)
        );
    }

    #[test]
    fn test_retry_tokens_are_a_singleton_key() {
        let a = DispatchRetry::new(Duration::from_millis(5));
        let b = DispatchRetry::new(Duration::from_secs(60));
        assert_eq!(a, b);

        let mut map = HashMap::new();
        map.insert(a, 1u32);
        map.insert(b, 2u32);
        assert_eq!(map.len(), 1, "distinct intervals still share one slot");
    }
}
