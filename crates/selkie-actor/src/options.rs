//! Runtime options for an entity
//!
//! TigerStyle: Defaults come from explicit named constants.

use std::sync::Arc;

use selkie_core::{Clock, MonotonicClock, DISPATCH_BURST_COUNT_MAX};

/// Per-entity tuning knobs, consumed by `spawn_with` / `run_with`
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Consecutive parcel deliveries before yielding to an engaged
    /// external loop
    pub burst_limit: usize,
    /// Name for the dispatcher thread; defaults to the entity's type name
    pub thread_name: Option<String>,
    /// Time source for timer deadlines
    pub clock: Arc<dyn Clock>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            burst_limit: DISPATCH_BURST_COUNT_MAX,
            thread_name: None,
            clock: Arc::new(MonotonicClock::new()),
        }
    }
}

impl RuntimeOptions {
    pub fn with_burst_limit(mut self, burst_limit: usize) -> Self {
        debug_assert!(burst_limit >= 1, "burst limit must allow progress");
        self.burst_limit = burst_limit;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_come_from_constants() {
        let options = RuntimeOptions::default();
        assert_eq!(options.burst_limit, DISPATCH_BURST_COUNT_MAX);
        assert!(options.thread_name.is_none());
    }

    #[test]
    fn test_builder() {
        let options = RuntimeOptions::default()
            .with_burst_limit(8)
            .with_thread_name("worker");
        assert_eq!(options.burst_limit, 8);
        assert_eq!(options.thread_name.as_deref(), Some("worker"));
    }
}
