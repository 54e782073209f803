//! TigerStyle constants for selkie
//!
//! All limits are explicit, use big-endian naming (most significant first),
//! and include units in the name.

// =============================================================================
// Dispatch Limits
// =============================================================================

/// Maximum consecutive parcel deliveries before the dispatcher yields to an
/// engaged external event loop
pub const DISPATCH_BURST_COUNT_MAX: usize = 64;

// =============================================================================
// Retry Limits
// =============================================================================

/// Default interval before a parcel rejected with a retry signal is
/// redelivered, in milliseconds (1 sec)
pub const RETRY_INTERVAL_MS_DEFAULT: u64 = 1000;

// =============================================================================
// Idle Wait Limits
// =============================================================================

/// Default deadline for `wait_idle` in milliseconds (1 sec)
pub const IDLE_WAIT_MS_DEFAULT: u64 = 1000;

// Compile-time assertions for constant validity
const _: () = {
    assert!(DISPATCH_BURST_COUNT_MAX >= 1);
    assert!(RETRY_INTERVAL_MS_DEFAULT >= 1);
    assert!(IDLE_WAIT_MS_DEFAULT >= 1);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_have_units_in_names() {
        // This test documents the naming convention:
        // time limits end in _MS_, count limits end in _COUNT_.
        let _: usize = DISPATCH_BURST_COUNT_MAX;
        let _: u64 = RETRY_INTERVAL_MS_DEFAULT;
        let _: u64 = IDLE_WAIT_MS_DEFAULT;
    }
}
