//! Error types for selkie
//!
//! TigerStyle: Explicit error types with context, using thiserror.
//!
//! The taxonomy is deliberately small: a send to a stopped entity and a
//! publish to a dead peer are silent drops by contract, not errors.

use std::thread::ThreadId;

use thiserror::Error;

/// Result type alias for selkie operations
pub type Result<T> = std::result::Result<T, Error>;

/// Selkie error types
#[derive(Error, Debug)]
pub enum Error {
    /// A timer operation was attempted outside the entity's owning thread.
    ///
    /// The timer table belongs to the dispatcher thread; any other caller
    /// is rejected rather than risking a torn schedule.
    #[error("timer operation outside the owning thread: owner {owner:?}, caller {caller:?}")]
    WrongThread { owner: ThreadId, caller: ThreadId },

    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl Error {
    /// Create a wrong-thread error
    pub fn wrong_thread(owner: ThreadId, caller: ThreadId) -> Self {
        debug_assert_ne!(owner, caller, "wrong-thread error with matching ids");
        Self::WrongThread { owner, caller }
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::internal("boom");
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_wrong_thread_names_both_threads() {
        let caller = std::thread::current().id();
        let owner = std::thread::spawn(|| std::thread::current().id())
            .join()
            .unwrap();

        let err = Error::wrong_thread(owner, caller);
        let text = err.to_string();
        assert!(text.contains("owning thread"), "text was: {}", text);
        assert!(text.contains(&format!("{:?}", owner)));
        assert!(text.contains(&format!("{:?}", caller)));
    }
}
