//! Typed forwarding channels
//!
//! A [`Channel`] is a first-class callable that forwards a value of one
//! message type to some target, typically another entity held through a weak
//! handle. Channels built from handles are the sole mechanism by which
//! callbacks to deleted peers stay safe: resolving a dead handle turns the
//! call into a no-op instead of a fault.

use std::fmt;
use std::sync::Arc;

/// A typed callable `(&M) -> ()` that can be stored, cloned, and invoked
/// from any thread.
///
/// Channels may be empty; invoking an empty channel does nothing. Empty
/// channels are how a subscriber slot is unbound.
pub struct Channel<M> {
    inner: Option<Arc<dyn Fn(&M) + Send + Sync>>,
}

impl<M> Channel<M> {
    /// Wrap a closure
    pub fn new(f: impl Fn(&M) + Send + Sync + 'static) -> Self {
        Self {
            inner: Some(Arc::new(f)),
        }
    }

    /// An empty channel: calling it is a no-op
    pub fn empty() -> Self {
        Self { inner: None }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Forward a value to the target, if any
    pub fn call(&self, value: &M) {
        if let Some(f) = &self.inner {
            f(value);
        }
    }
}

impl<M> Clone for Channel<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M> Default for Channel<M> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<M> fmt::Debug for Channel<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("bound", &self.inner.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_channel_calls_closure() {
        let hits = Arc::new(AtomicU32::new(0));
        let hits2 = hits.clone();
        let ch = Channel::new(move |v: &u32| {
            hits2.fetch_add(*v, Ordering::SeqCst);
        });

        ch.call(&3);
        ch.call(&4);
        assert_eq!(hits.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_empty_channel_is_a_noop() {
        let ch: Channel<String> = Channel::empty();
        assert!(ch.is_empty());
        ch.call(&"ignored".to_string());
    }

    #[test]
    fn test_clone_shares_target() {
        let hits = Arc::new(AtomicU32::new(0));
        let hits2 = hits.clone();
        let ch = Channel::new(move |_: &()| {
            hits2.fetch_add(1, Ordering::SeqCst);
        });
        let ch2 = ch.clone();

        ch.call(&());
        ch2.call(&());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
