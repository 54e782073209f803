//! Per-entity callback directory
//!
//! For each message type there is at most one stored channel per entity.
//! The directory is owned by the entity's context and only ever touched on
//! the owning thread; installs from other threads arrive as high-priority
//! parcels.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::channel::Channel;

#[derive(Default)]
pub(crate) struct Directory {
    slots: HashMap<TypeId, Box<dyn Any>>,
}

impl Directory {
    pub(crate) fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Replace the slot for `M`. An empty channel unbinds it.
    pub(crate) fn install<M: 'static>(&mut self, channel: Channel<M>) {
        if channel.is_empty() {
            self.slots.remove(&TypeId::of::<M>());
        } else {
            self.slots.insert(TypeId::of::<M>(), Box::new(channel));
        }
    }

    pub(crate) fn get<M: 'static>(&self) -> Option<&Channel<M>> {
        self.slots.get(&TypeId::of::<M>()).map(|boxed| {
            match boxed.downcast_ref::<Channel<M>>() {
                Some(channel) => channel,
                None => unreachable!("directory slot keyed by TypeId holds its own type"),
            }
        })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_one_slot_per_type() {
        let mut dir = Directory::new();
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));

        let f = first.clone();
        dir.install(Channel::new(move |_: &u32| {
            f.fetch_add(1, Ordering::SeqCst);
        }));
        let s = second.clone();
        dir.install(Channel::new(move |_: &u32| {
            s.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(dir.len(), 1);
        dir.get::<u32>().unwrap().call(&7);
        assert_eq!(first.load(Ordering::SeqCst), 0, "replaced slot never fires");
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_types_never_collide() {
        let mut dir = Directory::new();
        dir.install(Channel::new(|_: &u32| {}));
        dir.install(Channel::new(|_: &String| {}));

        assert_eq!(dir.len(), 2);
        assert!(dir.get::<u32>().is_some());
        assert!(dir.get::<String>().is_some());
        assert!(dir.get::<i64>().is_none());
    }

    #[test]
    fn test_empty_channel_unbinds() {
        let mut dir = Directory::new();
        dir.install(Channel::new(|_: &u32| {}));
        assert!(dir.get::<u32>().is_some());

        dir.install(Channel::<u32>::empty());
        assert!(dir.get::<u32>().is_none());
        assert_eq!(dir.len(), 0);
    }
}
