//! Two-band mailbox
//!
//! TigerStyle: FIFO ordering per band, explicit pause semantics, no silent
//! drops while the entity is dispatching.
//!
//! The mailbox itself is a plain structure; the runtime locks it externally
//! (one mutex per entity shared with the dispatch flags). Generic over the
//! element so the band logic is testable without building parcels.

use std::collections::VecDeque;

/// Priority band of a parcel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Band {
    Normal,
    High,
}

/// Two FIFO queues plus the retry pause flag
///
/// The paused flag suppresses dequeue from the normal band only; the high
/// band keeps draining and clears the flag on enqueue.
#[derive(Debug)]
pub(crate) struct Mailbox<P> {
    normal: VecDeque<P>,
    high: VecDeque<P>,
    paused: bool,
    /// Total parcels accepted (for introspection; wraps)
    enqueued_count: u64,
    /// Total parcels delivered to user code (wraps)
    delivered_count: u64,
}

impl<P> Mailbox<P> {
    pub(crate) fn new() -> Self {
        Self {
            normal: VecDeque::new(),
            high: VecDeque::new(),
            paused: false,
            enqueued_count: 0,
            delivered_count: 0,
        }
    }

    /// Append to a band. Returns whether the band was empty before, which
    /// is the edge that warrants waking the dispatcher.
    pub(crate) fn enqueue(&mut self, parcel: P, band: Band) -> bool {
        let queue = match band {
            Band::Normal => &mut self.normal,
            Band::High => &mut self.high,
        };
        let was_empty = queue.is_empty();
        queue.push_back(parcel);
        self.enqueued_count = self.enqueued_count.wrapping_add(1);
        if band == Band::High {
            self.paused = false;
        }
        was_empty
    }

    /// Take the next deliverable parcel: high band first, normal band only
    /// when not paused.
    pub(crate) fn take_next(&mut self) -> Option<(P, Band)> {
        if let Some(parcel) = self.high.pop_front() {
            return Some((parcel, Band::High));
        }
        if self.paused {
            return None;
        }
        self.normal.pop_front().map(|parcel| (parcel, Band::Normal))
    }

    /// Put a parcel back at the front of its band for redelivery
    pub(crate) fn requeue_front(&mut self, parcel: P, band: Band) {
        match band {
            Band::Normal => self.normal.push_front(parcel),
            Band::High => self.high.push_front(parcel),
        }
    }

    /// Whether `take_next` would currently yield a parcel
    pub(crate) fn has_deliverable(&self) -> bool {
        !self.high.is_empty() || (!self.paused && !self.normal.is_empty())
    }

    pub(crate) fn len(&self) -> usize {
        self.normal.len() + self.high.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.normal.is_empty() && self.high.is_empty()
    }

    pub(crate) fn pause(&mut self) {
        self.paused = true;
    }

    #[cfg(test)]
    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn resume(&mut self) {
        self.paused = false;
    }

    pub(crate) fn record_delivered(&mut self) {
        self.delivered_count = self.delivered_count.wrapping_add(1);
    }

    pub(crate) fn enqueued_count(&self) -> u64 {
        self.enqueued_count
    }

    pub(crate) fn delivered_count(&self) -> u64 {
        self.delivered_count
    }

    /// Empty both bands, handing the parcels back so the caller can drop
    /// them without holding the entity lock.
    pub(crate) fn clear(&mut self) -> (VecDeque<P>, VecDeque<P>) {
        (
            std::mem::take(&mut self.normal),
            std::mem::take(&mut self.high),
        )
    }
}
