//! Shared core of an entity
//!
//! The only structures touched by more than one thread: the mailbox, the
//! lifecycle phase, and the external-loop registration, all behind a single
//! mutex with two condition variables (message arrival, idle observation).
//! Everything else an entity owns lives on its dispatcher thread.

use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::{Condvar, Mutex};

use crate::actor::{Actor, LoopWaker};
use crate::mailbox::{Band, Mailbox};
use crate::parcel::Parcel;

/// Lifecycle phase of an entity
///
/// Transitions are monotonic: Dispatching → Stopping → Stopped. Handles
/// cannot resurrect a stopped entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Dispatching,
    Stopping,
    Stopped,
}

pub(crate) struct CoreState<R: Actor> {
    pub mailbox: Mailbox<Box<dyn Parcel<R>>>,
    pub phase: Phase,
    pub exit_code: i32,
    /// Recorded by the dispatcher on entry; used to tell self-stop from
    /// foreign stop and to keep `wait_idle` off the owning thread
    pub owner: Option<ThreadId>,
    /// `acquire_dispatcher` was called; the internal loop hands over at the
    /// next quiescence
    pub external_requested: bool,
    /// Currently inside `on_dispatching`; parcel arrivals must wake the
    /// foreign loop
    pub external_engaged: bool,
    pub waker: Option<Arc<dyn LoopWaker>>,
}

pub(crate) struct Core<R: Actor> {
    pub state: Mutex<CoreState<R>>,
    /// Signalled on the empty→non-empty edge of a band, on stop, and on
    /// retry-pause release
    pub message_waiter: Condvar,
    /// Signalled whenever the dispatcher observes both bands empty
    pub idle_waiter: Condvar,
}

impl<R: Actor> Core<R> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(CoreState {
                mailbox: Mailbox::new(),
                phase: Phase::Dispatching,
                exit_code: 0,
                owner: None,
                external_requested: false,
                external_engaged: false,
                waker: None,
            }),
            message_waiter: Condvar::new(),
            idle_waiter: Condvar::new(),
        }
    }

    /// Deposit a parcel from any thread.
    ///
    /// Dropped without delivery once the entity has been asked to stop; no
    /// parcel crosses from a pending queue into a frozen one.
    pub(crate) fn post(&self, parcel: Box<dyn Parcel<R>>, band: Band) {
        let waker = {
            let mut state = self.state.lock();
            if state.phase != Phase::Dispatching {
                drop(state);
                drop(parcel); // parcel destructor may post again; no lock held
                return;
            }
            let was_empty = state.mailbox.enqueue(parcel, band);
            if was_empty {
                self.message_waiter.notify_one();
            }
            if state.external_engaged {
                state.waker.clone()
            } else {
                None
            }
        };
        if let Some(waker) = waker {
            waker.on_waiting_events();
        }
    }

    /// Signal a stop. Idempotent; only the first call records the exit
    /// code. Returns whether this call performed the transition.
    pub(crate) fn request_stop(&self, code: i32) -> bool {
        let waker = {
            let mut state = self.state.lock();
            if state.phase != Phase::Dispatching {
                return false;
            }
            state.phase = Phase::Stopping;
            state.exit_code = code;
            self.message_waiter.notify_one();
            if state.external_engaged {
                state.waker.clone()
            } else {
                None
            }
        };
        if let Some(waker) = waker {
            waker.on_stopping();
        }
        true
    }

    /// Clear the retry pause and wake the dispatcher (the retry timer's
    /// channel ends the back-off through here).
    pub(crate) fn resume_normal_band(&self) {
        let mut state = self.state.lock();
        state.mailbox.resume();
        self.message_waiter.notify_one();
    }

    pub(crate) fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    pub(crate) fn pending(&self) -> usize {
        self.state.lock().mailbox.len()
    }
}
