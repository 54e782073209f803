//! Execution context of an entity
//!
//! A [`Context`] is handed to every hook and handler and only ever exists
//! on the entity's own thread. It is the gateway to everything the entity
//! may do from inside: publish, install callbacks, drive its timer table,
//! reach its own handles, cooperate with a stop, and interleave with a
//! foreign event loop.

use std::sync::{Arc, Weak as ArcWeak};
use std::thread::{self, ThreadId};
use std::time::Duration;

use selkie_core::{Clock, Error, Result};

use crate::actor::{Actor, Handler, LoopWaker, Timed};
use crate::channel::Channel;
use crate::core::{Core, Phase};
use crate::directory::Directory;
use crate::dispatcher;
use crate::handle::{ActorHandle, Owner, WeakHandle};
use crate::mailbox::Band;
use crate::parcel::InstallParcel;
use crate::timer::{timed_hook, TimerCycle, TimerKind, TimerPayload, TimerTable};

pub struct Context<R: Actor> {
    pub(crate) core: Arc<Core<R>>,
    pub(crate) owner: ArcWeak<Owner<R>>,
    pub(crate) directory: Directory,
    pub(crate) timers: TimerTable<R>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) thread_id: ThreadId,
    pub(crate) burst_limit: usize,
    pub(crate) foreign_timer_armed: bool,
}

impl<R: Actor> Context<R> {
    pub(crate) fn new(
        core: Arc<Core<R>>,
        owner: ArcWeak<Owner<R>>,
        clock: Arc<dyn Clock>,
        thread_id: ThreadId,
        burst_limit: usize,
    ) -> Self {
        debug_assert!(burst_limit >= 1, "burst limit must allow progress");
        Self {
            core,
            owner,
            directory: Directory::new(),
            timers: TimerTable::new(),
            clock,
            thread_id,
            burst_limit,
            foreign_timer_armed: false,
        }
    }

    // =========================================================================
    // Identity and handles
    // =========================================================================

    /// The owning thread's id
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// An owning handle to this entity, while any other owning handle is
    /// still alive
    pub fn handle(&self) -> Option<ActorHandle<R>> {
        self.owner.upgrade().map(ActorHandle::from_owner)
    }

    /// A weak handle to this entity; valid from construction throughout
    /// life, including entities adopted by `run`
    pub fn weak_handle(&self) -> WeakHandle<R> {
        WeakHandle::from_owner(self.owner.clone())
    }

    /// A channel that forwards values of `M` to this entity; no-op once the
    /// entity is gone
    pub fn channel<M>(&self) -> Channel<M>
    where
        R: Handler<M>,
        M: Clone + Send + 'static,
    {
        self.weak_handle().channel()
    }

    /// High-priority variant of [`channel`](Context::channel)
    pub fn channel_high_priority<M>(&self) -> Channel<M>
    where
        R: Handler<M>,
        M: Clone + Send + 'static,
    {
        self.weak_handle().channel_high_priority()
    }

    // =========================================================================
    // Publish / subscribe
    // =========================================================================

    /// Forward `value` to the subscriber channel stored for its type, if
    /// any. Fire-and-forget: no subscriber, dead subscriber, and live
    /// subscriber all return normally.
    pub fn publish<M: 'static>(&self, value: &M) {
        if let Some(channel) = self.directory.get::<M>() {
            channel.call(value);
        }
    }

    /// The stored subscriber channel for `M`, for introspection
    pub fn callback<M: 'static>(&self) -> Option<Channel<M>> {
        self.directory.get::<M>().cloned()
    }

    /// Install a subscriber channel for `M` on this entity.
    ///
    /// Queued as a high-priority parcel, exactly like an installation
    /// arriving from another thread.
    pub fn connect<M: 'static>(&self, channel: Channel<M>) {
        self.core
            .post(Box::new(InstallParcel::new(channel)), Band::High);
    }

    /// Unbind the subscriber channel for `M`
    pub fn disconnect<M: 'static>(&self) {
        self.connect(Channel::<M>::empty());
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Start (or reprogram) a timer delivered to [`Timed::on_timer`]
    pub fn timer_start<M>(&mut self, payload: M, lapse: Duration, cycle: TimerCycle) -> Result<()>
    where
        R: Timed<M>,
        M: TimerPayload,
    {
        self.ensure_owning_thread()?;
        let now = self.clock.now();
        self.timers
            .start(payload, lapse, TimerKind::Hook(timed_hook), cycle, now);
        Ok(())
    }

    /// Start (or reprogram) a timer delivered to an explicit channel
    pub fn timer_start_with<M>(
        &mut self,
        payload: M,
        lapse: Duration,
        channel: Channel<M>,
        cycle: TimerCycle,
    ) -> Result<()>
    where
        M: TimerPayload,
    {
        self.ensure_owning_thread()?;
        let now = self.clock.now();
        self.timers
            .start(payload, lapse, TimerKind::Channel(channel), cycle, now);
        Ok(())
    }

    /// Move an existing timer's deadline to now + lapse; no-op if absent
    pub fn timer_reset<M: TimerPayload>(&mut self, payload: &M) -> Result<()> {
        self.ensure_owning_thread()?;
        let now = self.clock.now();
        self.timers.reset(payload, now);
        Ok(())
    }

    /// Cancel a timer; no-op if absent. Cancelling the timer currently
    /// being fired inhibits its reschedule.
    pub fn timer_stop<M: TimerPayload>(&mut self, payload: &M) -> Result<()> {
        self.ensure_owning_thread()?;
        self.timers.stop(payload);
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Request a stop of this entity; the dispatcher exits after the
    /// current parcel and `on_stop` runs once
    pub fn stop(&self, code: i32) {
        self.core.request_stop(code);
    }

    /// Cooperative stop polling for long-running handlers
    pub fn exiting(&self) -> bool {
        self.core.phase() != Phase::Dispatching
    }

    /// Backlog across both mailbox bands
    pub fn pending_messages(&self) -> usize {
        self.core.pending()
    }

    // =========================================================================
    // External dispatcher interleave
    // =========================================================================

    /// Ask the internal loop to hand control to
    /// [`Actor::on_dispatching`] at the next quiescence, waking the foreign
    /// loop through `waker` from then on
    pub fn acquire_dispatcher(&self, waker: Arc<dyn LoopWaker>) {
        let mut state = self.core.state.lock();
        state.external_requested = true;
        state.waker = Some(waker);
    }

    /// Let `on_dispatching` return to the internal loop; also implied by
    /// returning from `on_dispatching`
    pub fn release_dispatcher(&self) {
        let mut state = self.core.state.lock();
        state.external_requested = false;
    }

    /// Drain one burst of parcels and due timers on behalf of a foreign
    /// loop. Returns whether a timer deadline is still pending.
    ///
    /// Only meaningful from within [`Actor::on_dispatching`]; the actor
    /// passes itself since the foreign loop runs inside its own `&mut self`.
    pub fn handle_actor_events(&mut self, actor: &mut R) -> bool {
        dispatcher::handle_events(actor, self)
    }

    fn ensure_owning_thread(&self) -> Result<()> {
        let caller = thread::current().id();
        if caller != self.thread_id {
            return Err(Error::wrong_thread(self.thread_id, caller));
        }
        Ok(())
    }
}
