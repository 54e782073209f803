//! Actor traits
//!
//! TigerStyle: Single-threaded execution guarantee, explicit lifecycle hooks.
//!
//! An entity is a user type implementing [`Actor`] plus the private thread
//! the runtime wraps around it. Message reception is opt-in per type through
//! [`Handler`]; timer reception through [`Timed`]. All hooks run on the
//! entity's own thread — user state is never touched concurrently.

use std::time::Duration;

use crate::context::Context;
use crate::retry::Flow;
use crate::timer::TimerPayload;

/// An active object: a runnable that owns a private dispatcher thread.
///
/// All methods are invoked on the owning thread. A panic escaping any hook
/// or handler unwinds the dispatcher thread: the entity terminates without
/// running [`on_stop`](Actor::on_stop), and its handles behave like a dead
/// peer from then on.
pub trait Actor: Send + Sized + 'static {
    /// Called once on the owning thread before any message is delivered
    fn on_start(&mut self, _ctx: &mut Context<Self>) {}

    /// Called once on the owning thread after the dispatcher exits
    ///
    /// Parcels still queued at this point are discarded without being
    /// delivered.
    fn on_stop(&mut self, _ctx: &mut Context<Self>) {}

    /// Body of a foreign event loop, entered after
    /// [`Context::acquire_dispatcher`]
    ///
    /// The implementation must run the host loop and call
    /// [`Context::handle_actor_events`] whenever the registered
    /// [`LoopWaker`] signals events or a timer wakeup. Returning hands the
    /// dispatcher back to the internal loop.
    fn on_dispatching(&mut self, _ctx: &mut Context<Self>) {}
}

/// Reception of messages of type `M`
///
/// Implement once per message type the entity accepts; `send` is only
/// available for types the target handles, checked at compile time.
pub trait Handler<M: Send + 'static>: Actor {
    /// Handle one message
    ///
    /// The payload is borrowed mutably so it can be taken out wholesale
    /// (`std::mem::take`) when ownership is wanted. Returning
    /// `Err(DispatchRetry)` leaves the parcel queued and pauses the normal
    /// band until the retry interval elapses or a high-priority parcel
    /// arrives.
    fn on_message(&mut self, msg: &mut M, ctx: &mut Context<Self>) -> Flow;
}

/// Reception of default-channel timers keyed by payload type `M`
///
/// Used by [`Context::timer_start`]; timers started with an explicit
/// channel via [`Context::timer_start_with`] bypass this trait.
pub trait Timed<M: TimerPayload>: Actor {
    fn on_timer(&mut self, payload: &M, ctx: &mut Context<Self>);
}

/// Hooks a foreign event loop registers so the runtime can wake it.
///
/// Registered through [`Context::acquire_dispatcher`]. Every method has a
/// silently-dropping default; override the ones the host loop needs. All
/// methods must tolerate being called from threads other than the entity's
/// own (in particular [`on_stopping`](LoopWaker::on_stopping), which is
/// invoked from whichever thread requested the stop).
pub trait LoopWaker: Send + Sync + 'static {
    /// A parcel arrived while the foreign loop holds the dispatcher; the
    /// host should schedule a call to [`Context::handle_actor_events`]
    fn on_waiting_events(&self) {}

    /// The earliest timer deadline changed; the host should schedule a
    /// wakeup after `lapse` and then call
    /// [`Context::handle_actor_events`]
    fn on_waiting_timer(&self, _lapse: Duration) {}

    /// Cancels a previously requested wakeup; always paired with an earlier
    /// [`on_waiting_timer`](LoopWaker::on_waiting_timer) and must be
    /// idempotent
    fn on_waiting_timer_cancel(&self) {}

    /// A stop was requested; the foreign loop must unwind so `on_stop` can
    /// run on the owning thread
    fn on_stopping(&self) {}
}
