//! The per-entity event loop
//!
//! Runs on the entity's own thread (spawned, or adopted by `run`). One
//! parcel is delivered per iteration with the entity lock released; due
//! timers take precedence over sleeping; the loop parks on the message
//! condvar until the earliest deadline or a mailbox notification. An
//! engaged foreign loop is handed control at quiescence and fed through
//! bounded bursts.

use std::any::type_name;
use std::sync::{Arc, Weak};
use std::thread;

use tracing::{debug, warn};

use crate::actor::Actor;
use crate::channel::Channel;
use crate::context::Context;
use crate::core::{Core, Phase};
use crate::handle::Owner;
use crate::mailbox::Band;
use crate::options::RuntimeOptions;
use crate::parcel::Parcel;
use crate::retry::DispatchRetry;
use crate::timer::{TimerCycle, TimerKind};

pub(crate) fn run_dispatcher<R: Actor>(
    mut actor: R,
    core: Arc<Core<R>>,
    owner: Weak<Owner<R>>,
    options: RuntimeOptions,
) -> i32 {
    let thread_id = thread::current().id();
    {
        let mut state = core.state.lock();
        debug_assert!(state.owner.is_none(), "dispatcher entered twice");
        state.owner = Some(thread_id);
    }

    let mut ctx = Context::new(
        core.clone(),
        owner,
        options.clock.clone(),
        thread_id,
        options.burst_limit,
    );

    debug!(entity = type_name::<R>(), "dispatcher started");
    actor.on_start(&mut ctx);

    'dispatch: loop {
        // At most one delivery per iteration; timers get a look in between.
        let next = {
            let mut state = core.state.lock();
            if state.phase == Phase::Dispatching {
                state.mailbox.take_next()
            } else {
                None
            }
        };
        if let Some((parcel, band)) = next {
            deliver_parcel(&mut actor, &mut ctx, parcel, band);
        }

        // Timely handling of due timers has precedence over sleeping.
        let mut enter_foreign = false;
        loop {
            let now = ctx.clock.now();
            if let Some(due) = ctx.timers.take_due(now) {
                due.fire(&mut actor, &mut ctx);
                continue;
            }

            let wakeup = ctx.timers.next_deadline();
            let mut state = core.state.lock();
            if state.phase != Phase::Dispatching {
                break;
            }
            if state.mailbox.has_deliverable() {
                break;
            }
            // Quiescent: nothing due, nothing deliverable. Hand over to a
            // waiting foreign loop instead of sleeping.
            if state.external_requested {
                enter_foreign = true;
                break;
            }
            if state.mailbox.is_empty() {
                core.idle_waiter.notify_all();
            }
            match wakeup {
                Some(deadline) => {
                    core.message_waiter.wait_until(&mut state, deadline);
                }
                None => core.message_waiter.wait(&mut state),
            }
        }

        if core.phase() != Phase::Dispatching {
            break 'dispatch;
        }
        if enter_foreign {
            enter_foreign_loop(&mut actor, &mut ctx);
        }
    }

    actor.on_stop(&mut ctx);

    let (normal, high, exit_code, enqueued, delivered) = {
        let mut state = core.state.lock();
        state.phase = Phase::Stopped;
        let (normal, high) = state.mailbox.clear();
        core.idle_waiter.notify_all();
        (
            normal,
            high,
            state.exit_code,
            state.mailbox.enqueued_count(),
            state.mailbox.delivered_count(),
        )
    };
    // Pending parcels are discarded without invoking user code; their
    // payload destructors run here, after the lock is released, so one may
    // post back to this very entity without self-locking.
    drop(normal);
    drop(high);

    debug!(
        entity = type_name::<R>(),
        exit_code, enqueued, delivered, "dispatcher stopped"
    );
    exit_code
}

/// Deliver one parcel with the entity lock released. On a retry signal the
/// parcel goes back to the front of its band, the normal band pauses, and a
/// one-shot timer keyed by the retry token ends the pause.
fn deliver_parcel<R: Actor>(
    actor: &mut R,
    ctx: &mut Context<R>,
    mut parcel: Box<dyn Parcel<R>>,
    band: Band,
) {
    match parcel.deliver(actor, ctx) {
        Ok(()) => {
            ctx.core.state.lock().mailbox.record_delivered();
            // Parcel dropped here, outside the lock: its payload destructor
            // may send to this same entity.
            drop(parcel);
        }
        Err(retry) => {
            if retry.interval.is_zero() {
                warn!(entity = type_name::<R>(), "retry with zero interval");
            }
            let interval = retry.interval;
            let resume_core = ctx.core.clone();
            let resume = Channel::new(move |_: &DispatchRetry| resume_core.resume_normal_band());
            let now = ctx.clock.now();
            ctx.timers.start(
                retry,
                interval,
                TimerKind::Channel(resume),
                TimerCycle::OneShot,
                now,
            );
            let mut state = ctx.core.state.lock();
            state.mailbox.pause();
            state.mailbox.requeue_front(parcel, band);
        }
    }
}

/// Hand the thread to the actor's foreign loop until it returns.
fn enter_foreign_loop<R: Actor>(actor: &mut R, ctx: &mut Context<R>) {
    let (waker, backlog) = {
        let mut state = ctx.core.state.lock();
        // A stop landing after the main loop's phase check but before we
        // engage would never reach the waker's on_stopping: the host loop
        // would block with no unwind signal. Re-check under the same lock
        // that flips the engaged flag and let the main loop fall through
        // to on_stop instead.
        if state.phase != Phase::Dispatching {
            return;
        }
        state.external_engaged = true;
        (state.waker.clone(), state.mailbox.has_deliverable())
    };
    debug!(entity = type_name::<R>(), "external dispatcher engaged");

    // A parcel that slipped in between quiescence and engagement would
    // otherwise never wake the host.
    if backlog {
        if let Some(waker) = waker.as_ref() {
            waker.on_waiting_events();
        }
    }

    // Arm the host wakeup for the earliest pending deadline before handing
    // over.
    if let (Some(deadline), Some(waker)) = (ctx.timers.next_deadline(), waker.as_ref()) {
        waker.on_waiting_timer(deadline.saturating_duration_since(ctx.clock.now()));
        ctx.foreign_timer_armed = true;
    }

    actor.on_dispatching(ctx);

    {
        let mut state = ctx.core.state.lock();
        state.external_engaged = false;
        state.external_requested = false;
    }
    if ctx.foreign_timer_armed {
        if let Some(waker) = waker.as_ref() {
            waker.on_waiting_timer_cancel();
        }
        ctx.foreign_timer_armed = false;
    }
    debug!(entity = type_name::<R>(), "external dispatcher released");
}

/// One burst on behalf of a foreign loop: up to `burst_limit` parcels, then
/// every due timer. Returns whether a timer deadline is still pending.
pub(crate) fn handle_events<R: Actor>(actor: &mut R, ctx: &mut Context<R>) -> bool {
    let burst_limit = ctx.burst_limit;
    let mut delivered = 0;
    while delivered < burst_limit {
        let next = {
            let mut state = ctx.core.state.lock();
            if state.phase == Phase::Dispatching {
                state.mailbox.take_next()
            } else {
                None
            }
        };
        match next {
            Some((parcel, band)) => {
                deliver_parcel(actor, ctx, parcel, band);
                delivered += 1;
            }
            None => break,
        }
    }

    loop {
        let now = ctx.clock.now();
        match ctx.timers.take_due(now) {
            Some(due) => due.fire(actor, ctx),
            None => break,
        }
    }

    let waker = ctx.core.state.lock().waker.clone();

    // The burst ran out with parcels still queued: ask the host to resume
    // us rather than starve its own loop.
    let backlog = ctx.core.state.lock().mailbox.has_deliverable();
    if backlog {
        if let Some(waker) = waker.as_ref() {
            waker.on_waiting_events();
        }
    }

    // (Re)arm or cancel the host timer wakeup to match the table.
    let pending = ctx.timers.next_deadline();
    if let Some(waker) = waker.as_ref() {
        match pending {
            Some(deadline) => {
                waker.on_waiting_timer(deadline.saturating_duration_since(ctx.clock.now()));
                ctx.foreign_timer_armed = true;
            }
            None => {
                if ctx.foreign_timer_armed {
                    waker.on_waiting_timer_cancel();
                    ctx.foreign_timer_armed = false;
                }
            }
        }
    }
    pending.is_some()
}
