//! Per-entity timer table
//!
//! Timers are keyed by payload value: starting a timer whose payload equals
//! an existing timer of the same type reprograms that timer instead of
//! creating a second one. Payloads of different types never collide.
//!
//! Two orderings coexist: a payload-equality index per type (lookup by
//! value) and a deadline-ordered set with a monotonic sequence breaking
//! ties (earliest-fire extraction without a multiset). The table belongs to
//! the owning thread; all methods take `now` explicitly so tests drive time
//! by hand.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use crate::actor::{Actor, Timed};
use crate::channel::Channel;
use crate::context::Context;

/// Whether a timer rearms itself after firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCycle {
    OneShot,
    Periodic,
}

/// Bounds a timer payload must satisfy: value equality for the payload
/// index, cloning for key storage.
pub trait TimerPayload: Eq + Hash + Clone + 'static {}

impl<T: Eq + Hash + Clone + 'static> TimerPayload for T {}

/// What a firing invokes: an explicit channel, or the entity's own
/// [`Timed`] hook.
pub(crate) enum TimerKind<R: Actor, M> {
    Channel(Channel<M>),
    Hook(fn(&mut R, &M, &mut Context<R>)),
}

impl<R: Actor, M> Clone for TimerKind<R, M> {
    fn clone(&self) -> Self {
        match self {
            Self::Channel(ch) => Self::Channel(ch.clone()),
            Self::Hook(hook) => Self::Hook(*hook),
        }
    }
}

/// Adapter placed in [`TimerKind::Hook`] by `Context::timer_start`
pub(crate) fn timed_hook<R: Timed<M>, M: TimerPayload>(
    actor: &mut R,
    payload: &M,
    ctx: &mut Context<R>,
) {
    actor.on_timer(payload, ctx);
}

#[derive(Debug)]
struct TimerState {
    lapse: Duration,
    cycle: TimerCycle,
    deadline: Instant,
    /// Current position key in the deadline set (identity tiebreak)
    seq: u64,
    /// Set while a firing is in flight; cleared by `timer_stop` ("touch")
    /// or any reschedule to inhibit the post-fire advance
    fired: bool,
}

pub(crate) struct TimerEntry<R: Actor, M: TimerPayload> {
    payload: M,
    state: RefCell<TimerState>,
    kind: RefCell<TimerKind<R, M>>,
}

/// Type-erased view of an entry the dispatcher can fire
pub(crate) trait DueTimer<R: Actor> {
    fn fire(self: Rc<Self>, actor: &mut R, ctx: &mut Context<R>);
}

impl<R: Actor, M: TimerPayload> DueTimer<R> for TimerEntry<R, M> {
    fn fire(self: Rc<Self>, actor: &mut R, ctx: &mut Context<R>) {
        self.state.borrow_mut().fired = true;
        // Clone the kind first: the handler may reprogram this very timer,
        // which replaces `kind` while we are using it.
        let kind = self.kind.borrow().clone();
        match kind {
            TimerKind::Channel(ch) => ch.call(&self.payload),
            TimerKind::Hook(hook) => hook(actor, &self.payload, ctx),
        }
        let (fired, cycle) = {
            let state = self.state.borrow();
            (state.fired, state.cycle)
        };
        // A touched or rescheduled timer has already been repositioned by
        // the handler; leave it alone.
        if fired {
            match cycle {
                TimerCycle::OneShot => ctx.timers.stop(&self.payload),
                TimerCycle::Periodic => {
                    let now = ctx.clock.now();
                    ctx.timers.advance_after_fire(&self, now);
                }
            }
        }
    }
}

pub(crate) struct TimerTable<R: Actor> {
    by_deadline: BTreeMap<(Instant, u64), Rc<dyn DueTimer<R>>>,
    by_payload: HashMap<TypeId, Box<dyn Any>>,
    seq: u64,
}

impl<R: Actor> TimerTable<R> {
    pub(crate) fn new() -> Self {
        Self {
            by_deadline: BTreeMap::new(),
            by_payload: HashMap::new(),
            seq: 0,
        }
    }

    /// Start a timer, or reprogram the one already keyed by an equal
    /// payload: rebind its channel, reset lapse and cycle, and move its
    /// deadline to `now + lapse`.
    pub(crate) fn start<M: TimerPayload>(
        &mut self,
        payload: M,
        lapse: Duration,
        kind: TimerKind<R, M>,
        cycle: TimerCycle,
        now: Instant,
    ) {
        // A zero-lapse periodic timer would be due forever.
        debug_assert!(
            cycle == TimerCycle::OneShot || lapse > Duration::ZERO,
            "periodic timer with zero lapse"
        );
        let seq = self.next_seq();
        let existing = self
            .payload_map::<M>()
            .get(&payload)
            .and_then(|weak| weak.upgrade());

        match existing {
            Some(entry) => {
                *entry.kind.borrow_mut() = kind;
                let (old_key, new_key) = {
                    let mut state = entry.state.borrow_mut();
                    let old_key = (state.deadline, state.seq);
                    state.lapse = lapse;
                    state.cycle = cycle;
                    state.deadline = now + lapse;
                    state.seq = seq;
                    state.fired = false;
                    (old_key, (state.deadline, state.seq))
                };
                self.by_deadline.remove(&old_key);
                self.by_deadline.insert(new_key, entry);
            }
            None => {
                let entry = Rc::new(TimerEntry {
                    payload: payload.clone(),
                    state: RefCell::new(TimerState {
                        lapse,
                        cycle,
                        deadline: now + lapse,
                        seq,
                        fired: false,
                    }),
                    kind: RefCell::new(kind),
                });
                self.payload_map::<M>()
                    .insert(payload, Rc::downgrade(&entry));
                self.by_deadline.insert((now + lapse, seq), entry);
            }
        }
    }

    /// Move an existing timer's deadline to `now + lapse`; no-op if absent
    pub(crate) fn reset<M: TimerPayload>(&mut self, payload: &M, now: Instant) {
        let existing = self
            .payload_map::<M>()
            .get(payload)
            .and_then(|weak| weak.upgrade());
        if let Some(entry) = existing {
            let seq = self.next_seq();
            let (old_key, new_key) = {
                let mut state = entry.state.borrow_mut();
                let old_key = (state.deadline, state.seq);
                state.deadline = now + state.lapse;
                state.seq = seq;
                state.fired = false;
                (old_key, (state.deadline, state.seq))
            };
            self.by_deadline.remove(&old_key);
            self.by_deadline.insert(new_key, entry);
        }
    }

    /// Remove a timer from both indices; no-op if absent.
    ///
    /// When the removed timer is the one currently being fired, its `fired`
    /// flag is cleared so the dispatcher will not reschedule it after the
    /// handler returns.
    pub(crate) fn stop<M: TimerPayload>(&mut self, payload: &M) {
        let existing = self
            .payload_map::<M>()
            .remove(payload)
            .and_then(|weak| weak.upgrade());
        if let Some(entry) = existing {
            {
                let state = entry.state.borrow();
                self.by_deadline.remove(&(state.deadline, state.seq));
            }
            // A strong count above ours means the dispatcher holds a firing
            // reference right now: touch it.
            if Rc::strong_count(&entry) > 1 {
                entry.state.borrow_mut().fired = false;
            }
        }
    }

    /// Advance a periodic timer after an untouched firing: one lapse from
    /// the previous deadline to preserve phase, or `now + lapse` when the
    /// schedule fell behind by more than one period.
    pub(crate) fn advance_after_fire<M: TimerPayload>(
        &mut self,
        entry: &Rc<TimerEntry<R, M>>,
        now: Instant,
    ) {
        let seq = self.next_seq();
        let (old_key, new_key) = {
            let mut state = entry.state.borrow_mut();
            let old_key = (state.deadline, state.seq);
            let lapse = state.lapse;
            state.deadline += lapse;
            if state.deadline < now {
                state.deadline = now + state.lapse; // recover from lost events
            }
            state.seq = seq;
            state.fired = false;
            (old_key, (state.deadline, state.seq))
        };
        self.by_deadline.remove(&old_key);
        self.by_deadline.insert(new_key, entry.clone());
    }

    /// The earliest pending deadline, if any
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.by_deadline.keys().next().map(|(deadline, _)| *deadline)
    }

    /// The earliest timer if its deadline has passed. The entry stays in
    /// the table; firing repositions or removes it.
    pub(crate) fn take_due(&self, now: Instant) -> Option<Rc<dyn DueTimer<R>>> {
        let (key, entry) = self.by_deadline.iter().next()?;
        if key.0 <= now {
            Some(entry.clone())
        } else {
            None
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.by_deadline.len()
    }

    fn next_seq(&mut self) -> u64 {
        self.seq = self.seq.wrapping_add(1);
        self.seq
    }

    fn payload_map<M: TimerPayload>(&mut self) -> &mut HashMap<M, Weak<TimerEntry<R, M>>> {
        let boxed = self
            .by_payload
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Box::new(HashMap::<M, Weak<TimerEntry<R, M>>>::new()));
        match boxed.downcast_mut() {
            Some(map) => map,
            None => unreachable!("timer index keyed by TypeId holds its own type"),
        }
    }
}
