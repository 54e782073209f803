//! Entity handles and factories
//!
//! TigerStyle: Explicit ownership, safe destruction from any thread.
//!
//! Owning handles are reference counted; the last one to drop routes
//! destruction through the same stop contract external callers use. Weak
//! handles and the [`Gateway`] wrapper never keep an entity alive and turn
//! into silent no-ops once it is gone.

use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::error;

use selkie_core::IDLE_WAIT_MS_DEFAULT;

use crate::actor::{Actor, Handler};
use crate::channel::Channel;
use crate::core::{Core, Phase};
use crate::dispatcher::run_dispatcher;
use crate::mailbox::Band;
use crate::options::RuntimeOptions;
use crate::parcel::{InstallParcel, MessageParcel};

// =============================================================================
// Factories
// =============================================================================

/// Spawn an entity on a fresh thread and return the owning handle
///
/// Panics only if the OS refuses to create a thread.
pub fn spawn<R: Actor>(actor: R) -> ActorHandle<R> {
    spawn_with(actor, RuntimeOptions::default())
}

/// [`spawn`] with explicit [`RuntimeOptions`]
pub fn spawn_with<R: Actor>(actor: R, options: RuntimeOptions) -> ActorHandle<R> {
    let core = Arc::new(Core::new());
    let owner = Arc::new(Owner {
        core: core.clone(),
        join: Mutex::new(None),
    });
    let weak = Arc::downgrade(&owner);

    let name = options
        .thread_name
        .clone()
        .unwrap_or_else(short_type_name::<R>);
    let join = thread::Builder::new()
        .name(name)
        .spawn(move || {
            run_dispatcher(actor, core, weak, options);
        })
        .expect("failed to spawn dispatcher thread");
    *owner.join.lock() = Some(join);

    ActorHandle { owner }
}

/// Run an entity on the calling thread (e.g. the `main` thread), blocking
/// until it stops. Returns the exit code recorded by `stop(code)`.
pub fn run<R: Actor>(actor: R) -> i32 {
    run_with(actor, RuntimeOptions::default())
}

/// [`run`] with explicit [`RuntimeOptions`]
pub fn run_with<R: Actor>(actor: R, options: RuntimeOptions) -> i32 {
    let core = Arc::new(Core::new());
    let owner = Arc::new(Owner {
        core: core.clone(),
        join: Mutex::new(None),
    });
    let weak = Arc::downgrade(&owner);
    // Weak handles built during the run stay resolvable until `owner`
    // drops below, after the dispatcher has returned.
    run_dispatcher(actor, core, weak, options)
}

fn short_type_name<R>() -> String {
    let full = std::any::type_name::<R>();
    full.rsplit("::").next().unwrap_or(full).to_string()
}

// =============================================================================
// Owner record (recycler)
// =============================================================================

/// Unique record behind all owning handles of one entity
pub(crate) struct Owner<R: Actor> {
    pub(crate) core: Arc<Core<R>>,
    pub(crate) join: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Actor> Drop for Owner<R> {
    fn drop(&mut self) {
        self.core.request_stop(0);
        let join = self.join.lock().take();
        if let Some(join) = join {
            if join.thread().id() == thread::current().id() {
                // Self-initiated destruction: a thread cannot join itself.
                // Detach; the dispatcher finishes the handler in flight,
                // runs on_stop, and the thread reclaims the runnable.
                drop(join);
            } else if join.join().is_err() {
                error!(
                    entity = std::any::type_name::<R>(),
                    "dispatcher thread panicked"
                );
            }
        }
    }
}

// =============================================================================
// ActorHandle
// =============================================================================

/// Shared-ownership handle to a running entity
///
/// Cloning shares ownership; the entity stops when the last owning handle
/// drops. All operations are safe from any thread.
pub struct ActorHandle<R: Actor> {
    owner: Arc<Owner<R>>,
}

impl<R: Actor> Clone for ActorHandle<R> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
        }
    }
}

impl<R: Actor> ActorHandle<R> {
    pub(crate) fn from_owner(owner: Arc<Owner<R>>) -> Self {
        Self { owner }
    }

    /// Deposit a message on the normal band; dropped silently once the
    /// entity has been asked to stop
    pub fn send<M>(&self, msg: M)
    where
        R: Handler<M>,
        M: Send + 'static,
    {
        self.owner
            .core
            .post(Box::new(MessageParcel::new(msg)), Band::Normal);
    }

    /// Deposit a message on the high band: delivered before anything on
    /// the normal band, and ends a retry pause immediately
    pub fn send_high_priority<M>(&self, msg: M)
    where
        R: Handler<M>,
        M: Send + 'static,
    {
        self.owner
            .core
            .post(Box::new(MessageParcel::new(msg)), Band::High);
    }

    /// Backlog across both bands
    pub fn pending_messages(&self) -> usize {
        self.owner.core.pending()
    }

    /// Block until both bands are observed empty or `max_wait` elapses;
    /// returns whether idleness was observed.
    ///
    /// Never blocks the entity's own thread: called from there, it returns
    /// the current emptiness immediately.
    pub fn wait_idle(&self, max_wait: Duration) -> bool {
        let core = &self.owner.core;
        let deadline = Instant::now() + max_wait;
        let mut state = core.state.lock();
        if state.owner == Some(thread::current().id()) {
            return state.mailbox.is_empty();
        }
        loop {
            if state.mailbox.is_empty() {
                return true;
            }
            if core
                .idle_waiter
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.mailbox.is_empty();
            }
        }
    }

    /// [`wait_idle`](ActorHandle::wait_idle) with the default deadline
    pub fn wait_idle_default(&self) -> bool {
        self.wait_idle(Duration::from_millis(IDLE_WAIT_MS_DEFAULT))
    }

    /// Signal a stop and return immediately; joining is internal to the
    /// last handle drop. Idempotent and terminal: only the first call
    /// records `code`, and a stopped entity never dispatches again.
    pub fn stop(&self, code: i32) {
        self.owner.core.request_stop(code);
    }

    /// Whether the entity is still dispatching (neither stopping nor
    /// stopped)
    pub fn is_alive(&self) -> bool {
        self.owner.core.phase() == Phase::Dispatching
    }

    /// A non-owning handle
    pub fn downgrade(&self) -> WeakHandle<R> {
        WeakHandle {
            owner: Arc::downgrade(&self.owner),
        }
    }

    /// Whether two handles refer to the same entity
    pub fn same_entity(&self, other: &ActorHandle<R>) -> bool {
        Arc::ptr_eq(&self.owner, &other.owner)
    }

    /// A channel forwarding values of `M` to this entity; no-op once the
    /// entity is gone
    pub fn channel<M>(&self) -> Channel<M>
    where
        R: Handler<M>,
        M: Clone + Send + 'static,
    {
        self.downgrade().channel()
    }

    /// High-priority variant of [`channel`](ActorHandle::channel)
    pub fn channel_high_priority<M>(&self) -> Channel<M>
    where
        R: Handler<M>,
        M: Clone + Send + 'static,
    {
        self.downgrade().channel_high_priority()
    }

    /// Install `channel` as this entity's subscriber slot for `M`.
    ///
    /// Rides the high band, so a `publish` initiated after this call
    /// returns cannot miss the installation.
    pub fn connect<M: 'static>(&self, channel: Channel<M>) {
        self.owner
            .core
            .post(Box::new(InstallParcel::new(channel)), Band::High);
    }

    /// Subscribe another entity to values of `M` published by this one
    pub fn connect_to<M, S>(&self, subscriber: &ActorHandle<S>)
    where
        S: Handler<M>,
        M: Clone + Send + 'static,
    {
        self.connect(subscriber.channel::<M>());
    }

    /// [`connect_to`](ActorHandle::connect_to) through a weak handle
    pub fn connect_to_weak<M, S>(&self, subscriber: &WeakHandle<S>)
    where
        S: Handler<M>,
        M: Clone + Send + 'static,
    {
        self.connect(subscriber.channel::<M>());
    }

    /// Unbind the subscriber slot for `M`
    pub fn disconnect<M: 'static>(&self) {
        self.connect(Channel::<M>::empty());
    }
}

// =============================================================================
// WeakHandle
// =============================================================================

/// Non-owning handle: never keeps the entity alive
pub struct WeakHandle<R: Actor> {
    owner: Weak<Owner<R>>,
}

impl<R: Actor> Clone for WeakHandle<R> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
        }
    }
}

impl<R: Actor> Default for WeakHandle<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Actor> WeakHandle<R> {
    /// A handle bound to nothing; upgrading always fails
    pub fn new() -> Self {
        Self { owner: Weak::new() }
    }

    pub(crate) fn from_owner(owner: Weak<Owner<R>>) -> Self {
        Self { owner }
    }

    /// Reclaim an owning handle while other owners are still alive
    pub fn upgrade(&self) -> Option<ActorHandle<R>> {
        self.owner.upgrade().map(ActorHandle::from_owner)
    }

    /// A channel forwarding values of `M`; resolves this handle on every
    /// call and silently drops the value once the entity is gone
    pub fn channel<M>(&self) -> Channel<M>
    where
        R: Handler<M>,
        M: Clone + Send + 'static,
    {
        let weak = self.clone();
        Channel::new(move |value: &M| {
            if let Some(handle) = weak.upgrade() {
                handle.send(value.clone());
            }
        })
    }

    /// High-priority variant of [`channel`](WeakHandle::channel)
    pub fn channel_high_priority<M>(&self) -> Channel<M>
    where
        R: Handler<M>,
        M: Clone + Send + 'static,
    {
        let weak = self.clone();
        Channel::new(move |value: &M| {
            if let Some(handle) = weak.upgrade() {
                handle.send_high_priority(value.clone());
            }
        })
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Weak-holding wrapper offering a null-safe, fire-and-forget send
///
/// For callers that cannot vouch for the target's lifecycle: every
/// operation resolves the weak handle first and silently does nothing if
/// the entity is gone.
pub struct Gateway<R: Actor> {
    actor: WeakHandle<R>,
}

impl<R: Actor> Clone for Gateway<R> {
    fn clone(&self) -> Self {
        Self {
            actor: self.actor.clone(),
        }
    }
}

impl<R: Actor> Default for Gateway<R> {
    fn default() -> Self {
        Self::unbound()
    }
}

impl<R: Actor> Gateway<R> {
    pub fn new(actor: WeakHandle<R>) -> Self {
        Self { actor }
    }

    /// A gateway bound to nothing
    pub fn unbound() -> Self {
        Self {
            actor: WeakHandle::new(),
        }
    }

    /// Rebind to another entity
    pub fn set(&mut self, actor: WeakHandle<R>) {
        self.actor = actor;
    }

    /// The target, if still alive
    pub fn get(&self) -> Option<ActorHandle<R>> {
        self.actor.upgrade()
    }

    /// Resolve-then-send; no-op when the entity is gone
    pub fn send<M>(&self, msg: M)
    where
        R: Handler<M>,
        M: Send + 'static,
    {
        if let Some(handle) = self.actor.upgrade() {
            handle.send(msg);
        }
    }

    /// High-priority variant of [`send`](Gateway::send)
    pub fn send_high_priority<M>(&self, msg: M)
    where
        R: Handler<M>,
        M: Send + 'static,
    {
        if let Some(handle) = self.actor.upgrade() {
            handle.send_high_priority(msg);
        }
    }

    /// Function-call style alias for [`send`](Gateway::send)
    pub fn call<M>(&self, msg: M)
    where
        R: Handler<M>,
        M: Send + 'static,
    {
        self.send(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::retry::Flow;
    use std::sync::mpsc;

    struct Echo {
        out: mpsc::Sender<u32>,
    }

    impl Actor for Echo {}

    impl Handler<u32> for Echo {
        fn on_message(&mut self, msg: &mut u32, _ctx: &mut Context<Self>) -> Flow {
            let _ = self.out.send(*msg);
            Ok(())
        }
    }

    const RECV_WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_spawn_send_receive() {
        let (tx, rx) = mpsc::channel();
        let echo = spawn(Echo { out: tx });

        echo.send(7u32);
        echo.send(8u32);
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), 7);
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), 8);
    }

    #[test]
    fn test_stop_is_terminal() {
        let (tx, rx) = mpsc::channel();
        let echo = spawn(Echo { out: tx });

        echo.stop(0);
        echo.stop(42); // idempotent; second code is ignored
        echo.send(1u32); // dropped: stopped handles behave like dead peers
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert!(!echo.is_alive());
    }

    #[test]
    fn test_wait_idle_observes_empty_mailbox() {
        let (tx, rx) = mpsc::channel();
        let echo = spawn(Echo { out: tx });

        for i in 0..100u32 {
            echo.send(i);
        }
        assert!(echo.wait_idle(Duration::from_secs(5)));
        drop(rx);
    }

    #[test]
    fn test_gateway_survives_dead_target() {
        let (tx, rx) = mpsc::channel();
        let echo = spawn(Echo { out: tx });
        let gateway = Gateway::new(echo.downgrade());

        gateway.send(1u32);
        assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), 1);

        drop(echo); // stops and joins the entity
        gateway.send(2u32); // silent no-op
        gateway.call(3u32);
        assert!(gateway.get().is_none());
    }

    #[test]
    fn test_weak_handle_cannot_resurrect() {
        let (tx, _rx) = mpsc::channel();
        let echo = spawn(Echo { out: tx });
        let weak = echo.downgrade();

        assert!(weak.upgrade().is_some());
        drop(echo);
        assert!(weak.upgrade().is_none());
    }
}
