//! Selkie Actor
//!
//! Active object runtime: wraps a user-defined type into an entity with a
//! private thread of execution, typed message passing over a two-band
//! mailbox, a per-entity timer table, a type-indexed publish/subscribe
//! directory, and optional interleaving with a foreign event loop.
//!
//! # Overview
//!
//! ```
//! use selkie_actor::{spawn, Actor, Context, Flow, Handler};
//!
//! struct Greeter;
//!
//! struct Hello(String);
//!
//! impl Actor for Greeter {}
//!
//! impl Handler<Hello> for Greeter {
//!     fn on_message(&mut self, msg: &mut Hello, _ctx: &mut Context<Self>) -> Flow {
//!         println!("hello, {}", msg.0);
//!         Ok(())
//!     }
//! }
//!
//! let greeter = spawn(Greeter);
//! greeter.send(Hello("world".into()));
//! greeter.wait_idle_default();
//! ```
//!
//! # TigerStyle
//!
//! - One dispatcher thread per entity; user code is never re-entered
//!   concurrently
//! - FIFO per priority band; high band strictly before normal
//! - Explicit lifecycle: spawned → started → dispatching → stopping →
//!   stopped, with no resurrection

pub mod actor;
pub mod channel;
pub mod context;
pub mod handle;
pub mod options;
pub mod retry;
pub mod timer;

mod core;
mod directory;
mod dispatcher;
mod mailbox;
mod parcel;

pub use actor::{Actor, Handler, LoopWaker, Timed};
pub use channel::Channel;
pub use context::Context;
pub use handle::{run, run_with, spawn, spawn_with, ActorHandle, Gateway, WeakHandle};
pub use options::RuntimeOptions;
pub use retry::{DispatchRetry, Flow};
pub use timer::{TimerCycle, TimerPayload};
