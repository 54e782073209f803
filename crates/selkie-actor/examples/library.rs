//! Publish/subscribe against a library entity of unknown lifecycle
//!
//! A client subscribes to everything a library publishes, then talks to it
//! through a gateway that stays safe even if the library were gone. The
//! library beats on periodic timers, publishes typed events, and shares a
//! live billing counter with the client.
//!
//! Run with `cargo run --example library`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use selkie_actor::{
    run, spawn, Actor, ActorHandle, Context, Flow, Gateway, Handler, Timed, TimerCycle,
};
use selkie_core::{init_telemetry, TelemetryConfig};

// =============================================================================
// Shared vocabulary
// =============================================================================

#[derive(Clone)]
struct Info(String);

#[derive(Clone)]
struct ReplyA(String);

#[derive(Clone)]
struct ReplyB(String);

/// Shared message: the same counter is read by the client while the
/// library keeps incrementing it.
#[derive(Default)]
struct Billing {
    count: AtomicU32,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct LibraryIsTired;

struct RequestA(String);
struct RequestB(String);
struct WantEvents;

// =============================================================================
// Library
// =============================================================================

#[derive(Clone, PartialEq, Eq, Hash)]
struct BillTick;

struct Library {
    bills: Arc<Billing>,
}

impl Library {
    fn new() -> Self {
        Self {
            bills: Arc::new(Billing::default()),
        }
    }
}

impl Actor for Library {}

impl Handler<WantEvents> for Library {
    fn on_message(&mut self, _msg: &mut WantEvents, ctx: &mut Context<Self>) -> Flow {
        // Some activity to spend ink.
        ctx.timer_start(
            "faster event".to_string(),
            Duration::from_millis(333),
            TimerCycle::Periodic,
        )
        .unwrap();
        ctx.timer_start(
            "slower event".to_string(),
            Duration::from_millis(666),
            TimerCycle::Periodic,
        )
        .unwrap();
        ctx.timer_start(BillTick, Duration::from_millis(500), TimerCycle::Periodic)
            .unwrap();
        ctx.timer_start(LibraryIsTired, Duration::from_secs(3), TimerCycle::OneShot)
            .unwrap();
        Ok(())
    }
}

impl Handler<RequestA> for Library {
    fn on_message(&mut self, msg: &mut RequestA, ctx: &mut Context<Self>) -> Flow {
        ctx.publish(&ReplyA(format!("reply to {}", msg.0)));
        self.bills.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Handler<RequestB> for Library {
    fn on_message(&mut self, msg: &mut RequestB, ctx: &mut Context<Self>) -> Flow {
        ctx.publish(&ReplyB(format!("reply to {}", msg.0)));
        self.bills.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Timed<String> for Library {
    fn on_timer(&mut self, which: &String, ctx: &mut Context<Self>) {
        ctx.publish(&Info(which.clone()));
    }
}

impl Timed<BillTick> for Library {
    fn on_timer(&mut self, _payload: &BillTick, ctx: &mut Context<Self>) {
        ctx.publish(&self.bills);
    }
}

impl Timed<LibraryIsTired> for Library {
    fn on_timer(&mut self, payload: &LibraryIsTired, ctx: &mut Context<Self>) {
        ctx.publish(payload);
    }
}

// =============================================================================
// Client
// =============================================================================

struct Client {
    library: Option<ActorHandle<Library>>,
    safe_library: Gateway<Library>,
}

impl Client {
    fn new(library: ActorHandle<Library>) -> Self {
        let safe_library = Gateway::new(library.downgrade());
        Self {
            library: Some(library),
            safe_library,
        }
    }
}

impl Actor for Client {
    fn on_start(&mut self, ctx: &mut Context<Self>) {
        if let Some(library) = &self.library {
            let me = ctx.weak_handle();
            library.connect_to_weak::<Info, _>(&me);
            library.connect_to_weak::<ReplyA, _>(&me);
            library.connect_to_weak::<ReplyB, _>(&me);
            library.connect_to_weak::<Arc<Billing>, _>(&me);
            library.connect_to_weak::<LibraryIsTired, _>(&me);
        }
        // The gateway would stay harmless even if the library were deleted.
        self.safe_library.send(WantEvents);
    }
}

impl Handler<Info> for Client {
    fn on_message(&mut self, msg: &mut Info, _ctx: &mut Context<Self>) -> Flow {
        println!("<client> received {}", msg.0);
        if msg.0.contains("fast") {
            self.safe_library.send(RequestA("RequestA".into()));
        } else {
            self.safe_library.send(RequestB("RequestB".into()));
        }
        Ok(())
    }
}

impl Handler<ReplyA> for Client {
    fn on_message(&mut self, msg: &mut ReplyA, _ctx: &mut Context<Self>) -> Flow {
        println!("<client> received {}", msg.0);
        Ok(())
    }
}

impl Handler<ReplyB> for Client {
    fn on_message(&mut self, msg: &mut ReplyB, _ctx: &mut Context<Self>) -> Flow {
        println!("<client> received {}", msg.0);
        Ok(())
    }
}

impl Handler<Arc<Billing>> for Client {
    fn on_message(&mut self, msg: &mut Arc<Billing>, _ctx: &mut Context<Self>) -> Flow {
        println!(
            "<client> billed so far: {}",
            msg.count.load(Ordering::Relaxed)
        );
        Ok(())
    }
}

impl Handler<LibraryIsTired> for Client {
    fn on_message(&mut self, _msg: &mut LibraryIsTired, ctx: &mut Context<Self>) -> Flow {
        println!("<client> shutting down");
        ctx.stop(0);
        Ok(())
    }
}

fn main() {
    let _ = init_telemetry(TelemetryConfig::from_env());
    let library = spawn(Library::new());
    std::process::exit(run(Client::new(library)));
}
