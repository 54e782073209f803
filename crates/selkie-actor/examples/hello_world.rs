//! An actor conversation: an application entity talks to a world entity,
//! and both print through a dedicated printer entity so output lines never
//! interleave.
//!
//! Run with `cargo run --example hello_world`; exits with code 123, set by
//! the application's own stop.

use std::time::{Duration, Instant};

use selkie_actor::{
    run, spawn, Actor, ActorHandle, Context, Flow, Gateway, Handler, Timed, TimerCycle,
};
use selkie_core::{init_telemetry, TelemetryConfig};

fn line(text: impl AsRef<str>) -> String {
    let thread = std::thread::current();
    format!(
        "<thread {}> {}",
        thread.name().unwrap_or("?"),
        text.as_ref()
    )
}

// =============================================================================
// Printer
// =============================================================================

struct Printer {
    start: Instant,
}

impl Printer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Actor for Printer {
    fn on_start(&mut self, _ctx: &mut Context<Self>) {
        self.print(line("<printer> power on"));
    }
}

impl Printer {
    fn print(&self, text: String) {
        println!("{:>15.9} {}", self.start.elapsed().as_secs_f64(), text);
    }
}

impl Handler<String> for Printer {
    fn on_message(&mut self, msg: &mut String, _ctx: &mut Context<Self>) -> Flow {
        self.print(std::mem::take(msg));
        Ok(())
    }
}

// =============================================================================
// World
// =============================================================================

struct Kiosk {
    item: String,
}
struct Gallery {
    picture: String,
    author: String,
}
struct Bank {
    amount: f64,
    account: String,
}

struct Newspaper {
    name: String,
}
struct Picture {
    width: u32,
    height: u32,
}
struct Money {
    amount: f64,
}

struct World {
    printer: Option<ActorHandle<Printer>>,
    app: Gateway<App>,
}

impl Actor for World {}

impl World {
    fn print(&self, text: String) {
        if let Some(printer) = &self.printer {
            printer.send(text);
        }
    }
}

impl Handler<ActorHandle<Printer>> for World {
    fn on_message(&mut self, msg: &mut ActorHandle<Printer>, _ctx: &mut Context<Self>) -> Flow {
        self.printer = Some(msg.clone());
        self.print(line("<world> now I can also print!"));
        Ok(())
    }
}

impl Handler<i32> for World {
    fn on_message(&mut self, year: &mut i32, _ctx: &mut Context<Self>) -> Flow {
        self.print(line(format!("<world> year {}", year)));
        Ok(())
    }
}

impl Handler<Kiosk> for World {
    fn on_message(&mut self, msg: &mut Kiosk, _ctx: &mut Context<Self>) -> Flow {
        self.print(line(format!("<world> is requested: {}", msg.item)));
        self.app.send(Newspaper {
            name: "The Times".into(),
        });
        Ok(())
    }
}

impl Handler<Gallery> for World {
    fn on_message(&mut self, msg: &mut Gallery, _ctx: &mut Context<Self>) -> Flow {
        self.print(line(format!(
            "<world> is requested: {} ({})",
            msg.picture, msg.author
        )));
        self.app.send(Picture {
            width: 1024,
            height: 768,
        });
        Ok(())
    }
}

impl Handler<Bank> for World {
    fn on_message(&mut self, msg: &mut Bank, _ctx: &mut Context<Self>) -> Flow {
        self.print(line(format!(
            "<world> is requested: {} euros from {}",
            msg.amount, msg.account
        )));
        self.app.send(Money { amount: msg.amount });
        Ok(())
    }
}

// =============================================================================
// Application
// =============================================================================

#[derive(Default)]
struct App {
    printer: Option<ActorHandle<Printer>>,
    world: Option<ActorHandle<World>>,
}

impl App {
    fn print(&self, text: String) {
        if let Some(printer) = &self.printer {
            printer.send(text);
        }
    }
}

impl Actor for App {
    fn on_start(&mut self, ctx: &mut Context<Self>) {
        let printer = spawn(Printer::new());
        printer.send(line("<application> print test page"));

        let world = spawn(World {
            printer: None,
            app: Gateway::new(ctx.weak_handle()),
        });
        world.send(printer.clone());

        world.send(2016i32);
        world.send(Kiosk {
            item: "latest newspaper".into(),
        });
        world.send(Gallery {
            picture: "La persistencia de la memoria".into(),
            author: "Dali".into(),
        });
        world.send(Bank {
            amount: 50.0,
            account: "savings".into(),
        });

        self.printer = Some(printer);
        self.world = Some(world);

        ctx.timer_start(123i32, Duration::from_secs(1), TimerCycle::OneShot)
            .expect("timer on the owning thread");
    }

    fn on_stop(&mut self, _ctx: &mut Context<Self>) {
        self.print(line("<application> exiting"));
        if let Some(printer) = &self.printer {
            printer.wait_idle_default();
        }
        self.world = None;
    }
}

impl Handler<Newspaper> for App {
    fn on_message(&mut self, msg: &mut Newspaper, _ctx: &mut Context<Self>) -> Flow {
        self.print(line(format!("<application> is responded: {}", msg.name)));
        Ok(())
    }
}

impl Handler<Picture> for App {
    fn on_message(&mut self, msg: &mut Picture, _ctx: &mut Context<Self>) -> Flow {
        self.print(line(format!(
            "<application> is responded: {}x{} picture",
            msg.width, msg.height
        )));
        Ok(())
    }
}

impl Handler<Money> for App {
    fn on_message(&mut self, msg: &mut Money, _ctx: &mut Context<Self>) -> Flow {
        self.print(line(format!(
            "<application> is responded: {} euros",
            msg.amount
        )));
        Ok(())
    }
}

impl Timed<i32> for App {
    fn on_timer(&mut self, &code: &i32, ctx: &mut Context<Self>) {
        // Self-terminate with an exit code; valid for entities adopted by
        // `run`.
        ctx.stop(code);
    }
}

fn main() {
    let _ = init_telemetry(TelemetryConfig::from_env());
    std::process::exit(run(App::default()));
}
