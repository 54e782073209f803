//! Interleaving an entity with a foreign event loop
//!
//! The entity hands its thread to a host loop via `acquire_dispatcher`; the
//! runtime feeds the host through the registered waker, and the host drains
//! parcels and timers with `handle_actor_events`.

use std::sync::{mpsc, Arc, Condvar, Mutex};
use std::time::Duration;

use selkie_actor::{spawn, Actor, Context, Flow, Handler, LoopWaker, Timed, TimerCycle};

const RECV_WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct HostState {
    events: bool,
    timer: Option<Duration>,
    stopping: bool,
}

/// Minimal host loop: a mutex-guarded state word and a condvar
#[derive(Default)]
struct HostWaker {
    state: Mutex<HostState>,
    cv: Condvar,
}

impl LoopWaker for HostWaker {
    fn on_waiting_events(&self) {
        self.state.lock().unwrap().events = true;
        self.cv.notify_one();
    }

    fn on_waiting_timer(&self, lapse: Duration) {
        self.state.lock().unwrap().timer = Some(lapse);
        self.cv.notify_one();
    }

    fn on_waiting_timer_cancel(&self) {
        self.state.lock().unwrap().timer = None;
        self.cv.notify_one();
    }

    fn on_stopping(&self) {
        self.state.lock().unwrap().stopping = true;
        self.cv.notify_one();
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct Tick;

struct Note(&'static str);

struct Foreign {
    waker: Arc<HostWaker>,
    out: mpsc::Sender<&'static str>,
}

impl Actor for Foreign {
    fn on_start(&mut self, ctx: &mut Context<Self>) {
        ctx.timer_start(Tick, Duration::from_millis(30), TimerCycle::OneShot)
            .unwrap();
        ctx.acquire_dispatcher(self.waker.clone());
        let _ = self.out.send("start");
    }

    fn on_dispatching(&mut self, ctx: &mut Context<Self>) {
        let _ = self.out.send("foreign-entered");
        let waker = self.waker.clone();

        loop {
            let mut state = waker.state.lock().unwrap();
            if state.stopping {
                break;
            }
            if state.events {
                state.events = false;
                drop(state);
                ctx.handle_actor_events(self);
                continue;
            }
            match state.timer {
                Some(lapse) => {
                    let (guard, result) = waker.cv.wait_timeout(state, lapse).unwrap();
                    let timed_out = result.timed_out();
                    drop(guard);
                    if timed_out {
                        waker.state.lock().unwrap().timer = None;
                        ctx.handle_actor_events(self);
                    }
                }
                None => {
                    drop(waker.cv.wait(state).unwrap());
                }
            }
        }
    }

    fn on_stop(&mut self, _ctx: &mut Context<Self>) {
        let _ = self.out.send("on_stop");
    }
}

impl Timed<Tick> for Foreign {
    fn on_timer(&mut self, _payload: &Tick, _ctx: &mut Context<Self>) {
        let _ = self.out.send("tick");
    }
}

impl Handler<Note> for Foreign {
    fn on_message(&mut self, msg: &mut Note, _ctx: &mut Context<Self>) -> Flow {
        let _ = self.out.send(msg.0);
        Ok(())
    }
}

#[test]
fn test_foreign_loop_drains_parcels_and_timers() {
    let (tx, rx) = mpsc::channel();
    let waker = Arc::new(HostWaker::default());
    let actor = spawn(Foreign {
        waker: waker.clone(),
        out: tx,
    });

    assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), "start");
    assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), "foreign-entered");

    actor.send(Note("note"));

    // Both the parcel and the timer come through the host loop, in either
    // order depending on timing.
    let mut seen = vec![
        rx.recv_timeout(RECV_WAIT).unwrap(),
        rx.recv_timeout(RECV_WAIT).unwrap(),
    ];
    seen.sort_unstable();
    assert_eq!(seen, vec!["note", "tick"]);

    // Stop from outside: on_stopping unwinds the host loop so on_stop can
    // run on the owning thread.
    actor.stop(0);
    assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), "on_stop");
    assert!(!actor.is_alive());
}
