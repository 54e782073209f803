//! Timer behaviour under a live dispatcher

use std::sync::mpsc;
use std::time::{Duration, Instant};

use selkie_actor::{spawn, Actor, Context, Flow, Handler, Timed, TimerCycle};

const RECV_WAIT: Duration = Duration::from_secs(5);

#[derive(Clone, PartialEq, Eq, Hash)]
struct Tick(u32);

// =============================================================================
// One-shot
// =============================================================================

struct OneShot {
    out: mpsc::Sender<u32>,
}

impl Actor for OneShot {
    fn on_start(&mut self, ctx: &mut Context<Self>) {
        ctx.timer_start(Tick(1), Duration::from_millis(10), TimerCycle::OneShot)
            .unwrap();
    }
}

impl Timed<Tick> for OneShot {
    fn on_timer(&mut self, payload: &Tick, _ctx: &mut Context<Self>) {
        let _ = self.out.send(payload.0);
    }
}

#[test]
fn test_one_shot_fires_exactly_once() {
    let (tx, rx) = mpsc::channel();
    let _actor = spawn(OneShot { out: tx });

    assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), 1);
    assert!(
        rx.recv_timeout(Duration::from_millis(200)).is_err(),
        "one-shot fired twice"
    );
}

// =============================================================================
// Start-then-stop: zero fires
// =============================================================================

struct Cancelled {
    out: mpsc::Sender<u32>,
}

impl Actor for Cancelled {
    fn on_start(&mut self, ctx: &mut Context<Self>) {
        ctx.timer_start(Tick(9), Duration::from_millis(10), TimerCycle::OneShot)
            .unwrap();
        ctx.timer_stop(&Tick(9)).unwrap();
    }
}

impl Timed<Tick> for Cancelled {
    fn on_timer(&mut self, payload: &Tick, _ctx: &mut Context<Self>) {
        let _ = self.out.send(payload.0);
    }
}

#[test]
fn test_start_then_stop_means_zero_fires() {
    let (tx, rx) = mpsc::channel();
    let _actor = spawn(Cancelled { out: tx });

    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

// =============================================================================
// Periodic cadence and cancellation
// =============================================================================

struct Periodic {
    out: mpsc::Sender<Instant>,
    fires: u32,
}

impl Actor for Periodic {
    fn on_start(&mut self, ctx: &mut Context<Self>) {
        ctx.timer_start(Tick(2), Duration::from_millis(20), TimerCycle::Periodic)
            .unwrap();
    }
}

impl Timed<Tick> for Periodic {
    fn on_timer(&mut self, _payload: &Tick, ctx: &mut Context<Self>) {
        self.fires += 1;
        let _ = self.out.send(Instant::now());
        if self.fires == 4 {
            ctx.timer_stop(&Tick(2)).unwrap();
        }
    }
}

#[test]
fn test_periodic_fires_repeatedly_until_stopped() {
    let (tx, rx) = mpsc::channel();
    let _actor = spawn(Periodic { out: tx, fires: 0 });

    let mut instants = Vec::new();
    for _ in 0..4 {
        instants.push(rx.recv_timeout(RECV_WAIT).unwrap());
    }
    assert!(
        rx.recv_timeout(Duration::from_millis(200)).is_err(),
        "fired after timer_stop"
    );

    // Cadence sanity: the grid is phase-preserving, so even with a late
    // first fire the four deadlines span three periods less one.
    let span = instants[3] - instants[0];
    assert!(span >= Duration::from_millis(35), "span was {:?}", span);
}

// =============================================================================
// Equal payloads reprogram, distinct payloads coexist
// =============================================================================

struct Reprogram {
    out: mpsc::Sender<u32>,
}

impl Actor for Reprogram {
    fn on_start(&mut self, ctx: &mut Context<Self>) {
        // The second start replaces the first: same payload value.
        ctx.timer_start(Tick(5), Duration::from_secs(60), TimerCycle::OneShot)
            .unwrap();
        ctx.timer_start(Tick(5), Duration::from_millis(10), TimerCycle::OneShot)
            .unwrap();
        // Distinct payload: a second, independent timer.
        ctx.timer_start(Tick(6), Duration::from_millis(30), TimerCycle::OneShot)
            .unwrap();
    }
}

impl Timed<Tick> for Reprogram {
    fn on_timer(&mut self, payload: &Tick, _ctx: &mut Context<Self>) {
        let _ = self.out.send(payload.0);
    }
}

#[test]
fn test_equal_payload_reprograms_existing_timer() {
    let (tx, rx) = mpsc::channel();
    let _actor = spawn(Reprogram { out: tx });

    assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), 5, "reprogrammed lapse");
    assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), 6);
    assert!(
        rx.recv_timeout(Duration::from_millis(200)).is_err(),
        "the replaced 60s schedule leaked through"
    );
}

// =============================================================================
// Channel-delivered timers
// =============================================================================

struct Relay {
    out: mpsc::Sender<String>,
}

impl Actor for Relay {
    fn on_start(&mut self, ctx: &mut Context<Self>) {
        // The timer event rides an explicit channel back into our own
        // mailbox rather than the Timed hook.
        let to_self = ctx.channel::<String>();
        ctx.timer_start_with(
            "beat".to_string(),
            Duration::from_millis(10),
            to_self,
            TimerCycle::OneShot,
        )
        .unwrap();
    }
}

impl Handler<String> for Relay {
    fn on_message(&mut self, msg: &mut String, _ctx: &mut Context<Self>) -> Flow {
        let _ = self.out.send(std::mem::take(msg));
        Ok(())
    }
}

#[test]
fn test_timer_event_through_explicit_channel() {
    let (tx, rx) = mpsc::channel();
    let _actor = spawn(Relay { out: tx });

    assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), "beat");
}

// =============================================================================
// Timer reset defers the deadline
// =============================================================================

struct Resetter {
    out: mpsc::Sender<&'static str>,
}

struct Defer;

impl Actor for Resetter {
    fn on_start(&mut self, ctx: &mut Context<Self>) {
        ctx.timer_start(Tick(8), Duration::from_millis(80), TimerCycle::OneShot)
            .unwrap();
    }
}

impl Handler<Defer> for Resetter {
    fn on_message(&mut self, _msg: &mut Defer, ctx: &mut Context<Self>) -> Flow {
        ctx.timer_reset(&Tick(8)).unwrap();
        let _ = self.out.send("deferred");
        Ok(())
    }
}

impl Timed<Tick> for Resetter {
    fn on_timer(&mut self, _payload: &Tick, _ctx: &mut Context<Self>) {
        let _ = self.out.send("fired");
    }
}

#[test]
fn test_reset_pushes_the_deadline_out() {
    let (tx, rx) = mpsc::channel();
    let actor = spawn(Resetter { out: tx });

    // Reset halfway through the lapse; the fire must land after the new
    // deadline, not the original one.
    std::thread::sleep(Duration::from_millis(40));
    let t_reset = Instant::now();
    actor.send(Defer);
    assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), "deferred");
    assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), "fired");
    assert!(
        t_reset.elapsed() >= Duration::from_millis(75),
        "fired before the rebased deadline"
    );
}
