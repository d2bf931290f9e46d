//! Supervision semantics: single in-flight execution, crash isolation,
//! restart-from-factory, restart budgets, and escalation through the tree.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crossbeam_channel::{bounded, Sender};

use arbor_e2e_tests::{Counter, CounterMsg};
use arbor_runtime::{
    ActorBehavior, ActorRef, ActorSystem, Context, Props, RestartPolicy, Result,
    SupervisorDirective, SystemConfig,
};

const WAIT: Duration = Duration::from_secs(30);

fn system() -> ActorSystem {
    ActorSystem::with_config(SystemConfig::default().with_worker_threads(4)).unwrap()
}

fn value_of(counter: &ActorRef<CounterMsg>) -> u64 {
    let (reply, rx) = bounded(1);
    counter.send(CounterMsg::GetValue { reply }).unwrap();
    rx.recv_timeout(WAIT).unwrap()
}

fn wait_for_termination<M: arbor_runtime::Message>(system: &ActorSystem, actor: &ActorRef<M>) {
    while system.status(actor).is_some() {
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// P2: no two tasks for the same actor ever run concurrently, even with
/// many senders racing against a multi-worker pool.
#[test]
fn single_in_flight_execution() {
    enum ProbeMsg {
        Work,
        Done { reply: Sender<u64> },
    }

    struct Probe {
        in_handler: Arc<AtomicBool>,
        overlaps: Arc<AtomicU64>,
    }

    #[async_trait]
    impl ActorBehavior for Probe {
        type Message = ProbeMsg;

        async fn handle(&mut self, msg: ProbeMsg, _ctx: &mut Context<ProbeMsg>) -> Result<()> {
            match msg {
                ProbeMsg::Work => {
                    if self.in_handler.swap(true, Ordering::SeqCst) {
                        self.overlaps.fetch_add(1, Ordering::SeqCst);
                    }
                    // Yield mid-message so an overlapping task would have
                    // every chance to interleave
                    tokio::task::yield_now().await;
                    self.in_handler.store(false, Ordering::SeqCst);
                }
                ProbeMsg::Done { reply } => {
                    let _ = reply.send(self.overlaps.load(Ordering::SeqCst));
                }
            }
            Ok(())
        }
    }

    let system = system();
    let in_handler = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicU64::new(0));
    let probe = {
        let in_handler = Arc::clone(&in_handler);
        let overlaps = Arc::clone(&overlaps);
        system
            .spawn(Props::new(move || Probe {
                in_handler: Arc::clone(&in_handler),
                overlaps: Arc::clone(&overlaps),
            }))
            .unwrap()
    };

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let probe = probe.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    probe.send(ProbeMsg::Work).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let (reply, rx) = bounded(1);
    probe.send(ProbeMsg::Done { reply }).unwrap();
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), 0);
    system.shutdown();
}

/// P4: a panicking actor does not disturb its siblings.
#[test]
fn crash_isolation_between_siblings() {
    let system = system();
    let crasher = system.spawn(Props::new(Counter::default)).unwrap();
    let sibling_a = system.spawn(Props::new(Counter::default)).unwrap();
    let sibling_b = system.spawn(Props::new(Counter::default)).unwrap();

    crasher.send(CounterMsg::Crash).unwrap();

    for _ in 0..10 {
        sibling_a.send(CounterMsg::Increment).unwrap();
        sibling_b.send(CounterMsg::Increment).unwrap();
    }

    assert_eq!(value_of(&sibling_a), 10);
    assert_eq!(value_of(&sibling_b), 10);
    wait_for_termination(&system, &crasher);
    assert!(sibling_a.is_alive() && sibling_b.is_alive());
    system.shutdown();
}

/// P5: `Restart` rebuilds from the factory with fresh state and keeps
/// processing the queued messages.
#[test]
fn restart_rebuilds_from_factory() {
    let system = system();
    let instantiations = Arc::new(AtomicU64::new(0));
    let counter = {
        let instantiations = Arc::clone(&instantiations);
        system
            .spawn(
                Props::new(move || {
                    instantiations.fetch_add(1, Ordering::SeqCst);
                    Counter::default()
                })
                .with_supervision(SupervisorDirective::Restart),
            )
            .unwrap()
    };

    counter.send(CounterMsg::Increment).unwrap();
    counter.send(CounterMsg::Increment).unwrap();
    counter.send(CounterMsg::Crash).unwrap();
    counter.send(CounterMsg::Increment).unwrap();

    // Fresh state: only the post-crash increment is visible
    assert_eq!(value_of(&counter), 1);
    assert_eq!(instantiations.load(Ordering::SeqCst), 2);
    assert!(counter.is_alive());
    assert!(system.metrics().snapshot().actor_restarts >= 1);
    system.shutdown();
}

/// Exhausting the restart budget escalates instead of restarting forever.
#[test]
fn restart_budget_escalates_when_exhausted() {
    let system = system();
    let counter = system
        .spawn(
            Props::new(Counter::default)
                .with_supervision(SupervisorDirective::Restart)
                .with_restart_policy(RestartPolicy {
                    max_restarts: 2,
                    window: Duration::from_secs(60),
                }),
        )
        .unwrap();

    for _ in 0..3 {
        counter.send(CounterMsg::Crash).unwrap();
    }

    // Third crash exceeds the budget; the actor is terminated
    wait_for_termination(&system, &counter);
    assert!(!counter.is_alive());

    let stats = system.metrics().snapshot();
    assert!(stats.actor_restarts >= 3);
    assert!(stats.restart_failures >= 1);
    system.shutdown();
}

enum ParentMsg {
    SpawnChild {
        directive: SupervisorDirective,
        reply: Sender<ActorRef<CounterMsg>>,
    },
    Ping {
        reply: Sender<()>,
    },
}

struct Parent;

#[async_trait]
impl ActorBehavior for Parent {
    type Message = ParentMsg;

    async fn handle(&mut self, msg: ParentMsg, ctx: &mut Context<ParentMsg>) -> Result<()> {
        match msg {
            ParentMsg::SpawnChild { directive, reply } => {
                let child = ctx
                    .spawn_child(Props::new(Counter::default).with_supervision(directive))
                    .map_err(|e| arbor_runtime::ActorError::msg(e.to_string()))?;
                let _ = reply.send(child);
            }
            ParentMsg::Ping { reply } => {
                let _ = reply.send(());
            }
        }
        Ok(())
    }
}

/// `Escalate` re-applies the failure at the parent under the parent's own
/// directive — here `Stop`, so the whole branch terminates.
#[test]
fn escalation_stops_parent_with_stop_directive() {
    let system = system();
    let parent = system
        .spawn(Props::new(|| Parent).with_supervision(SupervisorDirective::Stop))
        .unwrap();

    let (reply, rx) = bounded(1);
    parent
        .send(ParentMsg::SpawnChild {
            directive: SupervisorDirective::Escalate,
            reply,
        })
        .unwrap();
    let child = rx.recv_timeout(WAIT).unwrap();

    child.send(CounterMsg::Crash).unwrap();

    wait_for_termination(&system, &child);
    wait_for_termination(&system, &parent);
    assert!(!parent.is_alive());
    system.shutdown();
}

/// With a `Restart` parent, escalation costs the child but the parent comes
/// back and keeps serving.
#[test]
fn escalation_restarts_parent_with_restart_directive() {
    let system = system();
    let parent = system
        .spawn(Props::new(|| Parent).with_supervision(SupervisorDirective::Restart))
        .unwrap();

    let (reply, rx) = bounded(1);
    parent
        .send(ParentMsg::SpawnChild {
            directive: SupervisorDirective::Escalate,
            reply,
        })
        .unwrap();
    let child = rx.recv_timeout(WAIT).unwrap();

    child.send(CounterMsg::Crash).unwrap();
    wait_for_termination(&system, &child);

    // Parent restarted in place and still answers
    let (reply, rx) = bounded(1);
    parent.send(ParentMsg::Ping { reply }).unwrap();
    rx.recv_timeout(WAIT).unwrap();
    assert!(parent.is_alive());
    system.shutdown();
}

/// Stopping a parent takes its subtree down with it.
#[test]
fn parent_termination_stops_children() {
    let system = system();
    let parent = system.spawn(Props::new(|| Parent)).unwrap();

    let (reply, rx) = bounded(1);
    parent
        .send(ParentMsg::SpawnChild {
            directive: SupervisorDirective::Stop,
            reply,
        })
        .unwrap();
    let child = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(value_of(&child), 0);

    system.stop(&parent);
    wait_for_termination(&system, &parent);
    wait_for_termination(&system, &child);
    assert!(!child.is_alive());
    system.shutdown();
}
