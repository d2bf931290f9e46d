//! Delivery-order guarantees: FIFO per sender→receiver pair, under both a
//! single sender and heavy concurrent fan-in.

use std::thread;
use std::time::Duration;

use crossbeam_channel::bounded;

use arbor_e2e_tests::{OrderMsg, OrderTracker};
use arbor_runtime::{ActorSystem, Props, SystemConfig};

const WAIT: Duration = Duration::from_secs(60);

#[test]
fn single_sender_fifo() {
    let system = ActorSystem::with_config(SystemConfig::default().with_worker_threads(2)).unwrap();
    let tracker = system.spawn(Props::new(OrderTracker::default)).unwrap();

    let (notify, rx) = bounded(1);
    tracker.send(OrderMsg::Watch { target: 1_000, notify }).unwrap();

    for seq in 0..1_000u32 {
        tracker.send(OrderMsg::Record { sender: 0, seq }).unwrap();
    }

    let report = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(report.recorded, 1_000);
    assert_eq!(report.order_violations, 0);
    system.shutdown();
}

#[test]
fn thousand_concurrent_senders_keep_per_sender_order() {
    let senders = 1_000usize;
    let per_sender = 100u32;
    let total = (senders as u64) * (per_sender as u64);

    let system = ActorSystem::with_config(
        SystemConfig::default().with_name("ordering").with_throughput(64),
    )
    .unwrap();
    let tracker = system.spawn(Props::new(OrderTracker::default)).unwrap();

    let (notify, rx) = bounded(1);
    tracker.send(OrderMsg::Watch { target: total, notify }).unwrap();

    let handles: Vec<_> = (0..senders)
        .map(|sender| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                for seq in 0..per_sender {
                    tracker.send(OrderMsg::Record { sender, seq }).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let report = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(report.recorded, total);
    assert_eq!(report.order_violations, 0);

    assert!(system.metrics().snapshot().messages_processed >= total);
    system.shutdown();
}
