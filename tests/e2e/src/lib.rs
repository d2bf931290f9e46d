//! Shared test actors for the end-to-end scenarios.

use std::collections::HashMap;

use async_trait::async_trait;
use crossbeam_channel::Sender;

use arbor_runtime::{ActorBehavior, ActorError, Context, Result};

/// Messages accepted by [`Counter`]
pub enum CounterMsg {
    Increment,
    /// Panic while processing, exercising the failure path
    Crash,
    /// Fail with an error instead of a panic
    FailWith(&'static str),
    GetValue {
        reply: Sender<u64>,
    },
}

/// The canonical counter actor: integer state, increment/crash/query.
#[derive(Default)]
pub struct Counter {
    value: u64,
}

#[async_trait]
impl ActorBehavior for Counter {
    type Message = CounterMsg;

    async fn handle(&mut self, msg: CounterMsg, _ctx: &mut Context<CounterMsg>) -> Result<()> {
        match msg {
            CounterMsg::Increment => {
                self.value += 1;
                Ok(())
            }
            CounterMsg::Crash => panic!("crash requested"),
            CounterMsg::FailWith(message) => Err(ActorError::msg(message)),
            CounterMsg::GetValue { reply } => {
                let _ = reply.send(self.value);
                Ok(())
            }
        }
    }
}

/// Messages accepted by [`OrderTracker`]
pub enum OrderMsg {
    Record {
        sender: usize,
        seq: u32,
    },
    /// Ask to be notified once `target` messages have been recorded
    Watch {
        target: u64,
        notify: Sender<OrderReport>,
    },
}

/// Summary the tracker emits when its watch target is reached
#[derive(Debug, Clone)]
pub struct OrderReport {
    pub recorded: u64,
    pub order_violations: u64,
}

/// Records per-sender sequence numbers and counts ordering violations.
///
/// Each sender must be observed in strictly increasing sequence order;
/// anything else increments `order_violations`.
#[derive(Default)]
pub struct OrderTracker {
    recorded: u64,
    order_violations: u64,
    last_seq: HashMap<usize, u32>,
    watch: Option<(u64, Sender<OrderReport>)>,
}

#[async_trait]
impl ActorBehavior for OrderTracker {
    type Message = OrderMsg;

    async fn handle(&mut self, msg: OrderMsg, _ctx: &mut Context<OrderMsg>) -> Result<()> {
        match msg {
            OrderMsg::Record { sender, seq } => {
                if let Some(&prev) = self.last_seq.get(&sender) {
                    if seq != prev + 1 {
                        self.order_violations += 1;
                    }
                }
                self.last_seq.insert(sender, seq);
                self.recorded += 1;
                self.maybe_report();
            }
            OrderMsg::Watch { target, notify } => {
                self.watch = Some((target, notify));
                self.maybe_report();
            }
        }
        Ok(())
    }
}

impl OrderTracker {
    fn maybe_report(&mut self) {
        if let Some((target, _)) = &self.watch {
            if self.recorded >= *target {
                if let Some((_, notify)) = self.watch.take() {
                    let _ = notify.send(OrderReport {
                        recorded: self.recorded,
                        order_violations: self.order_violations,
                    });
                }
            }
        }
    }
}
