//! Actor Mailboxes
//!
//! Per-actor inbound queue: many concurrent senders, one dispatcher-driven
//! consumer. All policies share the same push/pop contract so the dispatcher
//! never cares which one an actor runs.
//!
//! Ordering: the queue preserves each sender's send order (FIFO per
//! sender→receiver pair). The priority policy drains its high lane first,
//! which intentionally relaxes FIFO *across* lanes; within a lane the
//! guarantee holds.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::dead_letter::{DeadLetter, DeadLetterReason, DeadLetterSink};
use crate::message::{Envelope, Message, Priority};
use crate::registry::ActorId;

/// Queueing strategy for an actor's mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailboxPolicy {
    /// FIFO queue without capacity limit (default)
    #[default]
    Unbounded,
    /// FIFO queue that rejects sends at capacity with a backpressure error
    Bounded { capacity: usize },
    /// Two-lane mailbox: bounded high-priority lane drained before an
    /// unbounded normal lane
    Priority { high_capacity: usize },
}

/// Outcome of a push the cell translates into send semantics
#[derive(Debug)]
pub(crate) enum PushError<M: Message> {
    /// Bounded lane at capacity; the message is handed back
    Full {
        msg: M,
        depth: usize,
        capacity: usize,
    },
    /// Mailbox closed by termination; the message is handed back
    Closed(M),
}

enum Lanes<M: Message> {
    Single {
        tx: Sender<Envelope<M>>,
        rx: Receiver<Envelope<M>>,
        capacity: Option<usize>,
    },
    Dual {
        high_tx: Sender<Envelope<M>>,
        high_rx: Receiver<Envelope<M>>,
        high_capacity: usize,
        normal_tx: Sender<Envelope<M>>,
        normal_rx: Receiver<Envelope<M>>,
    },
}

/// Concurrent multi-producer, single-consumer message queue
pub(crate) struct Mailbox<M: Message> {
    lanes: Lanes<M>,
    closed: AtomicBool,
}

impl<M: Message> Mailbox<M> {
    pub(crate) fn new(policy: MailboxPolicy) -> Self {
        let lanes = match policy {
            MailboxPolicy::Unbounded => {
                let (tx, rx) = unbounded();
                Lanes::Single {
                    tx,
                    rx,
                    capacity: None,
                }
            }
            MailboxPolicy::Bounded { capacity } => {
                let (tx, rx) = bounded(capacity.max(1));
                Lanes::Single {
                    tx,
                    rx,
                    capacity: Some(capacity.max(1)),
                }
            }
            MailboxPolicy::Priority { high_capacity } => {
                let (high_tx, high_rx) = bounded(high_capacity.max(1));
                let (normal_tx, normal_rx) = unbounded();
                Lanes::Dual {
                    high_tx,
                    high_rx,
                    high_capacity: high_capacity.max(1),
                    normal_tx,
                    normal_rx,
                }
            }
        };

        Self {
            lanes,
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueue a message. Non-blocking in every policy.
    pub(crate) fn push(&self, msg: M, priority: Priority) -> Result<(), PushError<M>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PushError::Closed(msg));
        }

        let (tx, capacity) = match &self.lanes {
            Lanes::Single { tx, capacity, .. } => (tx, *capacity),
            Lanes::Dual {
                high_tx,
                high_capacity,
                normal_tx,
                ..
            } => {
                if priority.is_high() {
                    (high_tx, Some(*high_capacity))
                } else {
                    (normal_tx, None)
                }
            }
        };

        match tx.try_send(Envelope::new(msg)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(env)) => Err(PushError::Full {
                msg: env.msg,
                depth: tx.len(),
                capacity: capacity.unwrap_or(0),
            }),
            // Both endpoints live in this struct, so disconnection only
            // happens during teardown races; treat it as closed.
            Err(TrySendError::Disconnected(env)) => Err(PushError::Closed(env.msg)),
        }
    }

    /// Dequeue the next message, high lane first
    pub(crate) fn pop(&self) -> Option<Envelope<M>> {
        match &self.lanes {
            Lanes::Single { rx, .. } => rx.try_recv().ok(),
            Lanes::Dual {
                high_rx, normal_rx, ..
            } => high_rx.try_recv().ok().or_else(|| normal_rx.try_recv().ok()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match &self.lanes {
            Lanes::Single { rx, .. } => rx.len(),
            Lanes::Dual {
                high_rx, normal_rx, ..
            } => high_rx.len() + normal_rx.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refuse further pushes. Already-queued messages stay until drained.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Route every queued message to the dead-letter sink.
    ///
    /// Safe to call from multiple threads; each message is delivered to the
    /// sink exactly once.
    pub(crate) fn drain_to(&self, sink: &DeadLetterSink, actor: ActorId, reason: DeadLetterReason) {
        while let Some(env) = self.pop() {
            sink.publish(DeadLetter::new(actor, env.msg, reason));
        }
    }
}
