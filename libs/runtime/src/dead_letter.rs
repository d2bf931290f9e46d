//! Dead-Letter Sink
//!
//! Undeliverable messages are never an error for the sender and never
//! silently vanish: they land here, type-erased, where diagnostics and
//! tests can observe them.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::message::Message;
use crate::registry::ActorId;

/// Why a message ended up in the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadLetterReason {
    /// Target actor has terminated
    Terminated,
    /// Target actor was never registered or is already gone from the registry
    Unregistered,
    /// Mailbox was closed while the send was in flight
    MailboxClosed,
    /// Message was still queued when the actor stopped and the stop policy
    /// discards the remaining mailbox
    Discarded,
}

/// An undeliverable message together with its intended target.
///
/// The payload is kept type-erased so one sink serves every actor type;
/// [`DeadLetter::downcast`] recovers the concrete message for assertions.
#[derive(Clone)]
pub struct DeadLetter {
    pub actor: ActorId,
    pub type_name: &'static str,
    pub reason: DeadLetterReason,
    payload: Arc<dyn Any + Send + Sync>,
}

impl DeadLetter {
    pub(crate) fn new<M: Message>(actor: ActorId, msg: M, reason: DeadLetterReason) -> Self {
        Self {
            actor,
            type_name: std::any::type_name::<M>(),
            reason,
            payload: Arc::new(msg),
        }
    }

    /// View the payload as a concrete message type
    pub fn downcast<M: Message>(&self) -> Option<&M> {
        self.payload.downcast_ref::<M>()
    }
}

impl fmt::Debug for DeadLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadLetter")
            .field("actor", &self.actor)
            .field("type_name", &self.type_name)
            .field("reason", &self.reason)
            .finish()
    }
}

/// Process-wide sink for undeliverable messages
#[derive(Clone, Default)]
pub struct DeadLetterSink {
    inner: Arc<SinkInner>,
}

#[derive(Default)]
struct SinkInner {
    subscribers: Mutex<Vec<Sender<DeadLetter>>>,
    published: AtomicU64,
}

impl DeadLetterSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every dead letter published from now on.
    ///
    /// Dropped receivers are pruned on the next publish.
    pub fn subscribe(&self) -> Receiver<DeadLetter> {
        let (tx, rx) = unbounded();
        self.inner.subscribers.lock().push(tx);
        rx
    }

    /// Total dead letters published since system start
    pub fn count(&self) -> u64 {
        self.inner.published.load(Ordering::Relaxed)
    }

    pub(crate) fn publish(&self, letter: DeadLetter) {
        self.inner.published.fetch_add(1, Ordering::Relaxed);
        debug!(
            actor_id = %letter.actor,
            message_type = letter.type_name,
            reason = ?letter.reason,
            "Message routed to dead-letter sink"
        );

        let mut subscribers = self.inner.subscribers.lock();
        subscribers.retain(|tx| tx.send(letter.clone()).is_ok());
    }
}

impl fmt::Debug for DeadLetterSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadLetterSink")
            .field("published", &self.count())
            .finish()
    }
}
