//! Message Model
//!
//! A message is any immutable value an actor's API accepts: small payloads
//! by value, large ones behind `Arc` inside the user's enum. Each actor type
//! declares one closed message enum, so unhandled variants are a
//! compile-time exhaustiveness error, never a runtime one.

use std::time::Instant;

/// Marker trait for values that can travel through mailboxes.
///
/// Blanket-implemented; user code never implements it by hand.
pub trait Message: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Message for T {}

/// Message priority for priority mailboxes.
///
/// `High` and `Critical` land in the priority lane; everything else takes
/// the normal lane. Non-priority mailboxes accept and ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    pub(crate) fn is_high(self) -> bool {
        matches!(self, Priority::High | Priority::Critical)
    }
}

/// Mailbox entry wrapping a user message.
#[derive(Debug)]
pub(crate) struct Envelope<M: Message> {
    pub(crate) msg: M,
    pub(crate) enqueued_at: Instant,
}

impl<M: Message> Envelope<M> {
    pub(crate) fn new(msg: M) -> Self {
        Self {
            msg,
            enqueued_at: Instant::now(),
        }
    }

    /// Time this message has spent queued
    pub(crate) fn queue_latency(&self) -> std::time::Duration {
        self.enqueued_at.elapsed()
    }
}
