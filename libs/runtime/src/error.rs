//! Runtime Error Types
//!
//! Three disjoint error surfaces: behavior-level failures handled by
//! supervision (`ActorError`), backpressure reported to senders
//! (`SendError`), and system/spawn-time errors (`SpawnError`). Delivery
//! problems are never errors — they route to the dead-letter sink.

use thiserror::Error;

/// Result alias for behavior code.
pub type Result<T> = std::result::Result<T, ActorError>;

/// Error returned by an actor behavior.
///
/// Returning `Err` from `handle` or `on_start` counts as a failure of the
/// actor and is resolved by its supervision directive, exactly like a panic.
#[derive(Debug, Error)]
pub enum ActorError {
    /// Behavior-level failure with a plain message
    #[error("{message}")]
    Failure { message: String },

    /// Failure carrying an underlying error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ActorError {
    /// Build a failure from a plain message
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}

/// Error returned to a sender.
///
/// The only send error is backpressure from a bounded mailbox. Sends to a
/// terminated or unknown actor succeed from the sender's point of view and
/// surface on the dead-letter sink instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// Bounded mailbox is at capacity
    #[error("mailbox full: {depth} messages (capacity {capacity})")]
    MailboxFull { depth: usize, capacity: usize },
}

/// Errors raised while creating systems or spawning actors
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("actor system is shut down")]
    SystemShutdown,

    #[error("failed to start scheduler worker pool")]
    Scheduler(#[from] std::io::Error),
}
