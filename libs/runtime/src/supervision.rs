//! Supervision
//!
//! Every actor has exactly one supervisor: its parent, or the system root
//! for top-level actors. A failure inside a behavior — an `Err` from
//! `handle`/`on_start` or a caught panic — never crosses actor boundaries on
//! its own; it is resolved by the failing actor's directive, escalating up
//! the tree when asked to.

use std::any::Any;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;

use crate::error::ActorError;
use crate::registry::ActorId;

/// How a supervisor reacts to a child failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorDirective {
    /// Terminate the actor, do not restart (default).
    #[default]
    Stop,
    /// Recreate the actor from its factory with fresh state. Queued messages
    /// survive; the failing message does not.
    Restart,
    /// Keep the current state and continue with the next message. Only safe
    /// when the actor's invariants survive a mid-message abort — prefer
    /// `Stop` or `Restart` unless that is proven.
    Resume,
    /// Terminate the actor and re-apply the failure at its supervisor.
    Escalate,
}

/// Restart budget: at most `max_restarts` within `window`, then the failure
/// escalates instead. Prevents restart storms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub max_restarts: u32,
    pub window: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        // Allow 5 restarts per minute for production resilience
        Self {
            max_restarts: 5,
            window: Duration::from_secs(60),
        }
    }
}

/// Sliding-window restart counter for one actor
#[derive(Debug)]
pub(crate) struct RestartTracker {
    policy: RestartPolicy,
    count: AtomicU32,
    window_start: Mutex<Option<Instant>>,
}

impl RestartTracker {
    pub(crate) fn new(policy: RestartPolicy) -> Self {
        Self {
            policy,
            count: AtomicU32::new(0),
            window_start: Mutex::new(None),
        }
    }

    /// Check whether another restart fits the budget, counting this attempt
    pub(crate) fn should_restart(&self) -> bool {
        let now = Instant::now();
        let mut window_start = self.window_start.lock();

        match *window_start {
            None => {
                *window_start = Some(now);
                self.count.store(1, Ordering::Relaxed);
                self.policy.max_restarts > 0
            }
            Some(start) => {
                if now.duration_since(start) > self.policy.window {
                    *window_start = Some(now);
                    self.count.store(1, Ordering::Relaxed);
                    self.policy.max_restarts > 0
                } else {
                    let count = self.count.fetch_add(1, Ordering::Relaxed) + 1;
                    count <= self.policy.max_restarts
                }
            }
        }
    }

    pub(crate) fn restarts_in_window(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Why an actor failed
#[derive(Debug, Error)]
pub enum FailureReason {
    #[error("panic: {0}")]
    Panic(String),

    #[error("behavior error: {0}")]
    Error(ActorError),

    #[error("escalated from {child}: {reason}")]
    Escalated {
        child: ActorId,
        #[source]
        reason: Box<FailureReason>,
    },
}

/// Structured failure notification delivered to a supervisor
#[derive(Debug)]
pub struct Failure {
    pub actor: ActorId,
    pub reason: FailureReason,
}

/// What the system root does with a failure escalated all the way up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootReaction {
    /// Log the failure and keep the rest of the system running (default)
    #[default]
    LogAndContinue,
    /// Abort the process
    CrashProcess,
}

/// Extract a printable message from a caught panic payload
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    }
}
