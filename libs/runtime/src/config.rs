//! System Configuration
//!
//! All runtime knobs live on an explicit [`SystemConfig`] value handed to
//! `ActorSystem::new`; there is no ambient configuration.

use crate::mailbox::MailboxPolicy;
use crate::supervision::RootReaction;

/// What happens to an actor's remaining mailbox when it is stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopPolicy {
    /// Route queued messages to the dead-letter sink (default)
    #[default]
    DiscardToDeadLetters,
    /// Process queued messages before terminating. Sends arriving after the
    /// drain finishes go to dead letters.
    DrainMailbox,
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct SystemConfig {
    /// System name, used for worker thread names and logs
    pub name: String,
    /// Worker threads in the scheduler pool; `None` uses available
    /// parallelism
    pub worker_threads: Option<usize>,
    /// Messages one scheduled task may process before yielding its worker.
    /// The fairness knob: lower values interleave actors more aggressively.
    pub throughput: usize,
    /// Mailbox policy for actors whose `Props` do not choose one
    pub default_mailbox: MailboxPolicy,
    /// Mailbox handling on stop
    pub stop_policy: StopPolicy,
    /// Reaction to failures escalated past the last supervisor
    pub root_reaction: RootReaction,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: "arbor".to_string(),
            worker_threads: None,
            throughput: 16,
            default_mailbox: MailboxPolicy::Unbounded,
            stop_policy: StopPolicy::DiscardToDeadLetters,
            root_reaction: RootReaction::LogAndContinue,
        }
    }
}

impl SystemConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_worker_threads(mut self, workers: usize) -> Self {
        self.worker_threads = Some(workers);
        self
    }

    pub fn with_throughput(mut self, throughput: usize) -> Self {
        self.throughput = throughput.max(1);
        self
    }

    pub fn with_default_mailbox(mut self, policy: MailboxPolicy) -> Self {
        self.default_mailbox = policy;
        self
    }

    pub fn with_stop_policy(mut self, policy: StopPolicy) -> Self {
        self.stop_policy = policy;
        self
    }

    pub fn with_root_reaction(mut self, reaction: RootReaction) -> Self {
        self.root_reaction = reaction;
        self
    }
}
