//! Arbor Actor Runtime
//!
//! Single-process actor runtime: state-isolated actors communicating only
//! through asynchronous, ordered message passing, scheduled cooperatively
//! on a bounded work-stealing worker pool.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐      ┌───────────────────────────┐
//! │       ActorSystem        │      │         Scheduler         │
//! │                          │      │                           │
//! │  Registry ─▶ ActorCell   │      │  worker ─▶ [local queue]  │
//! │              ├ Mailbox ──┼──────┼▶ worker ─▶ [local queue]  │
//! │              ├ Dispatch  │ task │  worker ─▶ [local queue]  │
//! │              └ Behavior  │      │       ▲ steal ▲           │
//! │                          │      │                           │
//! │  DeadLetterSink          │      │  timers (notify_after)    │
//! └──────────────────────────┘      └───────────────────────────┘
//! ```
//!
//! `send` enqueues onto the target's mailbox and, if the actor is idle,
//! submits one task to the scheduler. The task drains a bounded batch of
//! messages through the behavior, then reschedules itself or returns the
//! actor to idle. The dispatch state machine makes the idle/scheduled
//! transition atomic, so at most one task per actor ever runs — each actor
//! is a single-threaded island, however many workers the pool has.
//!
//! # Guarantees
//!
//! - FIFO delivery per sender→receiver pair (cross-sender order unspecified)
//! - at most one in-flight execution per actor
//! - failures stay inside the supervision tree: a panicking behavior is
//!   caught at the actor boundary and resolved by its directive
//!   (stop / restart / resume / escalate), siblings never notice
//! - sends to terminated actors surface on the dead-letter sink, never as
//!   sender-side errors; bounded-mailbox backpressure is the one send error
//!
//! # Example
//!
//! ```rust
//! use arbor_runtime::{ActorBehavior, ActorSystem, Context, Props, Result};
//! use async_trait::async_trait;
//!
//! enum CounterMsg {
//!     Increment,
//!     GetValue { reply: crossbeam_channel::Sender<u64> },
//! }
//!
//! struct Counter { value: u64 }
//!
//! #[async_trait]
//! impl ActorBehavior for Counter {
//!     type Message = CounterMsg;
//!
//!     async fn handle(&mut self, msg: CounterMsg, _ctx: &mut Context<CounterMsg>) -> Result<()> {
//!         match msg {
//!             CounterMsg::Increment => self.value += 1,
//!             CounterMsg::GetValue { reply } => { let _ = reply.send(self.value); }
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let system = ActorSystem::new()?;
//! let counter = system.spawn(Props::new(|| Counter { value: 0 }))?;
//!
//! counter.send(CounterMsg::Increment)?;
//! let (reply, rx) = crossbeam_channel::bounded(1);
//! counter.send(CounterMsg::GetValue { reply })?;
//! assert_eq!(rx.recv_timeout(std::time::Duration::from_secs(5))?, 1);
//!
//! system.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod cell;
pub mod config;
pub mod dead_letter;
pub mod error;
pub mod mailbox;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod supervision;
pub mod system;

mod dispatch;
mod scheduler;

pub use actor::{ActorBehavior, Context, Props};
pub use cell::ActorStatus;
pub use config::{StopPolicy, SystemConfig};
pub use dead_letter::{DeadLetter, DeadLetterReason, DeadLetterSink};
pub use error::{ActorError, Result, SendError, SpawnError};
pub use mailbox::MailboxPolicy;
pub use message::{Message, Priority};
pub use metrics::{SystemMetrics, SystemStats};
pub use registry::ActorId;
pub use supervision::{
    Failure, FailureReason, RestartPolicy, RootReaction, SupervisorDirective,
};
pub use system::{ActorRef, ActorSystem};
