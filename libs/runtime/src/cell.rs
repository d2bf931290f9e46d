//! Actor Execution Cell
//!
//! The cell is the runtime's per-actor bookkeeping unit: it binds the
//! mailbox, the dispatch state machine, the behavior slot, and the
//! supervision links. Every message an actor ever processes runs inside a
//! task owned by its cell, and the dispatch state machine guarantees at
//! most one such task exists at any instant — which is the whole
//! single-threaded-illusion: the behavior is taken out of its slot at batch
//! entry and put back at batch exit, so no second borrow can exist.
//!
//! Failure handling happens here too. A panic or an `Err` from the behavior
//! is caught at the behavior boundary, turned into a failure record, and
//! resolved under the actor's directive without ever unwinding into
//! another actor or a worker thread.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::sync::Weak;
use std::time::Instant;

use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::actor::{ActorBehavior, Context, Props};
use crate::config::StopPolicy;
use crate::dead_letter::{DeadLetter, DeadLetterReason};
use crate::dispatch::DispatchState;
use crate::error::SendError;
use crate::mailbox::{Mailbox, PushError};
use crate::message::{Message, Priority};
use crate::registry::{ActorId, CellHandle};
use crate::supervision::{
    panic_message, Failure, FailureReason, RestartTracker, RootReaction, SupervisorDirective,
};
use crate::system::{ActorRef, ActorSystem};

/// Externally observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActorStatus {
    Starting = 0,
    Running = 1,
    Stopping = 2,
    Restarting = 3,
    Stopped = 4,
    Failed = 5,
}

impl ActorStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ActorStatus::Starting,
            1 => ActorStatus::Running,
            2 => ActorStatus::Stopping,
            3 => ActorStatus::Restarting,
            4 => ActorStatus::Stopped,
            _ => ActorStatus::Failed,
        }
    }
}

/// How a batch ends
enum BatchExit {
    /// Behavior goes back in the slot; resubmit if work is pending
    Continue,
    /// Actor terminates. `graceful` controls whether `on_stop` ran and how
    /// drained messages are labeled.
    Stop { graceful: bool },
}

pub(crate) struct ActorCell<M: Message> {
    id: ActorId,
    parent: Option<ActorId>,
    system: ActorSystem,
    props: Props<M>,

    mailbox: Mailbox<M>,
    dispatch: DispatchState,
    /// Occupied except while the actor's exclusive task is running
    behavior: Mutex<Option<Box<dyn ActorBehavior<Message = M>>>>,

    directive: Mutex<SupervisorDirective>,
    restarts: RestartTracker,
    pending_failure: Mutex<Option<Failure>>,

    status: AtomicU8,
    started: AtomicBool,
    stop_mode: Mutex<Option<StopPolicy>>,
    terminated: AtomicBool,
    children: Mutex<Vec<ActorId>>,

    throughput: usize,
    self_weak: Weak<ActorCell<M>>,
}

impl<M: Message> ActorCell<M> {
    pub(crate) fn new(
        id: ActorId,
        system: ActorSystem,
        parent: Option<ActorId>,
        props: Props<M>,
    ) -> Arc<Self> {
        let mailbox_policy = props.mailbox.unwrap_or(system.config().default_mailbox);
        let throughput = system.config().throughput.max(1);
        let behavior = props.build();
        let directive = props.directive;
        let restart_policy = props.restart;

        Arc::new_cyclic(|weak| Self {
            id,
            parent,
            system,
            props,
            mailbox: Mailbox::new(mailbox_policy),
            dispatch: DispatchState::new(),
            behavior: Mutex::new(Some(behavior)),
            directive: Mutex::new(directive),
            restarts: RestartTracker::new(restart_policy),
            pending_failure: Mutex::new(None),
            status: AtomicU8::new(ActorStatus::Starting as u8),
            started: AtomicBool::new(false),
            stop_mode: Mutex::new(None),
            terminated: AtomicBool::new(false),
            children: Mutex::new(Vec::new()),
            throughput,
            self_weak: weak.clone(),
        })
    }

    pub(crate) fn actor_ref(&self) -> ActorRef<M> {
        ActorRef::new(
            self.id,
            self.self_weak.clone(),
            self.system.dead_letters().clone(),
        )
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Enqueue a message and wake the dispatcher.
    ///
    /// Never blocks. Dead-letter routing is a successful send from the
    /// sender's point of view; only bounded-mailbox backpressure is an
    /// error.
    pub(crate) fn enqueue(&self, msg: M, priority: Priority) -> Result<(), SendError> {
        if self.is_terminated() {
            self.system.dead_letters().publish(DeadLetter::new(
                self.id,
                msg,
                DeadLetterReason::Terminated,
            ));
            return Ok(());
        }

        match self.mailbox.push(msg, priority) {
            Ok(()) => {
                if self.is_terminated() {
                    // Lost the race against termination; sweep the queue so
                    // the message surfaces instead of stranding.
                    self.mailbox.drain_to(
                        self.system.dead_letters(),
                        self.id,
                        DeadLetterReason::Terminated,
                    );
                } else {
                    self.schedule();
                }
                Ok(())
            }
            Err(PushError::Full {
                msg: _,
                depth,
                capacity,
            }) => {
                self.system.metrics().record_mailbox_full();
                Err(SendError::MailboxFull { depth, capacity })
            }
            Err(PushError::Closed(msg)) => {
                self.system.dead_letters().publish(DeadLetter::new(
                    self.id,
                    msg,
                    DeadLetterReason::MailboxClosed,
                ));
                Ok(())
            }
        }
    }

    /// Submit a task if the actor is idle. Exactly one submission wins under
    /// concurrent sends.
    pub(crate) fn schedule(&self) {
        if self.is_terminated() {
            return;
        }
        if self.dispatch.try_schedule() {
            self.submit();
        }
    }

    fn submit(&self) {
        match self.self_weak.upgrade() {
            Some(cell) => self.system.scheduler().execute(cell.run_batch()),
            None => self.dispatch.yield_to_idle(),
        }
    }

    fn load_status(&self) -> ActorStatus {
        ActorStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn set_status(&self, status: ActorStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    fn stop_policy_requested(&self) -> Option<StopPolicy> {
        *self.stop_mode.lock()
    }

    fn has_pending_work(&self) -> bool {
        !self.mailbox.is_empty()
            || self.pending_failure.lock().is_some()
            || self.stop_mode.lock().is_some()
    }

    /// One scheduled task: process up to `throughput` messages, then yield.
    pub(crate) async fn run_batch(self: Arc<Self>) {
        self.dispatch.enter_running();

        if self.is_terminated() {
            self.dispatch.yield_to_idle();
            return;
        }

        let mut behavior = match self.behavior.lock().take() {
            Some(behavior) => behavior,
            // Slot empty: a concurrent force-terminate took the cell down
            None => {
                self.dispatch.yield_to_idle();
                return;
            }
        };

        let mut ctx = Context::new(self.system.clone(), self.actor_ref(), self.parent);
        let mut processed = 0usize;
        let mut exit = BatchExit::Continue;

        let discard_requested = matches!(
            self.stop_policy_requested(),
            Some(StopPolicy::DiscardToDeadLetters)
        );
        if !self.started.load(Ordering::Acquire) && !discard_requested {
            exit = self.start_behavior(&mut behavior, &mut ctx).await;
        }

        while matches!(exit, BatchExit::Continue) {
            if self.is_terminated() {
                // Someone force-terminated us mid-batch; bookkeeping is done.
                drop(behavior);
                self.dispatch.yield_to_idle();
                return;
            }

            let pending = self.pending_failure.lock().take();
            if let Some(failure) = pending {
                exit = self
                    .handle_failure(failure.reason, &mut behavior, &mut ctx)
                    .await;
                continue;
            }

            let stop = self.stop_policy_requested();
            if matches!(stop, Some(StopPolicy::DiscardToDeadLetters)) {
                exit = BatchExit::Stop { graceful: true };
                break;
            }

            if processed >= self.throughput {
                // Fairness: yield the worker, a successor task continues
                break;
            }

            let envelope = match self.mailbox.pop() {
                Some(envelope) => envelope,
                None => {
                    if stop.is_some() {
                        // Drain complete
                        exit = BatchExit::Stop { graceful: true };
                    }
                    break;
                }
            };

            let queued_for = envelope.queue_latency();
            let started_at = Instant::now();
            let result = AssertUnwindSafe(behavior.handle(envelope.msg, &mut ctx))
                .catch_unwind()
                .await;
            processed += 1;

            match result {
                Ok(Ok(())) => {
                    self.system
                        .metrics()
                        .record_message_handled(started_at.elapsed());
                    self.system.metrics().record_queue_wait(queued_for);
                    if let Some(next) = ctx.take_next_behavior() {
                        debug!(actor_id = %self.id, "Behavior swapped");
                        behavior = next;
                    }
                    if ctx.stop_requested() {
                        exit = BatchExit::Stop { graceful: true };
                    }
                }
                Ok(Err(err)) => {
                    exit = self
                        .handle_failure(FailureReason::Error(err), &mut behavior, &mut ctx)
                        .await;
                }
                Err(payload) => {
                    exit = self
                        .handle_failure(
                            FailureReason::Panic(panic_message(payload)),
                            &mut behavior,
                            &mut ctx,
                        )
                        .await;
                }
            }
        }

        match exit {
            BatchExit::Stop { graceful } => {
                if graceful && self.started.load(Ordering::Acquire) && !self.is_terminated() {
                    let _ = AssertUnwindSafe(behavior.on_stop(&mut ctx)).catch_unwind().await;
                }
                drop(behavior);
                let status = if graceful {
                    ActorStatus::Stopped
                } else {
                    ActorStatus::Failed
                };
                self.finalize(status);
                self.dispatch.yield_to_idle();
            }
            BatchExit::Continue => {
                if self.is_terminated() {
                    drop(behavior);
                    self.dispatch.yield_to_idle();
                    return;
                }
                *self.behavior.lock() = Some(behavior);
                if self.has_pending_work() {
                    self.dispatch.yield_to_scheduled();
                    self.submit();
                } else {
                    self.dispatch.yield_to_idle();
                    // Re-check: a send may have slipped in between the
                    // emptiness check and the store above.
                    if self.has_pending_work() {
                        self.schedule();
                    }
                }
            }
        }
    }

    async fn start_behavior(
        &self,
        behavior: &mut Box<dyn ActorBehavior<Message = M>>,
        ctx: &mut Context<M>,
    ) -> BatchExit {
        self.set_status(ActorStatus::Starting);
        let result = AssertUnwindSafe(behavior.on_start(ctx)).catch_unwind().await;
        match result {
            Ok(Ok(())) => {
                self.started.store(true, Ordering::Release);
                self.set_status(ActorStatus::Running);
                debug!(actor_id = %self.id, "Actor started");
                BatchExit::Continue
            }
            Ok(Err(err)) => {
                self.handle_failure(FailureReason::Error(err), behavior, ctx)
                    .await
            }
            Err(payload) => {
                self.handle_failure(FailureReason::Panic(panic_message(payload)), behavior, ctx)
                    .await
            }
        }
    }

    /// Resolve a failure under this actor's directive
    async fn handle_failure(
        &self,
        reason: FailureReason,
        behavior: &mut Box<dyn ActorBehavior<Message = M>>,
        ctx: &mut Context<M>,
    ) -> BatchExit {
        let directive = *self.directive.lock();
        error!(
            actor_id = %self.id,
            directive = ?directive,
            error = %reason,
            "Actor failure"
        );

        match directive {
            SupervisorDirective::Resume => {
                warn!(actor_id = %self.id, "Resuming actor with last-known state");
                BatchExit::Continue
            }
            SupervisorDirective::Restart => {
                if self.restarts.should_restart() {
                    self.restart_behavior(behavior, ctx).await
                } else {
                    self.system.metrics().record_actor_restart(false);
                    warn!(
                        actor_id = %self.id,
                        restarts = self.restarts.restarts_in_window(),
                        "Restart budget exhausted, escalating"
                    );
                    self.escalate(reason);
                    BatchExit::Stop { graceful: false }
                }
            }
            SupervisorDirective::Stop => BatchExit::Stop { graceful: false },
            SupervisorDirective::Escalate => {
                self.escalate(reason);
                BatchExit::Stop { graceful: false }
            }
        }
    }

    /// Rebuild the behavior from its factory. Queued messages survive; the
    /// failing message was consumed and is not retried.
    async fn restart_behavior(
        &self,
        behavior: &mut Box<dyn ActorBehavior<Message = M>>,
        ctx: &mut Context<M>,
    ) -> BatchExit {
        self.set_status(ActorStatus::Restarting);
        *behavior = self.props.build();

        let result = AssertUnwindSafe(behavior.on_start(ctx)).catch_unwind().await;
        match result {
            Ok(Ok(())) => {
                self.started.store(true, Ordering::Release);
                self.set_status(ActorStatus::Running);
                self.system.metrics().record_actor_restart(true);
                info!(
                    actor_id = %self.id,
                    restarts = self.restarts.restarts_in_window(),
                    "Actor restarted with fresh state"
                );
                BatchExit::Continue
            }
            Ok(Err(err)) => {
                self.system.metrics().record_actor_restart(false);
                self.escalate(FailureReason::Error(err));
                BatchExit::Stop { graceful: false }
            }
            Err(payload) => {
                self.system.metrics().record_actor_restart(false);
                self.escalate(FailureReason::Panic(panic_message(payload)));
                BatchExit::Stop { graceful: false }
            }
        }
    }

    /// Hand the failure to the parent supervisor, or to the system root
    fn escalate(&self, reason: FailureReason) {
        if let Some(parent_id) = self.parent {
            if let Some(parent) = self.system.registry().get(parent_id) {
                parent.inject_failure(Failure {
                    actor: parent_id,
                    reason: FailureReason::Escalated {
                        child: self.id,
                        reason: Box::new(reason),
                    },
                });
                return;
            }
        }
        self.apply_root_reaction(reason);
    }

    fn apply_root_reaction(&self, reason: FailureReason) {
        match self.system.config().root_reaction {
            RootReaction::LogAndContinue => {
                error!(
                    actor_id = %self.id,
                    error = %reason,
                    "Failure escalated to system root"
                );
            }
            RootReaction::CrashProcess => {
                error!(
                    actor_id = %self.id,
                    error = %reason,
                    "Failure escalated to system root, aborting process"
                );
                std::process::abort();
            }
        }
    }

    /// Remove the actor from the world. Idempotent; safe from any thread.
    fn finalize(&self, status: ActorStatus) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        self.set_status(status);
        self.mailbox.close();
        let reason = if status == ActorStatus::Failed {
            DeadLetterReason::Terminated
        } else {
            DeadLetterReason::Discarded
        };
        self.mailbox
            .drain_to(self.system.dead_letters(), self.id, reason);

        // The subtree does not outlive its supervisor
        let children: Vec<ActorId> = std::mem::take(&mut *self.children.lock());
        for child in children {
            if let Some(cell) = self.system.registry().get(child) {
                cell.request_stop(StopPolicy::DiscardToDeadLetters);
            }
        }

        if let Some(parent_id) = self.parent {
            if let Some(parent) = self.system.registry().get(parent_id) {
                parent.forget_child(self.id);
            }
        }

        self.system.registry().remove(self.id);
        self.system
            .metrics()
            .actors_stopped
            .fetch_add(1, Ordering::Relaxed);
        info!(actor_id = %self.id, status = ?self.load_status(), "Actor terminated");
    }
}

impl<M: Message> CellHandle for ActorCell<M> {
    fn actor_id(&self) -> ActorId {
        self.id
    }

    fn status(&self) -> ActorStatus {
        self.load_status()
    }

    fn request_stop(&self, policy: StopPolicy) {
        if self.is_terminated() {
            return;
        }
        {
            let mut mode = self.stop_mode.lock();
            // First stop request wins; a later discard cannot upgrade a drain
            if mode.is_none() {
                *mode = Some(policy);
            }
        }
        self.set_status(ActorStatus::Stopping);
        self.schedule();
    }

    fn set_directive(&self, directive: SupervisorDirective) {
        *self.directive.lock() = directive;
    }

    fn inject_failure(&self, failure: Failure) {
        if self.is_terminated() {
            return;
        }
        *self.pending_failure.lock() = Some(failure);
        self.schedule();
    }

    fn force_terminate(&self) {
        self.finalize(ActorStatus::Stopped);
    }

    fn note_child(&self, child: ActorId) {
        self.children.lock().push(child);
    }

    fn forget_child(&self, child: ActorId) {
        self.children.lock().retain(|c| *c != child);
    }
}
