//! Actor System Core
//!
//! Process-wide root managing actor creation, addressing, and shutdown.
//! `ActorSystem` is a cheap cloneable handle; clones share one core. It is
//! the only process-wide object in the runtime — its lifecycle is an
//! explicit `new`/`shutdown` pair, never ambient global state.
//!
//! The core owns the registry, and the registry owns the actor cells, so a
//! system that has spawned actors stays alive until `shutdown()` clears
//! them. Call it when done.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::actor::Props;
use crate::cell::{ActorCell, ActorStatus};
use crate::config::SystemConfig;
use crate::dead_letter::{DeadLetter, DeadLetterReason, DeadLetterSink};
use crate::error::{SendError, SpawnError};
use crate::message::{Message, Priority};
use crate::metrics::SystemMetrics;
use crate::registry::{ActorId, CellHandle, Registry};
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::supervision::SupervisorDirective;

struct SystemCore {
    system_id: String,
    config: SystemConfig,
    scheduler: Scheduler,
    registry: Registry,
    sink: DeadLetterSink,
    metrics: SystemMetrics,
    shutdown: AtomicBool,
}

/// Handle to a running actor system
#[derive(Clone)]
pub struct ActorSystem {
    core: Arc<SystemCore>,
}

impl ActorSystem {
    /// Start a system with default configuration
    pub fn new() -> Result<Self, SpawnError> {
        Self::with_config(SystemConfig::default())
    }

    pub fn with_config(config: SystemConfig) -> Result<Self, SpawnError> {
        let scheduler = Scheduler::new(SchedulerConfig {
            worker_threads: config.worker_threads,
            thread_name: config.name.clone(),
        })?;
        let system_id = format!("{}-{}", config.name, Uuid::new_v4().simple());

        info!(
            system_id = %system_id,
            workers = scheduler.worker_count(),
            "Actor system started"
        );

        Ok(Self {
            core: Arc::new(SystemCore {
                system_id,
                config,
                scheduler,
                registry: Registry::new(),
                sink: DeadLetterSink::new(),
                metrics: SystemMetrics::default(),
                shutdown: AtomicBool::new(false),
            }),
        })
    }

    /// Spawn a top-level actor supervised by the system root.
    ///
    /// Returns immediately; the actor's first task (which runs `on_start`)
    /// is scheduled, never awaited.
    pub fn spawn<M: Message>(&self, props: Props<M>) -> Result<ActorRef<M>, SpawnError> {
        self.spawn_with_parent(props, None)
    }

    pub(crate) fn spawn_with_parent<M: Message>(
        &self,
        props: Props<M>,
        parent: Option<ActorId>,
    ) -> Result<ActorRef<M>, SpawnError> {
        if self.is_shutdown() {
            return Err(SpawnError::SystemShutdown);
        }

        let id = ActorId::new();
        let cell = ActorCell::new(id, self.clone(), parent, props);
        let handle: Arc<dyn CellHandle> = cell.clone();
        self.core.registry.insert(id, handle);

        if let Some(parent_id) = parent {
            if let Some(parent_cell) = self.core.registry.get(parent_id) {
                parent_cell.note_child(id);
            }
        }

        self.core
            .metrics
            .actors_spawned
            .fetch_add(1, Ordering::Relaxed);
        debug!(
            actor_id = %id,
            system_id = %self.core.system_id,
            parent_id = ?parent.map(|p| p.to_string()),
            "Actor spawned"
        );

        cell.schedule();
        Ok(cell.actor_ref())
    }

    /// Request graceful termination of an actor. The remaining mailbox is
    /// drained or discarded per the configured [`crate::StopPolicy`]; a
    /// message the actor is currently processing always completes first.
    pub fn stop<M: Message>(&self, actor_ref: &ActorRef<M>) {
        self.stop_id(actor_ref.id());
    }

    pub fn stop_id(&self, id: ActorId) {
        match self.core.registry.get(id) {
            Some(cell) => cell.request_stop(self.core.config.stop_policy),
            None => debug!(actor_id = %id, "Stop requested for unknown or terminated actor"),
        }
    }

    /// Replace the supervision directive applied to an actor's future
    /// failures
    pub fn set_supervisor_policy<M: Message>(
        &self,
        actor_ref: &ActorRef<M>,
        directive: SupervisorDirective,
    ) {
        match self.core.registry.get(actor_ref.id()) {
            Some(cell) => cell.set_directive(directive),
            None => warn!(
                actor_id = %actor_ref.id(),
                "Supervision policy change for unknown or terminated actor"
            ),
        }
    }

    /// Stop every actor and the worker pool. Idempotent and safe to call
    /// from any thread. Queued messages surface on the dead-letter sink;
    /// lifecycle hooks are skipped, like an abort at process teardown.
    pub fn shutdown(&self) {
        if self.core.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(system_id = %self.core.system_id, "Shutting down actor system");

        for handle in self.core.registry.handles() {
            handle.force_terminate();
        }
        self.core.registry.clear();
        self.core.scheduler.shutdown();

        info!(
            system_id = %self.core.system_id,
            stats = ?self.core.metrics.snapshot(),
            "Actor system shutdown complete"
        );
    }

    pub fn is_shutdown(&self) -> bool {
        self.core.shutdown.load(Ordering::Acquire)
    }

    /// Live actors in the registry
    pub fn actor_count(&self) -> usize {
        self.core.registry.len()
    }

    /// Lifecycle state of an actor, `None` once its bookkeeping is gone
    pub fn status<M: Message>(&self, actor_ref: &ActorRef<M>) -> Option<ActorStatus> {
        self.core.registry.get(actor_ref.id()).map(|c| c.status())
    }

    /// Observable sink of undeliverable messages
    pub fn dead_letters(&self) -> &DeadLetterSink {
        &self.core.sink
    }

    pub fn metrics(&self) -> &SystemMetrics {
        &self.core.metrics
    }

    pub fn config(&self) -> &SystemConfig {
        &self.core.config
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.core.scheduler
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.core.registry
    }

    pub(crate) fn schedule_send<M: Message>(&self, delay: Duration, target: ActorRef<M>, msg: M) {
        self.core.scheduler.schedule_once(delay, async move {
            let _ = target.send(msg);
        });
    }
}

impl std::fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorSystem")
            .field("system_id", &self.core.system_id)
            .field("actors", &self.core.registry.len())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

/// Opaque handle for sending messages to one actor.
///
/// Copyable, comparable by identity, and decoupled from the actor's memory:
/// the registry owns the cell, a ref only holds a weak handle. A ref
/// outliving its actor stays safe — sends route to the dead-letter sink.
pub struct ActorRef<M: Message> {
    id: ActorId,
    cell: Weak<ActorCell<M>>,
    sink: DeadLetterSink,
}

impl<M: Message> ActorRef<M> {
    pub(crate) fn new(id: ActorId, cell: Weak<ActorCell<M>>, sink: DeadLetterSink) -> Self {
        Self { id, cell, sink }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Fire-and-forget send. Never blocks, never waits for a reply.
    ///
    /// `Ok` means the message was enqueued *or* routed to the dead-letter
    /// sink; the only error is backpressure from a bounded mailbox.
    pub fn send(&self, msg: M) -> Result<(), SendError> {
        self.send_with_priority(msg, Priority::Normal)
    }

    pub fn send_with_priority(&self, msg: M, priority: Priority) -> Result<(), SendError> {
        match self.cell.upgrade() {
            Some(cell) => cell.enqueue(msg, priority),
            None => {
                self.sink.publish(DeadLetter::new(
                    self.id,
                    msg,
                    DeadLetterReason::Terminated,
                ));
                Ok(())
            }
        }
    }

    /// Whether the target can still process messages
    pub fn is_alive(&self) -> bool {
        self.cell
            .upgrade()
            .map(|cell| !cell.is_terminated())
            .unwrap_or(false)
    }
}

impl<M: Message> Clone for ActorRef<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            cell: self.cell.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<M: Message> PartialEq for ActorRef<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<M: Message> Eq for ActorRef<M> {}

impl<M: Message> std::hash::Hash for ActorRef<M> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<M: Message> std::fmt::Debug for ActorRef<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorRef").field("id", &self.id).finish()
    }
}
