//! Actor Registry
//!
//! Owns the actual actor cells and maps opaque ids to them. `ActorRef`s are
//! handles into this registry, never owning pointers, which is what keeps
//! actor reference cycles from pinning memory: when an actor terminates its
//! entry is removed and the cell is dropped, however many refs are still in
//! circulation.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::cell::ActorStatus;
use crate::config::StopPolicy;
use crate::supervision::{Failure, SupervisorDirective};

/// Process-unique actor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId {
    id: Uuid,
}

impl ActorId {
    pub(crate) fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    pub fn uuid(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.id.simple())
    }
}

/// Type-erased view of an actor cell, what the registry and the supervision
/// machinery operate on without knowing the message type.
pub(crate) trait CellHandle: Send + Sync {
    fn actor_id(&self) -> ActorId;
    fn status(&self) -> ActorStatus;

    /// Request graceful termination, draining or discarding per policy
    fn request_stop(&self, policy: StopPolicy);

    /// Replace the supervision directive applied to future failures
    fn set_directive(&self, directive: SupervisorDirective);

    /// Deliver an escalated failure to be resolved under this actor's own
    /// directive, inside its own exclusive task
    fn inject_failure(&self, failure: Failure);

    /// Immediate synchronous teardown for system shutdown: no lifecycle
    /// hooks, queued messages go to dead letters
    fn force_terminate(&self);

    fn note_child(&self, child: ActorId);
    fn forget_child(&self, child: ActorId);
}

/// Concurrent id → cell map
pub(crate) struct Registry {
    cells: DashMap<ActorId, Arc<dyn CellHandle>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }

    pub(crate) fn insert(&self, id: ActorId, cell: Arc<dyn CellHandle>) {
        self.cells.insert(id, cell);
    }

    pub(crate) fn get(&self, id: ActorId) -> Option<Arc<dyn CellHandle>> {
        self.cells.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn remove(&self, id: ActorId) -> Option<Arc<dyn CellHandle>> {
        self.cells.remove(&id).map(|(_, cell)| cell)
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    /// Snapshot of every live cell; taken before bulk operations so no
    /// map lock is held while acting on the cells
    pub(crate) fn handles(&self) -> Vec<Arc<dyn CellHandle>> {
        self.cells
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.cells.clear();
    }
}
