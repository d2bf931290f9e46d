//! Actor Behavior Model
//!
//! An actor is a behavior object plus the private state it owns — the
//! struct implementing [`ActorBehavior`] *is* the state, and the runtime
//! only ever borrows it mutably inside the actor's own exclusive task, so
//! no alias to it exists anywhere else by construction.
//!
//! Messages are handled run-to-completion: one message is fully processed
//! before the next is dequeued, though the handler may await asynchronous
//! operations internally (the worker thread is released while it waits).
//! Effects — sends, child spawns, behavior swaps, self-stop, delayed
//! self-messages — flow through the [`Context`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, SpawnError};
use crate::mailbox::MailboxPolicy;
use crate::message::Message;
use crate::registry::ActorId;
use crate::supervision::{RestartPolicy, SupervisorDirective};
use crate::system::{ActorRef, ActorSystem};

/// Behavior of one actor type over its closed message enum.
///
/// Matching the message exhaustively inside `handle` makes unhandled
/// variants a compile-time error.
#[async_trait]
pub trait ActorBehavior: Send + 'static {
    type Message: Message;

    /// Handle one message. An `Err` counts as a failure of this actor and
    /// is resolved by its supervision directive.
    async fn handle(
        &mut self,
        msg: Self::Message,
        ctx: &mut Context<Self::Message>,
    ) -> Result<()>;

    /// Called before the first message, and again after each restart
    async fn on_start(&mut self, _ctx: &mut Context<Self::Message>) -> Result<()> {
        Ok(())
    }

    /// Called on graceful termination only. After a failure the state is
    /// not trusted and this hook is skipped.
    async fn on_stop(&mut self, _ctx: &mut Context<Self::Message>) {}
}

/// Spawnable recipe for an actor: behavior factory plus per-actor policies.
///
/// The factory is what makes `Restart` possible — a restarted actor is
/// rebuilt from it with fresh state.
pub struct Props<M: Message> {
    factory: Arc<dyn Fn() -> Box<dyn ActorBehavior<Message = M>> + Send + Sync>,
    pub(crate) mailbox: Option<MailboxPolicy>,
    pub(crate) directive: SupervisorDirective,
    pub(crate) restart: RestartPolicy,
}

impl<M: Message> Props<M> {
    pub fn new<A, F>(factory: F) -> Self
    where
        A: ActorBehavior<Message = M>,
        F: Fn() -> A + Send + Sync + 'static,
    {
        let factory: Arc<dyn Fn() -> Box<dyn ActorBehavior<Message = M>> + Send + Sync> =
            Arc::new(move || Box::new(factory()));
        Self {
            factory,
            mailbox: None,
            directive: SupervisorDirective::default(),
            restart: RestartPolicy::default(),
        }
    }

    /// Override the system's default mailbox policy for this actor
    pub fn with_mailbox(mut self, policy: MailboxPolicy) -> Self {
        self.mailbox = Some(policy);
        self
    }

    /// Directive applied when this actor fails
    pub fn with_supervision(mut self, directive: SupervisorDirective) -> Self {
        self.directive = directive;
        self
    }

    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart = policy;
        self
    }

    pub(crate) fn build(&self) -> Box<dyn ActorBehavior<Message = M>> {
        (self.factory)()
    }
}

impl<M: Message> Clone for Props<M> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            mailbox: self.mailbox,
            directive: self.directive,
            restart: self.restart,
        }
    }
}

/// Capabilities handed to a behavior while it processes a message
pub struct Context<M: Message> {
    system: ActorSystem,
    self_ref: ActorRef<M>,
    parent: Option<ActorId>,
    next_behavior: Option<Box<dyn ActorBehavior<Message = M>>>,
    stop_requested: bool,
}

impl<M: Message> Context<M> {
    pub(crate) fn new(system: ActorSystem, self_ref: ActorRef<M>, parent: Option<ActorId>) -> Self {
        Self {
            system,
            self_ref,
            parent,
            next_behavior: None,
            stop_requested: false,
        }
    }

    pub fn actor_id(&self) -> ActorId {
        self.self_ref.id()
    }

    /// Reference to this actor, safe to embed in outgoing messages
    pub fn self_ref(&self) -> &ActorRef<M> {
        &self.self_ref
    }

    pub fn system(&self) -> &ActorSystem {
        &self.system
    }

    pub fn parent(&self) -> Option<ActorId> {
        self.parent
    }

    /// Spawn a child supervised by this actor
    pub fn spawn_child<N: Message>(&self, props: Props<N>) -> std::result::Result<ActorRef<N>, SpawnError> {
        self.system.spawn_with_parent(props, Some(self.actor_id()))
    }

    /// Swap the behavior processed from the next message on. The current
    /// message still finishes under the old behavior.
    pub fn become_next<A>(&mut self, behavior: A)
    where
        A: ActorBehavior<Message = M>,
    {
        self.next_behavior = Some(Box::new(behavior));
    }

    /// Stop this actor after the current message
    pub fn stop_self(&mut self) {
        self.stop_requested = true;
    }

    /// Deliver `msg` to this actor after `delay`.
    ///
    /// This is the runtime's timeout primitive: a timeout is always a
    /// scheduled message, never a thread interruption. If the actor is gone
    /// when the delay fires, the message lands in the dead-letter sink.
    pub fn notify_after(&self, delay: Duration, msg: M) {
        let target = self.self_ref.clone();
        self.system.schedule_send(delay, target, msg);
    }

    pub(crate) fn take_next_behavior(&mut self) -> Option<Box<dyn ActorBehavior<Message = M>>> {
        self.next_behavior.take()
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop_requested
    }
}
