//! Dispatch State Machine
//!
//! Bridges mailbox state to the scheduler while keeping the runtime's core
//! invariant: at most one task per actor is ever scheduled or running.
//!
//! States: `Idle -> Scheduled -> Running -> (Idle | Scheduled)`.
//!
//! The only entry point into `Scheduled` is the `Idle -> Scheduled` CAS in
//! [`DispatchState::try_schedule`], so concurrent senders can race freely —
//! exactly one of them wins the right to submit a task. The task itself
//! performs the remaining transitions. After `Running -> Idle` the caller
//! must re-check the mailbox and try to schedule again; a send that enqueued
//! between the emptiness check and the store would otherwise be lost.

use std::sync::atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const SCHEDULED: u8 = 1;
const RUNNING: u8 = 2;

/// Per-actor scheduling state
#[derive(Debug)]
pub(crate) struct DispatchState {
    state: AtomicU8,
}

impl DispatchState {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    /// Claim the right to submit one task. Returns `true` for exactly one
    /// caller while the actor is idle.
    pub(crate) fn try_schedule(&self) -> bool {
        self.state
            .compare_exchange(IDLE, SCHEDULED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Called by the task on entry
    pub(crate) fn enter_running(&self) {
        let prev = self.state.swap(RUNNING, Ordering::AcqRel);
        debug_assert_eq!(prev, SCHEDULED, "task ran without being scheduled");
    }

    /// Task exit: actor goes idle; caller must re-check the mailbox after
    pub(crate) fn yield_to_idle(&self) {
        self.state.store(IDLE, Ordering::Release);
    }

    /// Task exit: more work known to be pending, a successor task will be
    /// submitted by the same caller
    pub(crate) fn yield_to_scheduled(&self) {
        self.state.store(SCHEDULED, Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn is_idle(&self) -> bool {
        self.state.load(Ordering::Acquire) == IDLE
    }
}
