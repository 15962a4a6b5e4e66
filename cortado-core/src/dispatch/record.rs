use chrono::{DateTime, Utc};
use cortado_model::{AssignmentId, StaffId};
use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;

use super::DispatchTask;
use super::queue::CandidateQueue;

/// Dispatch state machine. States only move forward: an `Offered`
/// record advances to the next offer, `Accepted`, or `Exhausted`;
/// the two terminal states never change again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentState {
    Offered,
    Accepted { by: StaffId },
    Exhausted,
}

impl AssignmentState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AssignmentState::Offered)
    }
}

/// Cancellation handle for the deadline timer owned by an `Offered`
/// state. Exactly one exists per offer; arming a new one always
/// follows cancelling the previous one inside the same transition.
#[derive(Debug)]
pub(crate) struct DeadlineHandle(AbortHandle);

impl DeadlineHandle {
    pub(crate) fn new(handle: AbortHandle) -> Self {
        Self(handle)
    }

    pub(crate) fn cancel(self) {
        self.0.abort();
    }
}

/// The one mutable entity in the dispatch core. Every mutation goes
/// through the store's per-record critical section.
#[derive(Debug)]
pub struct AssignmentRecord {
    pub task: DispatchTask,
    pub queue: CandidateQueue,
    /// Index of the currently (or last) offered candidate.
    pub cursor: usize,
    pub state: AssignmentState,
    /// When the current offer was made.
    pub offered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub(crate) deadline: Option<DeadlineHandle>,
}

impl AssignmentRecord {
    /// A record starting at the head of a non-empty queue.
    pub(crate) fn offered(task: DispatchTask, queue: CandidateQueue) -> Self {
        debug_assert!(!queue.is_empty());
        let now = Utc::now();
        Self {
            task,
            queue,
            cursor: 0,
            state: AssignmentState::Offered,
            offered_at: now,
            updated_at: now,
            deadline: None,
        }
    }

    /// A record born exhausted from an empty queue.
    pub(crate) fn exhausted(task: DispatchTask, queue: CandidateQueue) -> Self {
        let now = Utc::now();
        Self {
            task,
            queue,
            cursor: 0,
            state: AssignmentState::Exhausted,
            offered_at: now,
            updated_at: now,
            deadline: None,
        }
    }

    /// The candidate currently holding the offer, if any.
    pub fn offered_to(&self) -> Option<StaffId> {
        match self.state {
            AssignmentState::Offered => self.queue.get(self.cursor),
            _ => None,
        }
    }

    pub(crate) fn cancel_deadline(&mut self) {
        if let Some(handle) = self.deadline.take() {
            handle.cancel();
        }
    }
}

/// Cloned, inspection-only view of a record. Timer handles stay
/// behind; the view is safe to hold outside the critical section.
#[derive(Clone, Debug)]
pub struct AssignmentView {
    pub assignment_id: AssignmentId,
    pub task: DispatchTask,
    pub queue: CandidateQueue,
    pub cursor: usize,
    pub state: AssignmentState,
    pub offered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssignmentView {
    pub fn offered_to(&self) -> Option<StaffId> {
        match self.state {
            AssignmentState::Offered => self.queue.get(self.cursor),
            _ => None,
        }
    }
}
