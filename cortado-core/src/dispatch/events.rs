use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cortado_model::{AssignmentId, StaffId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::DispatchTask;

/// Dispatch lifecycle event published after a state transition
/// commits. Carries enough identifiers for a notification-delivery
/// collaborator to route a message; no further semantics live here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchEvent {
    pub occurred_at: DateTime<Utc>,
    pub payload: DispatchEventPayload,
}

impl DispatchEvent {
    pub fn new(payload: DispatchEventPayload) -> Self {
        Self {
            occurred_at: Utc::now(),
            payload,
        }
    }

    pub fn assignment_id(&self) -> AssignmentId {
        match &self.payload {
            DispatchEventPayload::OfferMade { assignment_id, .. }
            | DispatchEventPayload::OfferSkipped { assignment_id, .. }
            | DispatchEventPayload::OfferTimedOut { assignment_id, .. }
            | DispatchEventPayload::AssignmentAccepted { assignment_id, .. }
            | DispatchEventPayload::AssignmentExhausted { assignment_id } => *assignment_id,
        }
    }
}

/// Event payload emitted by the orchestrator for dispatch transitions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum DispatchEventPayload {
    /// A candidate was offered the task and the deadline clock started.
    OfferMade {
        assignment_id: AssignmentId,
        candidate_id: StaffId,
        task: DispatchTask,
    },
    /// A queued candidate was found unavailable at offer time and the
    /// cascade moved past them without a notification window.
    OfferSkipped {
        assignment_id: AssignmentId,
        candidate_id: StaffId,
    },
    /// The offer deadline elapsed without a response.
    OfferTimedOut {
        assignment_id: AssignmentId,
        candidate_id: StaffId,
    },
    AssignmentAccepted {
        assignment_id: AssignmentId,
        candidate_id: StaffId,
    },
    /// No candidate in the queue accepted; escalation is the caller's.
    AssignmentExhausted { assignment_id: AssignmentId },
}

/// Delivery seam between the orchestrator and whatever transport
/// notifies staff devices. Publication is fire-and-forget: delivery
/// failures never roll back a committed transition.
#[async_trait]
pub trait DispatchEventSink: Send + Sync {
    async fn publish(&self, event: DispatchEvent) -> crate::error::Result<()>;
}

/// Lightweight in-process event bus that fans dispatch notifications
/// out to observers inside the runtime. Keeps the wiring flexible
/// until an external message broker is plugged in.
pub struct InProcEventBus {
    sender: broadcast::Sender<DispatchEvent>,
}

impl InProcEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.sender.subscribe()
    }
}

impl std::fmt::Debug for InProcEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcEventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

#[async_trait]
impl DispatchEventSink for InProcEventBus {
    async fn publish(&self, event: DispatchEvent) -> crate::error::Result<()> {
        // A send error just means nobody is subscribed right now.
        let _ = self.sender.send(event);
        Ok(())
    }
}
