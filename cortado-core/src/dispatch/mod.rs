//! Cascading task dispatch.
//!
//! A task (a new order, a raised hand) is offered to one staff member
//! at a time from a ranked candidate queue. Each offer carries a
//! deadline; an explicit pass or an expiry advances the cascade until
//! someone accepts or the queue runs dry. The orchestrator's accept and
//! pass operations are race-safe: under concurrent calls exactly one
//! caller observes success.

pub mod events;
pub mod orchestrator;
pub mod queue;
pub mod record;
pub mod store;
pub mod sweeper;

pub use events::{DispatchEvent, DispatchEventPayload, DispatchEventSink, InProcEventBus};
pub use orchestrator::{AssumeAvailable, CandidateDirectory, DispatchOrchestrator};
pub use queue::{CandidateQueue, StaffSnapshot};
pub use record::{AssignmentRecord, AssignmentState, AssignmentView};
pub use store::{AssignmentStore, DispatchSnapshot};
pub use sweeper::SweepStats;

use chrono::{DateTime, Utc};
use cortado_model::{OrderId, TableId, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Work item handed to the dispatch cascade. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchTask {
    pub id: TaskId,
    pub payload: TaskPayload,
    /// Free-form context forwarded untouched to the notification
    /// collaborator (e.g. a rendered order summary).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
    pub created_at: DateTime<Utc>,
}

impl DispatchTask {
    pub fn new(payload: TaskPayload) -> Self {
        Self {
            id: TaskId::new(),
            payload,
            context: Value::Null,
            created_at: Utc::now(),
        }
    }
}

/// What the task is about; the referenced entities live in the
/// external stores.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum TaskPayload {
    /// A freshly placed order needs a runner.
    Order {
        order_id: OrderId,
        table_id: TableId,
    },
    /// A customer asked for help at their table.
    Assistance { table_id: TableId },
}
