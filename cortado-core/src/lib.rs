//! # Cortado Core
//!
//! Matching and dispatch engine for the Cortado table-service
//! platform. The crate owns the two subsystems where correctness
//! depends on geometry, timing, and concurrent state rather than plain
//! database writes:
//!
//! - **Table detection**: resolve an uncertain GPS fix to a physical
//!   table with confidence classification and explicit ambiguity
//!   handling ([`matching`], [`geo`], [`zones`]).
//! - **Cascading dispatch**: offer a task to one ranked staff
//!   candidate at a time under a response deadline, with race-safe
//!   accept/pass and a background escalation sweep ([`dispatch`]).
//!
//! Persistence, HTTP routing, and notification delivery live in other
//! services; this crate consumes read-only snapshots and publishes
//! lifecycle events through the [`dispatch::DispatchEventSink`] seam.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod matching;
pub mod zones;

// Model types resurface here so downstream services depend on one
// crate.
pub use cortado_model::{
    AssignmentId, ModelError, OrderId, SpatialPoint, StaffId, TableId, TaskId, ZoneId,
};

pub use config::{DispatchConfig, EngineConfig, MatchConfig, SweepConfig};
pub use dispatch::{
    AssignmentRecord, AssignmentState, AssignmentStore, AssignmentView, AssumeAvailable,
    CandidateDirectory, CandidateQueue, DispatchEvent, DispatchEventPayload,
    DispatchEventSink, DispatchOrchestrator, DispatchSnapshot, DispatchTask,
    InProcEventBus, StaffSnapshot, SweepStats, TaskPayload,
};
pub use error::{DispatchError, Result};
pub use matching::{
    Confidence, MatchOutcome, NoMatchReason, RankedTable, TableSnapshot, TableStatus, rank,
};
pub use zones::{Zone, ZoneSettings, ZoneShape, ZoneStatus, classify, nearest};
