//! Proximity-based table detection.
//!
//! Given an uncertain GPS fix and a snapshot of the venue's tables, the
//! ranker decides which table the customer is sitting at, reporting
//! either a confidence-classified match, an ambiguous set for the
//! caller to disambiguate (typically by asking the customer), or no
//! match at all. `NoMatch` and `Ambiguous` are first-class outcomes,
//! not errors.

mod ranker;

pub use ranker::rank;

use cortado_model::{SpatialPoint, TableId};
use serde::{Deserialize, Serialize};

/// Read-only snapshot of a table, taken per query from the external
/// entity store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub id: TableId,
    pub position: SpatialPoint,
    /// Intrinsic detection radius around the table's seating area.
    pub seating_radius_m: f64,
    pub status: TableStatus,
}

/// Whether a table can currently be matched against.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TableStatus {
    Open,
    Reserved,
    Offline,
}

impl TableStatus {
    pub fn is_eligible(&self) -> bool {
        matches!(self, TableStatus::Open)
    }
}

/// A table scored against one query point. Created per query and
/// discarded after use.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankedTable {
    pub table: TableSnapshot,
    pub distance_m: f64,
    pub within_effective_radius: bool,
}

/// Confidence classification for a single confident match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Why a query produced no table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum NoMatchReason {
    /// Every eligible table was outside its effective radius.
    OutsideDetectionRange,
    /// The pool held tables, but none in a matchable status.
    NoEligibleTables,
}

impl std::fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoMatchReason::OutsideDetectionRange => {
                write!(f, "outside all detection zones")
            }
            NoMatchReason::NoEligibleTables => write!(f, "no eligible tables"),
        }
    }
}

/// Outcome of one ranking query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// One table stood out.
    Matched {
        candidate: RankedTable,
        confidence: Confidence,
        /// Bounded preview of the next-closest in-range tables.
        alternates: Vec<RankedTable>,
    },
    /// Two or more tables are too close to call; the caller decides.
    Ambiguous { candidates: Vec<RankedTable> },
    /// Nothing in range.
    NoMatch { reason: NoMatchReason },
}

impl MatchOutcome {
    pub fn matched_table(&self) -> Option<&RankedTable> {
        match self {
            MatchOutcome::Matched { candidate, .. } => Some(candidate),
            _ => None,
        }
    }
}
