use cortado_model::{SpatialPoint, StaffId};
use serde::{Deserialize, Serialize};

use crate::geo;

/// Read-only snapshot of a staff member for queue ranking, taken from
/// the external roster at dispatch start.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaffSnapshot {
    pub id: StaffId,
    pub position: SpatialPoint,
    pub on_duty: bool,
    /// Number of assignments the staff member currently holds; fewer
    /// wins ties between equally distant candidates.
    pub active_assignments: u32,
}

/// Ordered, deduplicated candidate list for one dispatch.
///
/// Computed once at dispatch start and never re-ranked mid-cascade; a
/// candidate who moves across the floor keeps their original slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidateQueue(Vec<StaffId>);

impl CandidateQueue {
    /// Build a queue from explicit ids, dropping duplicates while
    /// preserving first occurrence.
    pub fn new(candidates: Vec<StaffId>) -> Self {
        let mut seen = Vec::with_capacity(candidates.len());
        for id in candidates {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        Self(seen)
    }

    /// Rank the on-duty roster against a query point: nearest first,
    /// ties broken by current load, then by id for determinism.
    pub fn ranked(query: SpatialPoint, roster: &[StaffSnapshot]) -> Self {
        let mut scored: Vec<(f64, u32, StaffId)> = roster
            .iter()
            .filter(|s| s.on_duty)
            .map(|s| (geo::distance_m(query, s.position), s.active_assignments, s.id))
            .collect();
        scored.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
        Self::new(scored.into_iter().map(|(_, _, id)| id).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<StaffId> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[StaffId] {
        &self.0
    }
}
