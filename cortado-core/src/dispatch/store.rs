use chrono::{DateTime, Utc};
use cortado_model::AssignmentId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

use super::record::{AssignmentRecord, AssignmentState, AssignmentView};

/// Shared store of in-flight assignment records.
///
/// Every mutation funnels through [`AssignmentStore::mutate`], which
/// holds the record's shard lock for the duration of the closure. That
/// single entry point is what makes the orchestrator's check-and-set
/// transitions atomic per record; there is no cross-record locking.
#[derive(Default)]
pub struct AssignmentStore {
    records: DashMap<AssignmentId, AssignmentRecord>,
}

impl std::fmt::Debug for AssignmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentStore")
            .field("record_count", &self.records.len())
            .finish()
    }
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn insert(&self, id: AssignmentId, record: AssignmentRecord) {
        self.records.insert(id, record);
    }

    /// Run `f` against the record under its per-key lock. The closure
    /// must stay short and free of I/O; event publication happens
    /// after it returns.
    pub fn mutate<T>(
        &self,
        id: AssignmentId,
        f: impl FnOnce(&mut AssignmentRecord) -> Result<T>,
    ) -> Result<T> {
        let mut entry = self
            .records
            .get_mut(&id)
            .ok_or(DispatchError::AssignmentNotFound(id))?;
        f(entry.value_mut())
    }

    /// Inspection snapshot of one record.
    pub fn view(&self, id: AssignmentId) -> Option<AssignmentView> {
        self.records.get(&id).map(|entry| {
            let r = entry.value();
            AssignmentView {
                assignment_id: id,
                task: r.task.clone(),
                queue: r.queue.clone(),
                cursor: r.cursor,
                state: r.state,
                offered_at: r.offered_at,
                updated_at: r.updated_at,
            }
        })
    }

    /// Offers made before `cutoff` that are still outstanding,
    /// returned with the cursor they were armed for so a forced expiry
    /// stays idempotent against a racing transition.
    pub fn stale_offers(&self, cutoff: DateTime<Utc>) -> Vec<(AssignmentId, usize)> {
        self.records
            .iter()
            .filter(|entry| {
                entry.value().state == AssignmentState::Offered
                    && entry.value().offered_at < cutoff
            })
            .map(|entry| (*entry.key(), entry.value().cursor))
            .collect()
    }

    /// Drop terminal records untouched since `cutoff`. Returns the
    /// eviction count.
    pub fn evict_terminal(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, r| !(r.state.is_terminal() && r.updated_at <= cutoff));
        before.saturating_sub(self.records.len())
    }

    /// Aggregate per-state counts.
    pub fn snapshot(&self) -> DispatchSnapshot {
        let mut snapshot = DispatchSnapshot::new(Utc::now());
        for entry in self.records.iter() {
            match entry.value().state {
                AssignmentState::Offered => snapshot.offered += 1,
                AssignmentState::Accepted { .. } => snapshot.accepted += 1,
                AssignmentState::Exhausted => snapshot.exhausted += 1,
            }
        }
        snapshot
    }
}

/// Per-state record counts at a specific instant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchSnapshot {
    pub sampled_at: DateTime<Utc>,
    pub offered: usize,
    pub accepted: usize,
    pub exhausted: usize,
}

impl DispatchSnapshot {
    pub fn new(sampled_at: DateTime<Utc>) -> Self {
        Self {
            sampled_at,
            offered: 0,
            accepted: 0,
            exhausted: 0,
        }
    }
}
