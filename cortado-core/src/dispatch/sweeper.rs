//! Escalation sweep: the durability backstop for lost timers.
//!
//! Deadline timers are process-local; a missed scheduling slot or an
//! aborted task would otherwise leave an offer dangling forever. The
//! sweep periodically forces any offer older than deadline + grace
//! through the normal expiry path and evicts terminal records past
//! their retention window. Expiry is idempotent, so sweeping an offer
//! whose timer also fired is harmless.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::orchestrator::{DispatchOrchestrator, OrchestratorInner};

/// Outcome of one sweep pass.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct SweepStats {
    /// Stale offers forced through expiry.
    pub forced: usize,
    /// Terminal records evicted past retention.
    pub evicted: usize,
}

async fn sweep(inner: &Arc<OrchestratorInner>) -> SweepStats {
    let config = &inner.config;
    let stale_after = chrono::Duration::milliseconds(
        (config.dispatch.offer_deadline_ms + config.sweep.sweep_grace_ms) as i64,
    );
    let stale = inner.store.stale_offers(Utc::now() - stale_after);
    let forced = stale.len();
    for (id, cursor) in stale {
        warn!(assignment_id = %id, cursor, "forcing expiry of stale offer");
        OrchestratorInner::expire(inner, id, cursor).await;
    }

    let retention =
        chrono::Duration::milliseconds(config.sweep.terminal_retention_ms as i64);
    let evicted = inner.store.evict_terminal(Utc::now() - retention);

    SweepStats { forced, evicted }
}

impl DispatchOrchestrator {
    /// Run one sweep pass immediately. The background task calls this
    /// on a cadence; tests call it directly.
    pub async fn sweep_once(&self) -> SweepStats {
        sweep(&self.inner).await
    }

    /// Spawn the periodic sweeper. The task runs until aborted or the
    /// runtime shuts down.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.config.sweep.sweep_interval());
            loop {
                ticker.tick().await;
                let stats = sweep(&inner).await;
                if stats.forced > 0 || stats.evicted > 0 {
                    debug!(
                        forced = stats.forced,
                        evicted = stats.evicted,
                        "sweep pass resolved stale state"
                    );
                }
            }
        })
    }
}
