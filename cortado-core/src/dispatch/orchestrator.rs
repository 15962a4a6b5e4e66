use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use cortado_model::{AssignmentId, StaffId};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{DispatchError, Result};

use super::DispatchTask;
use super::events::{DispatchEvent, DispatchEventPayload, DispatchEventSink};
use super::queue::CandidateQueue;
use super::record::{AssignmentRecord, AssignmentState, AssignmentView, DeadlineHandle};
use super::store::{AssignmentStore, DispatchSnapshot};

/// Availability lookup consulted before each offer is announced.
///
/// The candidate queue is ranked once at dispatch start from a roster
/// snapshot; by the time the cascade reaches a candidate they may have
/// gone off shift. The orchestrator re-validates here and skips
/// whoever no longer qualifies.
#[async_trait]
pub trait CandidateDirectory: Send + Sync {
    async fn is_available(&self, candidate_id: StaffId) -> bool;
}

/// Directory that trusts the queue as ranked: everyone queued is
/// presumed reachable. Keeps the original staleness-window semantics
/// for deployments without a live roster feed.
#[derive(Clone, Copy, Debug, Default)]
pub struct AssumeAvailable;

#[async_trait]
impl CandidateDirectory for AssumeAvailable {
    async fn is_available(&self, _candidate_id: StaffId) -> bool {
        true
    }
}

/// What an atomic cursor advance produced.
enum AdvanceOutcome {
    ReOffered(StaffId),
    Exhausted,
}

pub(super) struct OrchestratorInner {
    pub(super) store: AssignmentStore,
    pub(super) events: Arc<dyn DispatchEventSink>,
    pub(super) directory: Arc<dyn CandidateDirectory>,
    pub(super) config: EngineConfig,
}

impl OrchestratorInner {
    async fn publish(&self, payload: DispatchEventPayload) {
        let event = DispatchEvent::new(payload);
        if let Err(err) = self.events.publish(event).await {
            // Delivery is fire-and-forget; the transition already
            // committed.
            debug!(error = %err, "dispatch event publication failed");
        }
    }

    /// Arm the deadline timer for the offer at `cursor`. The spawned
    /// task carries the cursor it was armed for, so a late fire
    /// against an advanced record cannot act.
    fn arm_deadline(inner: &Arc<Self>, id: AssignmentId, cursor: usize) -> DeadlineHandle {
        let deadline = inner.config.dispatch.offer_deadline();
        let inner = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            OrchestratorInner::expire(&inner, id, cursor).await;
        });
        DeadlineHandle::new(handle.abort_handle())
    }

    /// Move an already-validated `Offered` record one slot forward:
    /// cancel the old deadline, bump the cursor, and either re-offer
    /// (arming the next deadline) or exhaust. Runs inside the record's
    /// critical section.
    fn advance_locked(
        inner: &Arc<Self>,
        id: AssignmentId,
        record: &mut AssignmentRecord,
    ) -> AdvanceOutcome {
        record.cancel_deadline();
        record.cursor += 1;
        let now = Utc::now();
        record.updated_at = now;
        match record.queue.get(record.cursor) {
            Some(next) => {
                record.offered_at = now;
                record.deadline = Some(Self::arm_deadline(inner, id, record.cursor));
                AdvanceOutcome::ReOffered(next)
            }
            None => {
                record.state = AssignmentState::Exhausted;
                AdvanceOutcome::Exhausted
            }
        }
    }

    /// Check-and-set advance keyed on the cursor the caller observed.
    /// `None` means the record moved on (or terminated) first and
    /// nothing was done.
    fn try_advance(
        inner: &Arc<Self>,
        id: AssignmentId,
        expected_cursor: usize,
    ) -> Result<Option<AdvanceOutcome>> {
        inner.store.mutate(id, |record| {
            if record.state != AssignmentState::Offered || record.cursor != expected_cursor {
                return Ok(None);
            }
            Ok(Some(Self::advance_locked(inner, id, record)))
        })
    }

    /// Confirm the current offer with the directory, skipping past
    /// unavailable candidates, and announce whichever offer sticks.
    /// The availability probe runs outside the critical section; the
    /// subsequent skip is a check-and-set, so a concurrent accept wins
    /// cleanly.
    async fn settle_offer(inner: &Arc<Self>, id: AssignmentId) {
        loop {
            let Some(view) = inner.store.view(id) else {
                return;
            };
            let Some(candidate) = view.offered_to() else {
                return;
            };
            let cursor = view.cursor;

            if inner.directory.is_available(candidate).await {
                // Re-check before announcing; a timer may have advanced
                // the record while the probe was in flight.
                let still_current = inner
                    .store
                    .view(id)
                    .map(|v| v.state == AssignmentState::Offered && v.cursor == cursor)
                    .unwrap_or(false);
                if still_current {
                    inner
                        .publish(DispatchEventPayload::OfferMade {
                            assignment_id: id,
                            candidate_id: candidate,
                            task: view.task.clone(),
                        })
                        .await;
                }
                return;
            }

            match Self::try_advance(inner, id, cursor) {
                Ok(Some(AdvanceOutcome::ReOffered(_))) => {
                    debug!(
                        assignment_id = %id,
                        candidate_id = %candidate,
                        "skipping unavailable candidate"
                    );
                    inner
                        .publish(DispatchEventPayload::OfferSkipped {
                            assignment_id: id,
                            candidate_id: candidate,
                        })
                        .await;
                    // Next iteration settles the new offer.
                }
                Ok(Some(AdvanceOutcome::Exhausted)) => {
                    inner
                        .publish(DispatchEventPayload::OfferSkipped {
                            assignment_id: id,
                            candidate_id: candidate,
                        })
                        .await;
                    warn!(assignment_id = %id, "candidate queue exhausted");
                    inner
                        .publish(DispatchEventPayload::AssignmentExhausted {
                            assignment_id: id,
                        })
                        .await;
                    return;
                }
                // Lost a race or the record is gone; whoever won
                // settles the offer.
                Ok(None) | Err(_) => return,
            }
        }
    }

    /// Deadline expiry: an implicit pass issued by the system. Keyed
    /// on the cursor the timer was armed for, so duplicate or late
    /// fires are no-ops.
    pub(super) async fn expire(inner: &Arc<Self>, id: AssignmentId, cursor: usize) {
        let Some(view) = inner.store.view(id) else {
            return;
        };
        let Some(candidate) = view.queue.get(cursor) else {
            return;
        };

        match Self::try_advance(inner, id, cursor) {
            Ok(Some(AdvanceOutcome::ReOffered(_))) => {
                debug!(
                    assignment_id = %id,
                    candidate_id = %candidate,
                    "offer timed out"
                );
                inner
                    .publish(DispatchEventPayload::OfferTimedOut {
                        assignment_id: id,
                        candidate_id: candidate,
                    })
                    .await;
                Self::settle_offer(inner, id).await;
            }
            Ok(Some(AdvanceOutcome::Exhausted)) => {
                inner
                    .publish(DispatchEventPayload::OfferTimedOut {
                        assignment_id: id,
                        candidate_id: candidate,
                    })
                    .await;
                warn!(assignment_id = %id, "candidate queue exhausted after timeout");
                inner
                    .publish(DispatchEventPayload::AssignmentExhausted {
                        assignment_id: id,
                    })
                    .await;
            }
            Ok(None) | Err(_) => {}
        }
    }
}

/// Owns the assignment store and drives the offer cascade.
///
/// Cloning is cheap and shares the underlying store; handlers for
/// concurrent accept/pass calls each hold a clone.
#[derive(Clone)]
pub struct DispatchOrchestrator {
    pub(super) inner: Arc<OrchestratorInner>,
}

impl std::fmt::Debug for DispatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchOrchestrator")
            .field("store", &self.inner.store)
            .field("config", &self.inner.config)
            .finish()
    }
}

impl DispatchOrchestrator {
    pub fn new(
        events: Arc<dyn DispatchEventSink>,
        directory: Arc<dyn CandidateDirectory>,
        config: EngineConfig,
    ) -> Self {
        Self {
            inner: Arc::new(OrchestratorInner {
                store: AssignmentStore::new(),
                events,
                directory,
                config,
            }),
        }
    }

    /// Begin a dispatch: offer the task to the head of the queue, or
    /// exhaust immediately when the queue is empty. The queue is fixed
    /// for the lifetime of the assignment.
    pub async fn start_dispatch(
        &self,
        task: DispatchTask,
        queue: CandidateQueue,
    ) -> AssignmentId {
        let id = AssignmentId::new();
        let inner = &self.inner;

        if queue.is_empty() {
            inner.store.insert(id, AssignmentRecord::exhausted(task, queue));
            info!(assignment_id = %id, "dispatch started with empty queue");
            inner
                .publish(DispatchEventPayload::AssignmentExhausted {
                    assignment_id: id,
                })
                .await;
            return id;
        }

        inner.store.insert(id, AssignmentRecord::offered(task, queue));
        // Arm under the record lock so the timer can never observe a
        // missing record.
        let _ = inner.store.mutate(id, |record| {
            record.deadline = Some(OrchestratorInner::arm_deadline(inner, id, 0));
            Ok(())
        });
        info!(assignment_id = %id, "dispatch started");
        OrchestratorInner::settle_offer(inner, id).await;
        id
    }

    /// Claim the task. Exactly one caller observes success per
    /// assignment; everyone else gets [`DispatchError::AlreadyClaimed`]
    /// or [`DispatchError::NotYourOffer`].
    pub async fn accept(
        &self,
        assignment_id: AssignmentId,
        candidate_id: StaffId,
    ) -> Result<()> {
        self.inner.store.mutate(assignment_id, |record| {
            match record.state {
                AssignmentState::Offered if record.offered_to() == Some(candidate_id) => {
                    record.cancel_deadline();
                    record.state = AssignmentState::Accepted { by: candidate_id };
                    record.updated_at = Utc::now();
                    Ok(())
                }
                AssignmentState::Accepted { by } => Err(DispatchError::AlreadyClaimed {
                    assignment_id,
                    claimed_by: by,
                }),
                _ => Err(DispatchError::NotYourOffer {
                    assignment_id,
                    candidate_id,
                }),
            }
        })?;
        debug!(
            assignment_id = %assignment_id,
            candidate_id = %candidate_id,
            "assignment accepted"
        );
        self.inner
            .publish(DispatchEventPayload::AssignmentAccepted {
                assignment_id,
                candidate_id,
            })
            .await;
        Ok(())
    }

    /// Decline the current offer and advance the cascade. Fails with
    /// [`DispatchError::NotYourOffer`] when the caller does not hold
    /// the offer.
    pub async fn pass(
        &self,
        assignment_id: AssignmentId,
        candidate_id: StaffId,
    ) -> Result<()> {
        let inner = &self.inner;
        let outcome = inner.store.mutate(assignment_id, |record| {
            match record.state {
                AssignmentState::Offered if record.offered_to() == Some(candidate_id) => {
                    Ok(OrchestratorInner::advance_locked(inner, assignment_id, record))
                }
                AssignmentState::Accepted { by } => Err(DispatchError::AlreadyClaimed {
                    assignment_id,
                    claimed_by: by,
                }),
                _ => Err(DispatchError::NotYourOffer {
                    assignment_id,
                    candidate_id,
                }),
            }
        })?;
        debug!(
            assignment_id = %assignment_id,
            candidate_id = %candidate_id,
            "candidate passed"
        );
        match outcome {
            AdvanceOutcome::ReOffered(_) => {
                OrchestratorInner::settle_offer(inner, assignment_id).await;
            }
            AdvanceOutcome::Exhausted => {
                warn!(assignment_id = %assignment_id, "candidate queue exhausted");
                inner
                    .publish(DispatchEventPayload::AssignmentExhausted { assignment_id })
                    .await;
            }
        }
        Ok(())
    }

    /// Force the deadline path for the offer armed at `offer_cursor`.
    /// This is the timer's entry point, exposed so the escalation
    /// sweeper can resolve offers whose timer was lost; calling it for
    /// an offer that already advanced or terminated is a no-op.
    pub async fn expire_offer(&self, assignment_id: AssignmentId, offer_cursor: usize) {
        OrchestratorInner::expire(&self.inner, assignment_id, offer_cursor).await;
    }

    /// Inspection snapshot of one assignment.
    pub fn view(&self, assignment_id: AssignmentId) -> Option<AssignmentView> {
        self.inner.store.view(assignment_id)
    }

    /// Aggregate per-state counts across the store.
    pub fn snapshot(&self) -> DispatchSnapshot {
        self.inner.store.snapshot()
    }
}
