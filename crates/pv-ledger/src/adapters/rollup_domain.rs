//! Rollup Domain Adapter
//!
//! Implements `RollupDomain` with in-memory replicas keyed by batch. Final
//! states are committed to a shared [`InMemoryCommitmentOracle`].

use super::commitment_oracle::InMemoryCommitmentOracle;
use crate::algorithms::commitment::state_root;
use crate::domain::{DelegationSnapshot, LoggedUpdate, RollupReplica, RollupState, RollupUpdate};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::outbound::{RollupDomain, SubmissionRef};
use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use shared_types::{short_id, BatchId, DomainId, Hash, Identity};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

struct ReplicaSlot {
    replica: RollupReplica,
    commitment: Option<SubmissionRef>,
}

/// In-memory rollup execution domain.
pub struct InMemoryRollupDomain {
    id: DomainId,
    replicas: RwLock<HashMap<BatchId, ReplicaSlot>>,
    commitments: Arc<InMemoryCommitmentOracle>,
    next_sequence: RwLock<u64>,
    unavailable: RwLock<bool>,
}

impl InMemoryRollupDomain {
    /// Create a rollup domain identified by `operator`.
    pub fn new(operator: Identity, commitments: Arc<InMemoryCommitmentOracle>) -> Self {
        Self {
            id: DomainId::Rollup(operator),
            replicas: RwLock::new(HashMap::new()),
            commitments,
            next_sequence: RwLock::new(1),
            unavailable: RwLock::new(false),
        }
    }

    /// Simulate an outage: every call fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write() = unavailable;
    }

    /// Current replica state, if the batch is held here.
    pub fn replica_state(&self, batch_id: &BatchId) -> Option<RollupState> {
        self.replicas
            .read()
            .get(batch_id)
            .map(|slot| slot.replica.state.clone())
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.read().len()
    }

    fn ensure_available(&self) -> LedgerResult<()> {
        if *self.unavailable.read() {
            return Err(LedgerError::DomainUnavailable {
                reason: format!("rollup domain {} unreachable", self.id),
            });
        }
        Ok(())
    }

    fn not_held(batch_id: &BatchId) -> LedgerError {
        LedgerError::NotDelegated {
            state: format!("no replica for batch {}", short_id(batch_id)),
        }
    }
}

/// Submission hash for a final-state commitment.
fn submission_hash(batch_id: &BatchId, sequence: u64, root: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(batch_id);
    hasher.update(sequence.to_le_bytes());
    hasher.update(root);
    hasher.finalize().into()
}

#[async_trait]
impl RollupDomain for InMemoryRollupDomain {
    fn domain_id(&self) -> DomainId {
        self.id
    }

    async fn accept_delegation(&self, snapshot: DelegationSnapshot) -> LedgerResult<()> {
        self.ensure_available()?;
        let batch_id = snapshot.batch.batch_id;
        let mut replicas = self.replicas.write();

        if let Some(slot) = replicas.get(&batch_id) {
            if slot.commitment.is_none() {
                debug!(
                    "[pv-rollup] Batch {} already held, delegation resumed",
                    short_id(&batch_id)
                );
                return Ok(());
            }
        }

        replicas.insert(
            batch_id,
            ReplicaSlot {
                replica: RollupReplica::from_snapshot(&snapshot),
                commitment: None,
            },
        );
        info!(
            "[pv-rollup] Accepted batch {} ({} events)",
            short_id(&batch_id),
            snapshot.batch.total_events
        );
        Ok(())
    }

    async fn apply_update(
        &self,
        batch_id: BatchId,
        update: RollupUpdate,
    ) -> LedgerResult<LoggedUpdate> {
        self.ensure_available()?;
        let mut replicas = self.replicas.write();
        let slot = replicas
            .get_mut(&batch_id)
            .ok_or_else(|| Self::not_held(&batch_id))?;
        let logged = slot.replica.apply(&update)?.clone();
        debug!(
            "[pv-rollup] Batch {} update #{} accepted",
            short_id(&batch_id),
            logged.sequence
        );
        Ok(logged)
    }

    async fn commit_final(&self, batch_id: BatchId) -> LedgerResult<(RollupState, SubmissionRef)> {
        self.ensure_available()?;
        let mut replicas = self.replicas.write();
        let slot = replicas
            .get_mut(&batch_id)
            .ok_or_else(|| Self::not_held(&batch_id))?;

        if let Some(submission) = slot.commitment {
            return Ok((slot.replica.state.clone(), submission));
        }

        let root = state_root(&slot.replica.state)?;
        let sequence = {
            let mut next = self.next_sequence.write();
            let current = *next;
            *next += 1;
            current
        };
        let submission = SubmissionRef {
            domain: self.id,
            tx_hash: submission_hash(&batch_id, sequence, &root),
            sequence,
        };
        self.commitments.record(submission, root);

        slot.replica.committed = true;
        slot.commitment = Some(submission);
        info!(
            "[pv-rollup] Committed batch {} final state (root {}, {} events)",
            short_id(&batch_id),
            short_id(&root),
            slot.replica.state.total_events
        );
        Ok((slot.replica.state.clone(), submission))
    }

    async fn release(&self, batch_id: BatchId) -> LedgerResult<()> {
        self.ensure_available()?;
        if self.replicas.write().remove(&batch_id).is_some() {
            debug!("[pv-rollup] Released batch {}", short_id(&batch_id));
        }
        Ok(())
    }
}
