//! # Outbound Ports
//!
//! Traits for external dependencies: the rollup execution domain, the
//! commitment oracle that proves rollup submissions, and the manufacturer
//! verification policy.

use crate::domain::{DelegationSnapshot, LoggedUpdate, ManufacturerProfile, RollupState, RollupUpdate};
use crate::error::LedgerResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{BatchId, DomainId, Hash};

/// Reference to a submission on some domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionRef {
    /// Domain the submission was made on.
    pub domain: DomainId,
    /// Submission hash.
    pub tx_hash: Hash,
    /// Per-domain submission sequence number.
    pub sequence: u64,
}

/// Proof that a submission was committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentProof {
    /// The submission this proof covers.
    pub submission: SubmissionRef,
    /// Committed state root.
    pub state_root: Hash,
    /// Height at which the commitment was recorded.
    pub block_height: u64,
    /// Blocks on top of (and including) the commitment block.
    pub confirmations: u64,
}

/// Rollup execution domain - outbound port.
#[async_trait]
pub trait RollupDomain: Send + Sync {
    /// Identity of this domain.
    fn domain_id(&self) -> DomainId;

    /// Take over a unit. Idempotent for the same batch.
    async fn accept_delegation(&self, snapshot: DelegationSnapshot) -> LedgerResult<()>;

    /// Apply one update to the replica of `batch_id`.
    async fn apply_update(&self, batch_id: BatchId, update: RollupUpdate)
        -> LedgerResult<LoggedUpdate>;

    /// Freeze the replica and commit its final state.
    async fn commit_final(&self, batch_id: BatchId) -> LedgerResult<(RollupState, SubmissionRef)>;

    /// Drop the replica once the base domain has merged it.
    async fn release(&self, batch_id: BatchId) -> LedgerResult<()>;
}

/// Commitment lookup - outbound port.
#[async_trait]
pub trait CommitmentOracle: Send + Sync {
    /// Proof for a submission. Not-yet-known submissions surface as
    /// `CommitmentUnavailable`.
    async fn lookup(&self, submission: &SubmissionRef) -> LedgerResult<CommitmentProof>;
}

/// Decides whether a newly registered profile starts verified.
pub trait VerificationPolicy: Send + Sync {
    fn should_verify(&self, profile: &ManufacturerProfile) -> bool;
}
