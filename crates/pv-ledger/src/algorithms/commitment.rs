//! # Rollup Commitments
//!
//! State roots over the canonical encoding of rollup state, commitment proof
//! checks, and derived ids for events logged on the rollup domain.

use crate::domain::RollupState;
use crate::error::{LedgerError, LedgerResult};
use crate::ports::outbound::CommitmentProof;
use sha2::{Digest, Sha256};
use shared_types::{BatchId, EventId, Hash};

/// SHA-256 over the bincode encoding of a rollup state.
pub fn state_root(state: &RollupState) -> LedgerResult<Hash> {
    let encoded = bincode::serialize(state).map_err(|e| LedgerError::InvalidCommitment {
        reason: format!("state encoding failed: {}", e),
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(hasher.finalize().into())
}

/// Id of the event materialized from rollup update number `sequence`.
///
/// `sha256(batch_id ‖ delegated_event_id ‖ sequence_le)`
pub fn derive_event_id(batch_id: &BatchId, event_id: &EventId, sequence: u32) -> EventId {
    let mut hasher = Sha256::new();
    hasher.update(batch_id);
    hasher.update(event_id);
    hasher.update(sequence.to_le_bytes());
    hasher.finalize().into()
}

/// Check a proof against the state it claims to commit.
///
/// A proof that is merely not final yet is `CommitmentUnavailable` (retry
/// later). A proof that disagrees with the state is `InvalidCommitment`.
pub fn verify_commitment(
    proof: &CommitmentProof,
    state: &RollupState,
    required_confirmations: u64,
) -> LedgerResult<()> {
    let expected = state_root(state)?;
    if proof.state_root != expected {
        return Err(LedgerError::InvalidCommitment {
            reason: format!(
                "state root mismatch: proof {} != computed {}",
                hex::encode(proof.state_root),
                hex::encode(expected)
            ),
        });
    }
    if proof.confirmations < required_confirmations {
        return Err(LedgerError::CommitmentUnavailable {
            reason: format!(
                "{} of {} confirmations",
                proof.confirmations, required_confirmations
            ),
        });
    }
    Ok(())
}
