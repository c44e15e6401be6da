//! Commitment Oracle Adapter
//!
//! Implements `CommitmentOracle` with an in-memory commitment log and a
//! simulated block height for confirmation counting.

use crate::error::{LedgerError, LedgerResult};
use crate::ports::outbound::{CommitmentOracle, CommitmentProof, SubmissionRef};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Hash;
use std::collections::HashMap;
use tracing::debug;

#[derive(Clone, Copy, Debug)]
struct RecordedCommitment {
    state_root: Hash,
    block_height: u64,
}

/// In-memory commitment log.
///
/// A commitment recorded at height `h` has `current_height - h + 1`
/// confirmations.
pub struct InMemoryCommitmentOracle {
    commitments: RwLock<HashMap<SubmissionRef, RecordedCommitment>>,
    current_height: RwLock<u64>,
    unavailable: RwLock<bool>,
}

impl InMemoryCommitmentOracle {
    /// Create an oracle at height 1.
    pub fn new() -> Self {
        Self {
            commitments: RwLock::new(HashMap::new()),
            current_height: RwLock::new(1),
            unavailable: RwLock::new(false),
        }
    }

    /// Record a commitment at the current height. Re-recording a submission
    /// keeps its original height.
    pub fn record(&self, submission: SubmissionRef, state_root: Hash) -> u64 {
        let height = *self.current_height.read();
        let mut commitments = self.commitments.write();
        let entry = commitments
            .entry(submission)
            .or_insert(RecordedCommitment {
                state_root,
                block_height: height,
            });
        entry.block_height
    }

    /// Advance the simulated chain.
    pub fn advance_blocks(&self, blocks: u64) {
        *self.current_height.write() += blocks;
    }

    pub fn current_height(&self) -> u64 {
        *self.current_height.read()
    }

    /// Simulate an outage: every lookup fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write() = unavailable;
    }

    /// Overwrite a recorded root (simulates a forged or mismatched commitment).
    pub fn set_state_root(&self, submission: &SubmissionRef, state_root: Hash) -> bool {
        match self.commitments.write().get_mut(submission) {
            Some(c) => {
                c.state_root = state_root;
                true
            }
            None => false,
        }
    }
}

impl Default for InMemoryCommitmentOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommitmentOracle for InMemoryCommitmentOracle {
    async fn lookup(&self, submission: &SubmissionRef) -> LedgerResult<CommitmentProof> {
        if *self.unavailable.read() {
            return Err(LedgerError::CommitmentUnavailable {
                reason: "commitment oracle unreachable".into(),
            });
        }

        let recorded = self
            .commitments
            .read()
            .get(submission)
            .copied()
            .ok_or_else(|| LedgerError::CommitmentUnavailable {
                reason: format!("no commitment for {}", hex::encode(submission.tx_hash)),
            })?;

        let current = *self.current_height.read();
        let confirmations = current.saturating_sub(recorded.block_height) + 1;

        debug!(
            "[pv-ledger] Commitment {} at height {} has {} confirmations",
            shared_types::short_id(&submission.tx_hash),
            recorded.block_height,
            confirmations
        );

        Ok(CommitmentProof {
            submission: *submission,
            state_root: recorded.state_root,
            block_height: recorded.block_height,
            confirmations,
        })
    }
}
