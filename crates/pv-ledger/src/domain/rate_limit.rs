//! # Minimum-Interval Gate
//!
//! Per-batch churn limiter for updates.
//!
//! ## Algorithm
//!
//! Unlike a token bucket there is no burst allowance: an update is accepted
//! only if at least `min_interval_secs` of domain time separate it from the
//! batch's last recorded update. Timestamps are the ones stamped by the
//! accepting domain, so the check is deterministic and replayable.
//!
//! A timestamp earlier than the last update counts as zero elapsed time and is
//! rejected, which is how out-of-order submissions are refused.

use crate::error::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;

/// Minimum inter-update interval for one batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinIntervalGate {
    /// Required spacing between successive updates (seconds).
    pub min_interval_secs: u64,
}

impl MinIntervalGate {
    /// Create a gate.
    pub fn new(min_interval_secs: u64) -> Self {
        Self { min_interval_secs }
    }

    /// Check whether an update at `now` may follow one recorded at `last`.
    ///
    /// The first update of a batch (`last == None`) is always admitted.
    pub fn check(&self, last: Option<Timestamp>, now: Timestamp) -> LedgerResult<()> {
        let Some(last) = last else {
            return Ok(());
        };

        let elapsed = now.saturating_sub(last);
        if elapsed < self.min_interval_secs {
            return Err(LedgerError::RateLimited {
                elapsed_secs: elapsed,
                required_secs: self.min_interval_secs,
                retry_after_secs: self.min_interval_secs - elapsed,
            });
        }
        Ok(())
    }

    /// Earliest timestamp at which the next update will be admitted.
    pub fn next_allowed(&self, last: Option<Timestamp>) -> Timestamp {
        last.map(|t| t.saturating_add(self.min_interval_secs))
            .unwrap_or(0)
    }
}
