//! Service configuration
//!
//! Runtime settings for [`crate::ProvenanceService`]. These are distinct from
//! the on-ledger [`crate::domain::LedgerConfig`], which the authority manages
//! through `initialize` / `update_config`.

use crate::error::{LedgerError, LedgerResult};
use shared_types::Identity;
use std::env;

/// Default time after which the authority may force an undelegation.
pub const DEFAULT_UNDELEGATION_TIMEOUT_SECS: u64 = 3_600;
/// Default confirmations required on a rollup commitment.
pub const DEFAULT_REQUIRED_CONFIRMATIONS: u64 = 1;
/// Default number of undrained outgoing events kept before the oldest is dropped.
pub const DEFAULT_MAX_PENDING_EVENTS: usize = 4_096;

/// Provenance service configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Authority whose ledger config this service operates under
    pub authority: Identity,
    /// Seconds a unit may stay delegated or undelegating before the
    /// authority may undelegate it and before it is reported as stalled
    pub undelegation_timeout_secs: u64,
    /// Confirmations a rollup commitment needs before it is merged
    pub required_confirmations: u64,
    /// Outgoing events buffered until `take_events`; older ones are dropped
    pub max_pending_events: usize,
}

impl ServiceConfig {
    /// Defaults for a given authority.
    pub fn for_authority(authority: Identity) -> Self {
        Self {
            authority,
            undelegation_timeout_secs: DEFAULT_UNDELEGATION_TIMEOUT_SECS,
            required_confirmations: DEFAULT_REQUIRED_CONFIRMATIONS,
            max_pending_events: DEFAULT_MAX_PENDING_EVENTS,
        }
    }

    pub fn with_undelegation_timeout(mut self, secs: u64) -> Self {
        self.undelegation_timeout_secs = secs;
        self
    }

    pub fn with_required_confirmations(mut self, confirmations: u64) -> Self {
        self.required_confirmations = confirmations;
        self
    }

    pub fn with_max_pending_events(mut self, max: usize) -> Self {
        self.max_pending_events = max;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PV_AUTHORITY`: authority identity, 64 hex characters (required)
    /// - `PV_UNDELEGATION_TIMEOUT_SECS`: default 3600
    /// - `PV_REQUIRED_CONFIRMATIONS`: default 1
    /// - `PV_MAX_PENDING_EVENTS`: default 4096
    pub fn from_env() -> LedgerResult<Self> {
        let raw = env::var("PV_AUTHORITY").map_err(|_| LedgerError::InvalidConfig {
            field: "PV_AUTHORITY",
            reason: "not set".into(),
        })?;
        let authority = parse_identity(&raw)?;

        Ok(Self {
            authority,
            undelegation_timeout_secs: parse_u64_var(
                "PV_UNDELEGATION_TIMEOUT_SECS",
                DEFAULT_UNDELEGATION_TIMEOUT_SECS,
            )?,
            required_confirmations: parse_u64_var(
                "PV_REQUIRED_CONFIRMATIONS",
                DEFAULT_REQUIRED_CONFIRMATIONS,
            )?,
            max_pending_events: usize::try_from(parse_u64_var(
                "PV_MAX_PENDING_EVENTS",
                DEFAULT_MAX_PENDING_EVENTS as u64,
            )?)
            .map_err(|_| LedgerError::InvalidConfig {
                field: "PV_MAX_PENDING_EVENTS",
                reason: "does not fit in usize".into(),
            })?,
        })
    }
}

/// Parse a 32-byte identity from hex.
pub fn parse_identity(raw: &str) -> LedgerResult<Identity> {
    let bytes = hex::decode(raw.trim()).map_err(|e| LedgerError::InvalidConfig {
        field: "PV_AUTHORITY",
        reason: e.to_string(),
    })?;
    Identity::try_from(bytes.as_slice()).map_err(|_| LedgerError::InvalidConfig {
        field: "PV_AUTHORITY",
        reason: format!("expected 32 bytes, got {}", bytes.len()),
    })
}

fn parse_u64_var(name: &'static str, default: u64) -> LedgerResult<u64> {
    match env::var(name) {
        Ok(v) => v.trim().parse().map_err(|_| LedgerError::InvalidConfig {
            field: name,
            reason: format!("not an unsigned integer: {}", v),
        }),
        Err(_) => Ok(default),
    }
}
