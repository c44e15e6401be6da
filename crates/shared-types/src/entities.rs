//! # Core Identifiers
//!
//! Identifier and domain types shared by the ledger core, its adapters and the
//! integration suite.
//!
//! ## Clusters
//!
//! - **Identity**: `Identity` (the caller key supplied by the signing layer)
//! - **Records**: `BatchId`, `EventId`, `Hash`
//! - **Execution domains**: `DomainId`

use serde::{Deserialize, Serialize};

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

/// A 32-byte participant key (Ed25519 public key of the caller).
pub type Identity = [u8; 32];

/// Caller-supplied, system-wide unique identifier of a product batch.
pub type BatchId = [u8; 32];

/// Caller-supplied, system-wide unique identifier of a product event.
pub type EventId = [u8; 32];

/// Unix timestamp in seconds, as stamped by the domain that accepted a request.
pub type Timestamp = u64;

/// Execution domain that may hold mutation authority over a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainId {
    /// The durable, globally ordered ledger where records normally reside.
    Base,
    /// A low-latency rollup domain, identified by its sequencer key.
    Rollup(Identity),
}

impl DomainId {
    /// True for the base domain.
    #[must_use]
    pub fn is_base(&self) -> bool {
        matches!(self, DomainId::Base)
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainId::Base => write!(f, "base"),
            DomainId::Rollup(key) => write!(f, "rollup:{}", short_id(key)),
        }
    }
}

/// Abbreviated hex rendering of a 32-byte identifier for log lines.
#[must_use]
pub fn short_id(id: &[u8; 32]) -> String {
    format!("{}..", hex::encode(&id[..4]))
}
