//! # `AuthenticatedRequest` Envelope
//!
//! The wrapper for every call entering the ledger.
//!
//! ## Properties
//!
//! - **Envelope Authority**: `caller` is the sole source of truth for identity.
//!   It is filled in by the signature verification layer, never by the payload.
//! - **Domain Routing**: `domain` names the entry point the request was
//!   submitted to (base ledger or a rollup domain).
//! - **Domain Time**: `timestamp` is stamped by the accepting domain and is the
//!   only clock the ledger consults.
//! - **Correlation**: `correlation_id` ties log lines and emitted events to the
//!   originating request; `nonce` is unique per submission.

use crate::entities::{DomainId, Identity, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The envelope for all ledger requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedRequest<T> {
    /// Protocol version for forward compatibility.
    pub version: u16,

    /// Authenticated caller identity. Payloads MUST NOT duplicate this.
    pub caller: Identity,

    /// Domain whose entry point received the request.
    pub domain: DomainId,

    /// Correlates the request with emitted events and log lines.
    pub correlation_id: Uuid,

    /// Unix timestamp (seconds) assigned by the accepting domain.
    pub timestamp: Timestamp,

    /// Unique per submission; a retried request gets a fresh nonce.
    pub nonce: Uuid,

    /// The request payload.
    pub payload: T,
}

impl<T> AuthenticatedRequest<T> {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Build a request addressed to the base domain.
    pub fn base(caller: Identity, timestamp: Timestamp, payload: T) -> Self {
        Self::new(caller, DomainId::Base, timestamp, payload)
    }

    /// Build a request addressed to an arbitrary domain.
    pub fn new(caller: Identity, domain: DomainId, timestamp: Timestamp, payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            caller,
            domain,
            correlation_id: Uuid::new_v4(),
            timestamp,
            nonce: Uuid::new_v4(),
            payload,
        }
    }

    /// Reuse the correlation id of an earlier request (client retries).
    #[must_use]
    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// True when the version is one this build understands.
    #[must_use]
    pub fn is_supported_version(&self) -> bool {
        self.version == Self::CURRENT_VERSION
    }
}
