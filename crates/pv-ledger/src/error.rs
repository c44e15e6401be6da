//! Error types for the provenance ledger
//!
//! Every failure is a classified, recoverable result. Nothing inside the core
//! is process-fatal.

use thiserror::Error;

/// Provenance ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A config already exists for this authority
    #[error("Ledger config already initialized for this authority")]
    AlreadyInitialized,

    /// Referenced record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Participant already holds a profile
    #[error("Participant profile already registered")]
    AlreadyRegistered,

    /// Manufacturer profile is not verified
    #[error("Manufacturer not verified")]
    Unverified,

    /// A configured cap was reached
    #[error("Capacity exceeded: {what} limit {limit} reached")]
    CapacityExceeded { what: &'static str, limit: u32 },

    /// Caller-supplied identifier is already in use
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// Batch size outside 1..=max_batch_size
    #[error("Invalid batch size {size}: must be within 1..={max}")]
    BatchSizeInvalid { size: u32, max: u32 },

    /// Base-domain write against a unit whose authority is elsewhere
    #[error("Batch not resident on the base domain (delegation state: {state})")]
    NotResident { state: String },

    /// Rollup-domain write against a unit that is not delegated there
    #[error("Batch not delegated to this rollup domain (delegation state: {state})")]
    NotDelegated { state: String },

    /// Update arrived before the minimum inter-update interval elapsed
    #[error("Rate limited: {elapsed_secs}s since last update, {required_secs}s required")]
    RateLimited {
        elapsed_secs: u64,
        required_secs: u64,
        retry_after_secs: u64,
    },

    /// Illegal status or chain-link transition
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Ledger is paused
    #[error("Program is paused")]
    Paused,

    /// Caller lacks the role required for this operation
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Text field empty or over its length bound
    #[error("Invalid {field}: {reason}")]
    InvalidMetadata { field: &'static str, reason: String },

    /// Config value out of range
    #[error("Invalid config field {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Commitment proof is not yet available or not yet final
    #[error("Commitment unavailable: {reason}")]
    CommitmentUnavailable { reason: String },

    /// Commitment proof does not match the rollup state being merged
    #[error("Invalid commitment: {reason}")]
    InvalidCommitment { reason: String },

    /// Rollup domain could not be reached
    #[error("Domain unavailable: {reason}")]
    DomainUnavailable { reason: String },
}

impl LedgerError {
    /// Shorthand for [`LedgerError::NotFound`] with a hex id.
    pub fn not_found(kind: &'static str, id: &[u8; 32]) -> Self {
        Self::NotFound {
            kind,
            id: hex::encode(id),
        }
    }

    /// Shorthand for [`LedgerError::DuplicateId`] with a hex id.
    pub fn duplicate(kind: &'static str, id: &[u8; 32]) -> Self {
        Self::DuplicateId {
            kind,
            id: hex::encode(id),
        }
    }

    /// Shorthand for [`LedgerError::Unauthorized`].
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// True for failures the caller is expected to retry unchanged.
    ///
    /// `NotResident`/`NotDelegated` are client state-tracking bugs and are
    /// deliberately not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::CommitmentUnavailable { .. }
                | Self::DomainUnavailable { .. }
        )
    }

    /// Stable label for metrics and structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "already_initialized",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyRegistered => "already_registered",
            Self::Unverified => "unverified",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::DuplicateId { .. } => "duplicate_id",
            Self::BatchSizeInvalid { .. } => "batch_size_invalid",
            Self::NotResident { .. } => "not_resident",
            Self::NotDelegated { .. } => "not_delegated",
            Self::RateLimited { .. } => "rate_limited",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Paused => "paused",
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidMetadata { .. } => "invalid_metadata",
            Self::InvalidConfig { .. } => "invalid_config",
            Self::CommitmentUnavailable { .. } => "commitment_unavailable",
            Self::InvalidCommitment { .. } => "invalid_commitment",
            Self::DomainUnavailable { .. } => "domain_unavailable",
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
