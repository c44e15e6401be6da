//! # PV Ledger
//!
//! Supply-chain provenance ledger with base-domain / rollup-domain delegation.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Track manufacturers, product batches and the linked chain of custody
//! events of each batch on a durable base domain, and hand a batch to a
//! low-latency rollup domain for high-frequency updates:
//! - Identity registry with role-gated event types
//! - Per-batch doubly linked event chain, replayable for authenticity
//! - Minimum-interval rate limiting on both domains
//! - Delegate / update / undelegate cycle with commitment verification
//!
//! ## Delegation Lifecycle
//!
//! ```text
//!  Resident ──delegate──▶ Delegating ──rollup ack──▶ Delegated
//!     ▲                                                  │
//!     │                                              undelegate
//!     │                                                  ▼
//!     └────────── verified merge ─────────────── Undelegating
//! ```
//!
//! A unit accepts base-domain writes only while `Resident` and rollup writes
//! only while `Delegated`. A failed outbound call leaves the unit in its
//! in-flight state; repeating the same call resumes from there.
//!
//! ## Module Structure
//!
//! ```text
//! pv-ledger/
//! ├── domain/          # Profiles, batches, event chain, policy, delegation
//! ├── algorithms/      # Chain replay, commitments
//! ├── ports/           # ProvenanceApi, RollupDomain, CommitmentOracle
//! ├── adapters/        # In-memory rollup domain and commitment oracle
//! ├── events/          # Outgoing ledger events
//! ├── state.rs         # Synchronous transitions under one lock
//! └── service.rs       # ProvenanceService
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod state;

// Re-exports
pub use adapters::{AutoVerifyPolicy, InMemoryCommitmentOracle, InMemoryRollupDomain, ManualReviewPolicy};
pub use algorithms::{derive_event_id, replay_chain, state_root, AuthenticityReport, ChainIssue};
pub use config::ServiceConfig;
pub use domain::{
    BusinessType, ConfigParams, ConfigUpdate, DelegationRecord, DelegationSnapshot,
    DelegationState, EventType, LedgerConfig, LoggedUpdate, ManufacturerProfile, Operation,
    OrderStatus, ProductBatch, ProductCategory, ProductEvent, ProductStatus, ProfileUpdate,
    RollupState, RollupUpdate, UndelegateOutcome, VerificationStatus,
};
pub use error::{LedgerError, LedgerResult};
pub use events::LedgerEvent;
pub use ports::{
    ActorGrant, ApproveManufacturer, CertifyAuthenticity, CommitmentOracle, CommitmentProof,
    CreateEvent, DelegateRequest, ProvenanceApi, RecordUpdate, RegisterBatch,
    RegisterManufacturer, RollupDomain, SubmissionRef, UndelegateRequest, UpdateVerification,
    VerificationPolicy,
};
pub use service::ProvenanceService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
