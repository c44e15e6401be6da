//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound port traits: an in-memory rollup domain, the
//! commitment oracle it posts to, and the verification policies.

mod commitment_oracle;
mod rollup_domain;
mod verification_policy;

pub use commitment_oracle::InMemoryCommitmentOracle;
pub use rollup_domain::InMemoryRollupDomain;
pub use verification_policy::{AutoVerifyPolicy, ManualReviewPolicy};
