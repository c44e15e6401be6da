//! # Integration Tests
//!
//! End-to-end flows through `ProvenanceService` wired to the in-memory
//! rollup domain and commitment oracle.

pub mod delegation_flows;
pub mod recovery;
