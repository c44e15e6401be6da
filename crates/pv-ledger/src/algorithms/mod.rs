//! # Algorithms Module
//!
//! Chain replay for authenticity checks and rollup commitment hashing.

pub mod chain_replay;
pub mod commitment;

pub use chain_replay::{replay_chain, AuthenticityReport, ChainIssue};
pub use commitment::{derive_event_id, state_root, verify_commitment};
