//! # Domain Module
//!
//! Core domain types for the provenance ledger: policy, identities, batches,
//! event chains and the delegation handoff.

pub mod batch;
pub mod delegation;
pub mod event_chain;
pub mod identity;
pub mod invariants;
pub mod policy;
pub mod rate_limit;
pub mod value_objects;

pub use batch::*;
pub use delegation::*;
pub use event_chain::*;
pub use identity::*;
pub use invariants::*;
pub use policy::*;
pub use rate_limit::MinIntervalGate;
pub use value_objects::*;
