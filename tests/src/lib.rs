//! # Provenance Ledger Test Suite
//!
//! Cross-crate integration flows for the ledger, its delegation handoff and
//! the telemetry bootstrap.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs            # Harness, identities, request builders
//! └── integration/
//!     ├── flows.rs           # Base-domain registry and event chain
//!     ├── delegation_flows.rs # Delegate / record_update / undelegate
//!     └── recovery.rs        # Outages, forged commitments, timeouts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p pv-tests
//!
//! # By category
//! cargo test -p pv-tests integration::delegation_flows::
//! cargo test -p pv-tests integration::recovery::
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
