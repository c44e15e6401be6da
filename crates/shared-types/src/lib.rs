//! # Shared Types Crate
//!
//! Identifiers and the `AuthenticatedRequest<T>` envelope shared by the
//! provenance ledger core, its adapters and the integration suite.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Cross-crate identifier types are defined here.
//! - **Envelope Identity**: The envelope's `caller` is authoritative; request
//!   payloads never carry a requester field of their own.

pub mod entities;
pub mod envelope;

pub use entities::*;
pub use envelope::AuthenticatedRequest;
