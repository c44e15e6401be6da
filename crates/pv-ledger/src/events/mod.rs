//! Events module for the provenance ledger

pub mod outgoing;

pub use outgoing::{
    CorrelationId, EventCreatedEvent, LedgerEvent, StateUpdatedEvent, SupplyChainCompletedEvent,
};
