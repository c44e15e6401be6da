//! Outgoing events for off-ledger tracking
//!
//! Emitted after a transition commits. Consumers drain them through
//! `ProvenanceService::take_events`.

use crate::domain::{EventType, OrderStatus, ProductStatus, VerificationStatus};
use serde::{Deserialize, Serialize};
use shared_types::{BatchId, DomainId, EventId, Identity, Timestamp};
use uuid::Uuid;

/// Correlation ID for tracking request/response pairs
pub type CorrelationId = Uuid;

/// Emitted when an event is appended on the base domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCreatedEvent {
    pub event_id: EventId,
    pub batch_id: BatchId,
    pub event_type: EventType,
    pub actor: Identity,
    pub timestamp: Timestamp,
}

/// Emitted for every accepted rollup-side update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdatedEvent {
    pub batch_id: BatchId,
    pub event_id: EventId,
    pub updated_by: Identity,
    pub batch_status: ProductStatus,
    pub order_status: OrderStatus,
    pub event_type: EventType,
    pub timestamp: Timestamp,
}

/// Emitted when rollup state has been merged back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyChainCompletedEvent {
    pub batch_id: BatchId,
    pub event_id: EventId,
    pub final_status: ProductStatus,
    pub final_order_status: OrderStatus,
    pub verification_status: VerificationStatus,
    pub total_events: u32,
    pub completed_by: Identity,
    pub completion_timestamp: Timestamp,
}

/// Every event the ledger emits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    ConfigInitialized {
        authority: Identity,
        timestamp: Timestamp,
    },
    ConfigUpdated {
        authority: Identity,
        is_paused: bool,
        timestamp: Timestamp,
    },
    ManufacturerRegistered {
        owner: Identity,
        company_name: String,
        is_verified: bool,
        timestamp: Timestamp,
    },
    ManufacturerApproved {
        owner: Identity,
        timestamp: Timestamp,
    },
    BatchRegistered {
        batch_id: BatchId,
        manufacturer: Identity,
        batch_size: u32,
        timestamp: Timestamp,
    },
    ActorPermissionChanged {
        batch_id: BatchId,
        actor: Identity,
        granted: bool,
        timestamp: Timestamp,
    },
    EventCreated(EventCreatedEvent),
    VerificationUpdated {
        event_id: EventId,
        status: VerificationStatus,
        verifier: Identity,
        timestamp: Timestamp,
    },
    AuthenticityCertified {
        batch_id: BatchId,
        verifier: Identity,
        timestamp: Timestamp,
    },
    DelegationStarted {
        batch_id: BatchId,
        event_id: EventId,
        rollup: DomainId,
        correlation_id: CorrelationId,
        timestamp: Timestamp,
    },
    StateUpdated(StateUpdatedEvent),
    SupplyChainCompleted(SupplyChainCompletedEvent),
}

impl LedgerEvent {
    /// Stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConfigInitialized { .. } => "ConfigInitialized",
            Self::ConfigUpdated { .. } => "ConfigUpdated",
            Self::ManufacturerRegistered { .. } => "ManufacturerRegistered",
            Self::ManufacturerApproved { .. } => "ManufacturerApproved",
            Self::BatchRegistered { .. } => "BatchRegistered",
            Self::ActorPermissionChanged { .. } => "ActorPermissionChanged",
            Self::EventCreated(_) => "EventCreated",
            Self::VerificationUpdated { .. } => "VerificationUpdated",
            Self::AuthenticityCertified { .. } => "AuthenticityCertified",
            Self::DelegationStarted { .. } => "DelegationStarted",
            Self::StateUpdated(_) => "StateUpdated",
            Self::SupplyChainCompleted(_) => "SupplyChainCompleted",
        }
    }
}
