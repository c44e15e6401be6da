//! # Domain Value Objects
//!
//! Payload-less status enums and the delegation state machine.
//!
//! Every transition table below is an exhaustive `match`, so adding a variant
//! forces a review of each transition function.

use serde::{Deserialize, Serialize};

/// Business role declared by a participant at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusinessType {
    /// Creates batches.
    Manufacturer,
    /// Moves goods between manufacturer and retail.
    Distributor,
    /// Sells to consumers.
    Retailer,
    /// Carrier or customs broker.
    LogisticsProvider,
    /// Independent inspector; may verify events.
    QualityInspector,
    /// End customer.
    Consumer,
}

/// Product category of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    Electronics,
    Automotive,
    Pharmaceuticals,
    Food,
    Textiles,
    Luxury,
    Industrial,
    Other,
}

/// Batch-level lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductStatus {
    Registered,
    #[default]
    Created,
    Manufactured,
    InTransit,
    InWarehouse,
    ForSale,
    Sold,
    Delivered,
    Recalled,
    Destroyed,
}

/// Kind of custody or status event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Register,
    Manufactured,
    QualityCheck,
    Packaged,
    Shipped,
    InTransit,
    Delivered,
    Sold,
    Recalled,
    QualityFailed,
    OwnershipTransfer,
    LocationUpdate,
    CustomsCleared,
}

impl EventType {
    /// Role a non-manufacturer actor must hold to log this event type.
    ///
    /// `None` means any authorized actor may log it.
    pub fn required_role(&self) -> Option<BusinessType> {
        match self {
            Self::QualityCheck | Self::QualityFailed => Some(BusinessType::QualityInspector),
            Self::CustomsCleared => Some(BusinessType::LogisticsProvider),
            Self::Register
            | Self::Manufactured
            | Self::Packaged
            | Self::Shipped
            | Self::InTransit
            | Self::Delivered
            | Self::Sold
            | Self::Recalled
            | Self::OwnershipTransfer
            | Self::LocationUpdate => None,
        }
    }
}

/// Commercial order status attached to an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    InTransit,
    Delivered,
    Completed,
    Cancelled,
    Disputed,
    Refunded,
}

/// Verification verdict on a single event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    /// Monotonic: Pending -> {Verified, Rejected}, nothing after that.
    pub fn can_transition_to(&self, next: VerificationStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Verified) => true,
            (Self::Pending, Self::Rejected) => true,
            (Self::Pending, Self::Pending) => false,
            (Self::Verified, _) => false,
            (Self::Rejected, _) => false,
        }
    }

    /// Check if terminal state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Verified | Self::Rejected)
    }
}

/// Which domain holds mutation authority over a batch unit.
///
/// ```text
/// Resident ──delegate──→ Delegating ──ack──→ Delegated ──undelegate──→ Undelegating ──merge──→ Resident
/// ```
///
/// `Delegating` and `Undelegating` are recovery markers: a handoff interrupted
/// between submit and acknowledge leaves the unit in one of them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DelegationState {
    /// Mutations accepted only on the base domain.
    #[default]
    Resident,
    /// Handoff submitted to the rollup domain, not yet acknowledged.
    Delegating,
    /// Mutations accepted only on the rollup domain.
    Delegated,
    /// Return requested, rollup state not yet merged.
    Undelegating,
}

impl DelegationState {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: DelegationState) -> bool {
        match (self, next) {
            (Self::Resident, Self::Delegating) => true,
            (Self::Delegating, Self::Delegated) => true,
            (Self::Delegated, Self::Undelegating) => true,
            (Self::Undelegating, Self::Resident) => true,
            (Self::Resident, _) => false,
            (Self::Delegating, _) => false,
            (Self::Delegated, _) => false,
            (Self::Undelegating, _) => false,
        }
    }

    /// Base-domain writes are accepted only while resident.
    pub fn accepts_base_writes(&self) -> bool {
        matches!(self, Self::Resident)
    }

    /// Rollup-domain writes are accepted only while delegated.
    pub fn accepts_rollup_writes(&self) -> bool {
        matches!(self, Self::Delegated)
    }

    /// Mid-handoff states that an interrupted protocol can leave behind.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Delegating | Self::Undelegating)
    }
}

impl std::fmt::Display for DelegationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Every ledger entry point, used by the policy gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Initialize,
    UpdateConfig,
    RegisterManufacturer,
    UpdateProfile,
    ApproveManufacturer,
    RegisterBatch,
    GrantActor,
    RevokeActor,
    CreateEvent,
    UpdateVerification,
    CertifyAuthenticity,
    Delegate,
    RecordUpdate,
    Undelegate,
    GetProfile,
    GetBatch,
    GetEvent,
    VerifyAuthenticity,
}

impl Operation {
    /// True for operations that change ledger state.
    pub fn is_mutating(&self) -> bool {
        match self {
            Self::Initialize
            | Self::UpdateConfig
            | Self::RegisterManufacturer
            | Self::UpdateProfile
            | Self::ApproveManufacturer
            | Self::RegisterBatch
            | Self::GrantActor
            | Self::RevokeActor
            | Self::CreateEvent
            | Self::UpdateVerification
            | Self::CertifyAuthenticity
            | Self::Delegate
            | Self::RecordUpdate
            | Self::Undelegate => true,
            Self::GetProfile | Self::GetBatch | Self::GetEvent | Self::VerifyAuthenticity => false,
        }
    }

    /// Administrative operations that stay available while paused.
    ///
    /// Without this exemption a paused ledger could never be resumed.
    pub fn is_pause_exempt(&self) -> bool {
        matches!(self, Self::UpdateConfig)
    }
}
