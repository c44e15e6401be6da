//! # Inbound Ports
//!
//! API trait defining what the provenance ledger can do. Every mutating call
//! arrives wrapped in an [`AuthenticatedRequest`], which supplies the caller
//! identity, the target domain and the domain timestamp. Payloads never carry
//! the caller themselves.

use crate::algorithms::AuthenticityReport;
use crate::domain::{
    BusinessType, ConfigParams, ConfigUpdate, DelegationRecord, EventType, LedgerConfig,
    LoggedUpdate, ManufacturerProfile, OrderStatus, ProductBatch, ProductCategory, ProductEvent,
    ProductStatus, ProfileUpdate, UndelegateOutcome, VerificationStatus,
};
use crate::error::LedgerResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{AuthenticatedRequest, BatchId, EventId, Identity, Timestamp};

/// Payload for `register_manufacturer`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterManufacturer {
    pub company_name: String,
    pub business_type: BusinessType,
    pub certifications: String,
}

/// Payload for `approve_manufacturer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveManufacturer {
    pub owner: Identity,
}

/// Payload for `register_batch`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBatch {
    pub batch_id: BatchId,
    pub metadata_ref: String,
    pub category: ProductCategory,
    pub batch_size: u32,
}

/// Payload for `grant_actor` / `revoke_actor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorGrant {
    pub batch_id: BatchId,
    pub actor: Identity,
}

/// Payload for `create_event`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEvent {
    pub batch_id: BatchId,
    pub event_id: EventId,
    pub event_type: EventType,
    pub metadata_ref: Option<String>,
    pub order_status: OrderStatus,
    /// Must be the current tail when given.
    pub previous_event: Option<EventId>,
}

/// Payload for `update_verification`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateVerification {
    pub event_id: EventId,
    pub status: VerificationStatus,
}

/// Payload for `certify_authenticity`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifyAuthenticity {
    pub batch_id: BatchId,
}

/// Payload for `delegate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateRequest {
    pub batch_id: BatchId,
    pub event_id: EventId,
}

/// Payload for `record_update`. `None` fields keep their prior value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub batch_id: BatchId,
    pub event_id: EventId,
    pub product_status: Option<ProductStatus>,
    pub order_status: Option<OrderStatus>,
    pub event_type: Option<EventType>,
    pub metadata_ref: Option<String>,
}

/// Payload for `undelegate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndelegateRequest {
    pub batch_id: BatchId,
    pub event_id: EventId,
}

/// Provenance ledger API - inbound port.
#[async_trait]
pub trait ProvenanceApi: Send + Sync {
    /// Create the config singleton for the service's authority.
    async fn initialize(&self, req: AuthenticatedRequest<ConfigParams>) -> LedgerResult<LedgerConfig>;

    /// Authority-only partial config update. Allowed while paused.
    async fn update_config(&self, req: AuthenticatedRequest<ConfigUpdate>)
        -> LedgerResult<LedgerConfig>;

    async fn register_manufacturer(
        &self,
        req: AuthenticatedRequest<RegisterManufacturer>,
    ) -> LedgerResult<ManufacturerProfile>;

    async fn update_profile(
        &self,
        req: AuthenticatedRequest<ProfileUpdate>,
    ) -> LedgerResult<ManufacturerProfile>;

    async fn approve_manufacturer(
        &self,
        req: AuthenticatedRequest<ApproveManufacturer>,
    ) -> LedgerResult<ManufacturerProfile>;

    async fn register_batch(&self, req: AuthenticatedRequest<RegisterBatch>)
        -> LedgerResult<ProductBatch>;

    /// Returns false if the actor already held the grant.
    async fn grant_actor(&self, req: AuthenticatedRequest<ActorGrant>) -> LedgerResult<bool>;

    /// Returns false if the actor held no grant.
    async fn revoke_actor(&self, req: AuthenticatedRequest<ActorGrant>) -> LedgerResult<bool>;

    async fn create_event(&self, req: AuthenticatedRequest<CreateEvent>) -> LedgerResult<ProductEvent>;

    async fn update_verification(
        &self,
        req: AuthenticatedRequest<UpdateVerification>,
    ) -> LedgerResult<ProductEvent>;

    async fn certify_authenticity(
        &self,
        req: AuthenticatedRequest<CertifyAuthenticity>,
    ) -> LedgerResult<AuthenticityReport>;

    /// Hand mutation authority for a batch to the rollup domain.
    async fn delegate(&self, req: AuthenticatedRequest<DelegateRequest>)
        -> LedgerResult<DelegationRecord>;

    /// Rate-limited update executed on the rollup domain.
    async fn record_update(&self, req: AuthenticatedRequest<RecordUpdate>)
        -> LedgerResult<LoggedUpdate>;

    /// Reconcile rollup state back to the base domain. Idempotent.
    async fn undelegate(
        &self,
        req: AuthenticatedRequest<UndelegateRequest>,
    ) -> LedgerResult<UndelegateOutcome>;

    fn config(&self) -> LedgerResult<LedgerConfig>;

    fn get_profile(&self, owner: &Identity) -> LedgerResult<ManufacturerProfile>;

    fn get_batch(&self, batch_id: &BatchId) -> LedgerResult<ProductBatch>;

    fn get_event(&self, event_id: &EventId) -> LedgerResult<ProductEvent>;

    /// Events of a batch in chain order.
    fn events_for_batch(&self, batch_id: &BatchId) -> LedgerResult<Vec<ProductEvent>>;

    /// Replay the chain of a batch. Allowed while paused.
    fn verify_authenticity(&self, batch_id: &BatchId) -> LedgerResult<AuthenticityReport>;

    fn delegation(&self, batch_id: &BatchId) -> Option<DelegationRecord>;

    /// Units stuck mid-handoff longer than the undelegation timeout.
    fn stalled_delegations(&self, now: Timestamp) -> Vec<DelegationRecord>;
}
