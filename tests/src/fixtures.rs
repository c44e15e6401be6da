//! Shared test fixtures: a fully wired ledger plus request builders.

use pv_ledger::{
    AutoVerifyPolicy, BusinessType, ConfigParams, CreateEvent, DelegateRequest, DelegationRecord,
    EventType, InMemoryCommitmentOracle, InMemoryRollupDomain, LedgerConfig, LedgerResult,
    LoggedUpdate, ManufacturerProfile, OrderStatus, ProductBatch, ProductCategory, ProductEvent,
    ProvenanceApi, ProvenanceService, RecordUpdate, RegisterBatch, RegisterManufacturer,
    RollupDomain, ServiceConfig, UndelegateOutcome, UndelegateRequest, VerificationPolicy,
};
use pv_telemetry::{init_logging, TelemetryConfig};
use shared_types::{AuthenticatedRequest, BatchId, DomainId, EventId, Identity, Timestamp};
use std::sync::Arc;

pub const AUTHORITY: Identity = [0xA0; 32];
pub const OPERATOR: Identity = [0xB0; 32];
pub const TECHCORP: Identity = [0x01; 32];
pub const INSPECTOR: Identity = [0x02; 32];
pub const CARRIER: Identity = [0x03; 32];
pub const STRANGER: Identity = [0x04; 32];

/// Base timestamp for every scenario.
pub const T0: Timestamp = 1_700_000_000;

/// 32-byte id with every byte set to `tag`.
pub fn id(tag: u8) -> [u8; 32] {
    [tag; 32]
}

/// Install a quiet global subscriber once per test binary.
pub fn init_test_logging() {
    let config = TelemetryConfig {
        log_level: "warn".to_string(),
        ..TelemetryConfig::default()
    };
    // A second install in the same binary fails; that is fine here.
    let _ = init_logging(&config);
}

/// Config used by the end-to-end scenarios: 5 s interval, batches up to 50.
pub fn scenario_params() -> ConfigParams {
    ConfigParams {
        min_event_interval_secs: 5,
        max_batch_size: 50,
        ..ConfigParams::default()
    }
}

/// A ledger wired to in-memory domain adapters.
pub struct Harness<R = InMemoryRollupDomain, V = AutoVerifyPolicy>
where
    R: RollupDomain + 'static,
    V: VerificationPolicy + 'static,
{
    pub service: ProvenanceService<R, InMemoryCommitmentOracle, V>,
    pub rollup: Arc<R>,
    pub oracle: Arc<InMemoryCommitmentOracle>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_service_config(ServiceConfig::for_authority(AUTHORITY))
    }

    pub fn with_service_config(config: ServiceConfig) -> Self {
        let oracle = Arc::new(InMemoryCommitmentOracle::new());
        let rollup = Arc::new(InMemoryRollupDomain::new(OPERATOR, Arc::clone(&oracle)));
        Self::assemble(config, rollup, oracle, Arc::new(AutoVerifyPolicy))
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, V> Harness<R, V>
where
    R: RollupDomain + 'static,
    V: VerificationPolicy + 'static,
{
    pub fn assemble(
        config: ServiceConfig,
        rollup: Arc<R>,
        oracle: Arc<InMemoryCommitmentOracle>,
        verification: Arc<V>,
    ) -> Self {
        init_test_logging();
        let service = ProvenanceService::new(
            config,
            Arc::clone(&rollup),
            Arc::clone(&oracle),
            verification,
        );
        Self {
            service,
            rollup,
            oracle,
        }
    }

    /// The rollup domain the ledger delegates to.
    pub fn rollup_domain(&self) -> DomainId {
        self.rollup.domain_id()
    }

    /// Request addressed to the base domain.
    pub fn base<P>(&self, caller: Identity, at: Timestamp, payload: P) -> AuthenticatedRequest<P> {
        AuthenticatedRequest::base(caller, at, payload)
    }

    /// Request addressed to the rollup domain.
    pub fn on_rollup<P>(&self, caller: Identity, at: Timestamp, payload: P) -> AuthenticatedRequest<P> {
        AuthenticatedRequest::new(caller, self.rollup_domain(), at, payload)
    }

    pub async fn initialize(&self, params: ConfigParams) -> LedgerResult<LedgerConfig> {
        self.service
            .initialize(self.base(AUTHORITY, T0 - 100, params))
            .await
    }

    pub async fn register(
        &self,
        owner: Identity,
        company_name: &str,
        business_type: BusinessType,
    ) -> LedgerResult<ManufacturerProfile> {
        self.service
            .register_manufacturer(self.base(
                owner,
                T0 - 90,
                RegisterManufacturer {
                    company_name: company_name.to_string(),
                    business_type,
                    certifications: "ISO9001".to_string(),
                },
            ))
            .await
    }

    pub async fn register_batch(&self, owner: Identity, batch_id: BatchId, batch_size: u32) -> LedgerResult<ProductBatch> {
        self.service
            .register_batch(self.base(
                owner,
                T0 - 80,
                RegisterBatch {
                    batch_id,
                    metadata_ref: "QmTechCorpBatch".to_string(),
                    category: ProductCategory::Electronics,
                    batch_size,
                },
            ))
            .await
    }

    pub async fn create_event(
        &self,
        actor: Identity,
        batch_id: BatchId,
        event_id: EventId,
        event_type: EventType,
        at: Timestamp,
    ) -> LedgerResult<ProductEvent> {
        self.service
            .create_event(self.base(
                actor,
                at,
                CreateEvent {
                    batch_id,
                    event_id,
                    event_type,
                    metadata_ref: Some("QmEvent".to_string()),
                    order_status: OrderStatus::Pending,
                    previous_event: None,
                },
            ))
            .await
    }

    pub async fn delegate(&self, caller: Identity, batch_id: BatchId, event_id: EventId, at: Timestamp) -> LedgerResult<DelegationRecord> {
        self.service
            .delegate(self.base(caller, at, DelegateRequest { batch_id, event_id }))
            .await
    }

    pub async fn update_order(
        &self,
        caller: Identity,
        batch_id: BatchId,
        event_id: EventId,
        order_status: OrderStatus,
        at: Timestamp,
    ) -> LedgerResult<LoggedUpdate> {
        self.service
            .record_update(self.on_rollup(
                caller,
                at,
                RecordUpdate {
                    batch_id,
                    event_id,
                    order_status: Some(order_status),
                    ..Default::default()
                },
            ))
            .await
    }

    pub async fn undelegate(&self, caller: Identity, batch_id: BatchId, event_id: EventId, at: Timestamp) -> LedgerResult<UndelegateOutcome> {
        self.service
            .undelegate(self.base(caller, at, UndelegateRequest { batch_id, event_id }))
            .await
    }

    /// Config, TechCorp profile, a batch of 30 and its `Register` event at `T0`.
    pub async fn seed_techcorp(&self, batch_id: BatchId, event_id: EventId) -> ProductEvent {
        self.initialize(scenario_params())
            .await
            .expect("initialize");
        self.register(TECHCORP, "TechCorp", BusinessType::Manufacturer)
            .await
            .expect("register TechCorp");
        self.register_batch(TECHCORP, batch_id, 30)
            .await
            .expect("register batch");
        self.create_event(TECHCORP, batch_id, event_id, EventType::Register, T0)
            .await
            .expect("first event")
    }
}
