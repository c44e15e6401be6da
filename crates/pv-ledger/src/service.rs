//! Provenance Service - Core business logic
//!
//! Implements [`ProvenanceApi`] over [`LedgerState`]. The state lock is taken
//! once per synchronous phase and is never held across an outbound await.

use crate::algorithms::{verify_commitment, AuthenticityReport};
use crate::config::ServiceConfig;
use crate::domain::{
    ConfigParams, ConfigUpdate, DelegationRecord, LedgerConfig, LoggedUpdate,
    ManufacturerProfile, Operation, ProductBatch, ProductEvent, ProfileUpdate, UndelegateOutcome,
};
use crate::error::LedgerResult;
use crate::events::LedgerEvent;
use crate::metrics;
use crate::ports::inbound::{
    ActorGrant, ApproveManufacturer, CertifyAuthenticity, CreateEvent, DelegateRequest,
    ProvenanceApi, RecordUpdate, RegisterBatch, RegisterManufacturer, UndelegateRequest,
    UpdateVerification,
};
use crate::ports::outbound::{CommitmentOracle, RollupDomain, VerificationPolicy};
use crate::state::{CallContext, LedgerState, UndelegateStep};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{short_id, AuthenticatedRequest, BatchId, EventId, Identity, Timestamp};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Provenance service implementation
pub struct ProvenanceService<R, C, V>
where
    R: RollupDomain,
    C: CommitmentOracle,
    V: VerificationPolicy,
{
    config: ServiceConfig,
    state: Arc<RwLock<LedgerState>>,
    rollup: Arc<R>,
    commitments: Arc<C>,
    verification: Arc<V>,
}

impl<R, C, V> ProvenanceService<R, C, V>
where
    R: RollupDomain,
    C: CommitmentOracle,
    V: VerificationPolicy,
{
    /// Create a new provenance service
    pub fn new(config: ServiceConfig, rollup: Arc<R>, commitments: Arc<C>, verification: Arc<V>) -> Self {
        info!(
            "[pv-ledger] Service created for authority {} (rollup {})",
            short_id(&config.authority),
            rollup.domain_id()
        );
        let state = LedgerState::with_event_capacity(config.max_pending_events);
        Self {
            config,
            state: Arc::new(RwLock::new(state)),
            rollup,
            commitments,
            verification,
        }
    }

    pub fn service_config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Drain events emitted since the last call.
    pub fn take_events(&self) -> Vec<LedgerEvent> {
        self.state.write().take_events()
    }

    /// Whether `op` would currently pass the pause gate.
    pub fn is_operation_allowed(&self, op: Operation) -> bool {
        self.state
            .read()
            .policy
            .is_operation_allowed(&self.config.authority, op)
    }

    fn context<P>(&self, req: &AuthenticatedRequest<P>) -> CallContext {
        if !req.is_supported_version() {
            debug!(
                "[pv-ledger] Envelope version {} from {} not supported",
                req.version,
                short_id(&req.caller)
            );
        }
        CallContext {
            authority: self.config.authority,
            caller: req.caller,
            domain: req.domain,
            now: req.timestamp,
            version_supported: req.is_supported_version(),
        }
    }

    fn observe<T>(&self, op: &'static str, result: LedgerResult<T>) -> LedgerResult<T> {
        if let Err(e) = &result {
            debug!("[pv-ledger] {} rejected: {}", op, e);
            metrics::record_rejection(e.label());
        }
        result
    }

    fn sync_delegated_gauge(&self, state: &LedgerState) {
        metrics::set_units_delegated(state.units_in_flight());
    }

    async fn run_delegate(&self, req: AuthenticatedRequest<DelegateRequest>) -> LedgerResult<DelegationRecord> {
        let ctx = self.context(&req);
        let batch_id = req.payload.batch_id;

        let snapshot = {
            let mut state = self.state.write();
            let snapshot = state.begin_delegation(&ctx, &req.payload)?;
            self.sync_delegated_gauge(&state);
            snapshot
        };
        info!(
            "[pv-delegation] Batch {} Delegating to {} (event {})",
            short_id(&batch_id),
            self.rollup.domain_id(),
            short_id(&req.payload.event_id)
        );

        if let Err(e) = self.rollup.accept_delegation(snapshot).await {
            warn!(
                "[pv-delegation] Batch {} left Delegating, rollup did not acknowledge: {}",
                short_id(&batch_id),
                e
            );
            return Err(e);
        }

        let record = {
            let mut state = self.state.write();
            state.complete_delegation(&ctx, &batch_id, self.rollup.domain_id(), req.correlation_id)?
        };
        metrics::record_delegation();
        info!(
            "[pv-delegation] Batch {} Delegated (correlation {})",
            short_id(&batch_id),
            req.correlation_id
        );
        Ok(record)
    }

    async fn run_record_update(&self, req: AuthenticatedRequest<RecordUpdate>) -> LedgerResult<LoggedUpdate> {
        let ctx = self.context(&req);
        let batch_id = req.payload.batch_id;
        let event_id = req.payload.event_id;

        let update = {
            let state = self.state.read();
            state.prepare_rollup_update(&ctx, &req.payload)?
        };
        let logged = self.rollup.apply_update(batch_id, update).await?;

        {
            let mut state = self.state.write();
            state.note_rollup_update(&batch_id, &event_id, &logged);
        }
        metrics::record_rollup_update();
        debug!(
            "[pv-delegation] Batch {} rollup update #{} by {}",
            short_id(&batch_id),
            logged.sequence,
            short_id(&logged.actor)
        );
        Ok(logged)
    }

    async fn run_undelegate(&self, req: AuthenticatedRequest<UndelegateRequest>) -> LedgerResult<UndelegateOutcome> {
        let ctx = self.context(&req);
        let batch_id = req.payload.batch_id;

        let step = {
            let mut state = self.state.write();
            let step = state.begin_undelegation(&ctx, &req.payload, self.config.undelegation_timeout_secs)?;
            self.sync_delegated_gauge(&state);
            step
        };
        let record = match step {
            UndelegateStep::AlreadyResident => {
                debug!("[pv-delegation] Batch {} already Resident", short_id(&batch_id));
                return Ok(UndelegateOutcome::AlreadyResident);
            }
            UndelegateStep::Reconcile(record) => record,
        };
        info!(
            "[pv-delegation] Batch {} Undelegating from {:?}",
            short_id(&batch_id),
            record.rollup
        );

        let (final_state, submission) = self.rollup.commit_final(batch_id).await?;
        let proof = self.commitments.lookup(&submission).await?;
        if let Err(e) = verify_commitment(&proof, &final_state, self.config.required_confirmations) {
            warn!(
                "[pv-delegation] Batch {} stays Undelegating: {}",
                short_id(&batch_id),
                e
            );
            return Err(e);
        }

        let outcome = {
            let mut state = self.state.write();
            let outcome = state.merge_rollup_state(&ctx, final_state)?;
            self.sync_delegated_gauge(&state);
            outcome
        };

        if let UndelegateOutcome::Merged { total_events, .. } = outcome {
            metrics::record_undelegation();
            info!(
                "[pv-delegation] Batch {} Resident again, {} events after merge (block {})",
                short_id(&batch_id),
                total_events,
                proof.block_height
            );
        }

        if let Err(e) = self.rollup.release(batch_id).await {
            warn!(
                "[pv-delegation] Rollup replica of {} not released: {}",
                short_id(&batch_id),
                e
            );
        }
        Ok(outcome)
    }
}

#[async_trait]
impl<R, C, V> ProvenanceApi for ProvenanceService<R, C, V>
where
    R: RollupDomain + 'static,
    C: CommitmentOracle + 'static,
    V: VerificationPolicy + 'static,
{
    async fn initialize(&self, req: AuthenticatedRequest<ConfigParams>) -> LedgerResult<LedgerConfig> {
        let ctx = self.context(&req);
        let result = self.state.write().initialize(&ctx, req.payload);
        if result.is_ok() {
            info!(
                "[pv-ledger] Config initialized by {}",
                short_id(&self.config.authority)
            );
        }
        self.observe("initialize", result)
    }

    async fn update_config(&self, req: AuthenticatedRequest<ConfigUpdate>) -> LedgerResult<LedgerConfig> {
        let ctx = self.context(&req);
        let result = self.state.write().update_config(&ctx, &req.payload);
        if let Ok(config) = &result {
            info!("[pv-ledger] Config updated (paused={})", config.is_paused);
        }
        self.observe("update_config", result)
    }

    async fn register_manufacturer(
        &self,
        req: AuthenticatedRequest<RegisterManufacturer>,
    ) -> LedgerResult<ManufacturerProfile> {
        let verification = Arc::clone(&self.verification);
        let ctx = self.context(&req);
        let result = self
            .state
            .write()
            .register_manufacturer(&ctx, req.payload, |p| verification.should_verify(p));
        if let Ok(profile) = &result {
            info!(
                "[pv-ledger] Registered {} ({:?}, verified={})",
                profile.company_name,
                profile.business_type,
                profile.is_verified
            );
        }
        self.observe("register_manufacturer", result)
    }

    async fn update_profile(&self, req: AuthenticatedRequest<ProfileUpdate>) -> LedgerResult<ManufacturerProfile> {
        let ctx = self.context(&req);
        let result = self.state.write().update_profile(&ctx, &req.payload);
        self.observe("update_profile", result)
    }

    async fn approve_manufacturer(
        &self,
        req: AuthenticatedRequest<ApproveManufacturer>,
    ) -> LedgerResult<ManufacturerProfile> {
        let ctx = self.context(&req);
        let result = self
            .state
            .write()
            .approve_manufacturer(&ctx, &req.payload.owner);
        if let Ok(profile) = &result {
            info!("[pv-ledger] Approved {}", short_id(&profile.owner));
        }
        self.observe("approve_manufacturer", result)
    }

    async fn register_batch(&self, req: AuthenticatedRequest<RegisterBatch>) -> LedgerResult<ProductBatch> {
        let ctx = self.context(&req);
        let result = self.state.write().register_batch(&ctx, req.payload);
        if let Ok(batch) = &result {
            metrics::record_batch_registered();
            info!(
                "[pv-ledger] Batch {} registered by {} (size {})",
                short_id(&batch.batch_id),
                batch.manufacturer_name,
                batch.batch_size
            );
        }
        self.observe("register_batch", result)
    }

    async fn grant_actor(&self, req: AuthenticatedRequest<ActorGrant>) -> LedgerResult<bool> {
        let ctx = self.context(&req);
        let result = self.state.write().set_actor_permission(
            &ctx,
            &req.payload.batch_id,
            req.payload.actor,
            true,
        );
        self.observe("grant_actor", result)
    }

    async fn revoke_actor(&self, req: AuthenticatedRequest<ActorGrant>) -> LedgerResult<bool> {
        let ctx = self.context(&req);
        let result = self.state.write().set_actor_permission(
            &ctx,
            &req.payload.batch_id,
            req.payload.actor,
            false,
        );
        self.observe("revoke_actor", result)
    }

    async fn create_event(&self, req: AuthenticatedRequest<CreateEvent>) -> LedgerResult<ProductEvent> {
        let ctx = self.context(&req);
        let result = self.state.write().create_event(&ctx, req.payload);
        if let Ok(event) = &result {
            metrics::record_event_created();
            debug!(
                "[pv-ledger] {:?} event {} on batch {}",
                event.event_type,
                short_id(&event.event_id),
                short_id(&event.batch_id)
            );
        }
        self.observe("create_event", result)
    }

    async fn update_verification(
        &self,
        req: AuthenticatedRequest<UpdateVerification>,
    ) -> LedgerResult<ProductEvent> {
        let ctx = self.context(&req);
        let result = self.state.write().update_verification(&ctx, req.payload);
        self.observe("update_verification", result)
    }

    async fn certify_authenticity(
        &self,
        req: AuthenticatedRequest<CertifyAuthenticity>,
    ) -> LedgerResult<AuthenticityReport> {
        let ctx = self.context(&req);
        let result = self
            .state
            .write()
            .certify_authenticity(&ctx, &req.payload.batch_id);
        if result.is_ok() {
            info!(
                "[pv-ledger] Batch {} certified authentic",
                short_id(&req.payload.batch_id)
            );
        }
        self.observe("certify_authenticity", result)
    }

    async fn delegate(&self, req: AuthenticatedRequest<DelegateRequest>) -> LedgerResult<DelegationRecord> {
        let result = self.run_delegate(req).await;
        self.observe("delegate", result)
    }

    async fn record_update(&self, req: AuthenticatedRequest<RecordUpdate>) -> LedgerResult<LoggedUpdate> {
        let result = self.run_record_update(req).await;
        self.observe("record_update", result)
    }

    async fn undelegate(
        &self,
        req: AuthenticatedRequest<UndelegateRequest>,
    ) -> LedgerResult<UndelegateOutcome> {
        let result = self.run_undelegate(req).await;
        self.observe("undelegate", result)
    }

    fn config(&self) -> LedgerResult<LedgerConfig> {
        self.state
            .read()
            .policy
            .config(&self.config.authority)
            .cloned()
    }

    fn get_profile(&self, owner: &Identity) -> LedgerResult<ManufacturerProfile> {
        self.state.read().identities.get(owner).cloned()
    }

    fn get_batch(&self, batch_id: &BatchId) -> LedgerResult<ProductBatch> {
        self.state.read().batches.get(batch_id).cloned()
    }

    fn get_event(&self, event_id: &EventId) -> LedgerResult<ProductEvent> {
        self.state.read().get_event(event_id)
    }

    fn events_for_batch(&self, batch_id: &BatchId) -> LedgerResult<Vec<ProductEvent>> {
        self.state.read().events_for_batch(batch_id)
    }

    fn verify_authenticity(&self, batch_id: &BatchId) -> LedgerResult<AuthenticityReport> {
        self.state.read().verify_authenticity(batch_id)
    }

    fn delegation(&self, batch_id: &BatchId) -> Option<DelegationRecord> {
        self.state.read().delegations.get(batch_id).cloned()
    }

    fn stalled_delegations(&self, now: Timestamp) -> Vec<DelegationRecord> {
        self.state
            .read()
            .delegations
            .stalled(now, self.config.undelegation_timeout_secs)
    }
}
