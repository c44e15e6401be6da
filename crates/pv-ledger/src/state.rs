//! Ledger state
//!
//! Every transition here is synchronous and runs under the service's write
//! lock, so each one is a single atomic state change. Cross-domain steps are
//! split into a `begin_*` and a `complete_*`/`merge_*` half; the service
//! performs the outbound call between them without holding the lock.

use crate::algorithms::{replay_chain, AuthenticityReport};
use crate::domain::{
    invariant_below_cap, invariant_event_capacity, invariant_metadata_ref, ConfigParams,
    ConfigUpdate, DelegationRecord, DelegationRegistry, DelegationSnapshot, DelegationState,
    EventChain, IdentityRegistry, LedgerConfig, LoggedUpdate, ManufacturerProfile, NewEvent,
    Operation, PolicyStore, ProductBatch, ProductEvent, ProfileUpdate, RollupState, RollupUpdate,
    UndelegateOutcome, BatchLedger, VerificationStatus,
};
use crate::config::DEFAULT_MAX_PENDING_EVENTS;
use crate::error::{LedgerError, LedgerResult};
use crate::events::{EventCreatedEvent, LedgerEvent, StateUpdatedEvent, SupplyChainCompletedEvent};
use crate::ports::inbound::{
    CreateEvent, DelegateRequest, RecordUpdate, RegisterBatch, RegisterManufacturer,
    UndelegateRequest, UpdateVerification,
};
use shared_types::{BatchId, DomainId, EventId, Identity, Timestamp};
use std::collections::{HashSet, VecDeque};
use tracing::debug;
use uuid::Uuid;

/// Who is calling, on which domain, at what domain time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub authority: Identity,
    pub caller: Identity,
    pub domain: DomainId,
    pub now: Timestamp,
    /// Whether the request envelope version is one this ledger understands
    pub version_supported: bool,
}

/// What `begin_undelegation` decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UndelegateStep {
    /// Nothing to do; the unit is already resident.
    AlreadyResident,
    /// The unit is `Undelegating`; fetch and verify the rollup state.
    Reconcile(DelegationRecord),
}

pub struct LedgerState {
    pub policy: PolicyStore,
    pub identities: IdentityRegistry,
    pub batches: BatchLedger,
    pub events: EventChain,
    pub delegations: DelegationRegistry,
    /// Outgoing events not yet drained, oldest first
    pending_events: VecDeque<LedgerEvent>,
    max_pending_events: usize,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerState {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_MAX_PENDING_EVENTS)
    }

    /// Keep at most `max_pending_events` undrained events.
    pub fn with_event_capacity(max_pending_events: usize) -> Self {
        Self {
            policy: PolicyStore::new(),
            identities: IdentityRegistry::new(),
            batches: BatchLedger::new(),
            events: EventChain::new(),
            delegations: DelegationRegistry::new(),
            pending_events: VecDeque::new(),
            max_pending_events,
        }
    }

    /// Buffer an outgoing event, dropping the oldest once the buffer is full.
    fn emit(&mut self, event: LedgerEvent) {
        if self.max_pending_events == 0 {
            return;
        }
        while self.pending_events.len() >= self.max_pending_events {
            if let Some(dropped) = self.pending_events.pop_front() {
                debug!("[pv-ledger] Event buffer full, dropped {}", dropped.name());
            }
        }
        self.pending_events.push_back(event);
    }

    /// Reject envelopes this ledger cannot interpret.
    fn require_supported_version(ctx: &CallContext) -> LedgerResult<()> {
        if !ctx.version_supported {
            return Err(LedgerError::unauthorized("unsupported envelope version"));
        }
        Ok(())
    }

    /// Pause gate, envelope version, then domain routing. Returns the config
    /// to run against.
    ///
    /// `RecordUpdate` executes on a rollup domain, `Undelegate` may be driven
    /// from either side, everything else is base-domain only.
    pub fn admit(&self, ctx: &CallContext, op: Operation) -> LedgerResult<LedgerConfig> {
        let config = self.policy.gate(&ctx.authority, op)?.clone();
        Self::require_supported_version(ctx)?;
        match op {
            Operation::RecordUpdate | Operation::Undelegate => {}
            _ if !ctx.domain.is_base() => {
                return Err(LedgerError::NotDelegated {
                    state: format!("{:?} is a base-domain operation, sent to {}", op, ctx.domain),
                });
            }
            _ => {}
        }
        Ok(config)
    }

    // =========================================================================
    // POLICY
    // =========================================================================

    pub fn initialize(&mut self, ctx: &CallContext, params: ConfigParams) -> LedgerResult<LedgerConfig> {
        if matches!(self.policy.config(&ctx.authority), Ok(existing) if existing.is_paused) {
            return Err(LedgerError::Paused);
        }
        Self::require_supported_version(ctx)?;
        if ctx.caller != ctx.authority {
            return Err(LedgerError::unauthorized(
                "only the authority may initialize its config",
            ));
        }
        if !ctx.domain.is_base() {
            return Err(LedgerError::NotDelegated {
                state: format!("initialize sent to {}", ctx.domain),
            });
        }
        let config = self
            .policy
            .initialize(ctx.authority, params, ctx.now)?
            .clone();
        self.emit(LedgerEvent::ConfigInitialized {
            authority: ctx.authority,
            timestamp: ctx.now,
        });
        Ok(config)
    }

    pub fn update_config(&mut self, ctx: &CallContext, update: &ConfigUpdate) -> LedgerResult<LedgerConfig> {
        let current = self.admit(ctx, Operation::UpdateConfig)?;
        if ctx.caller != current.authority {
            return Err(LedgerError::unauthorized(
                "only the authority may update the config",
            ));
        }
        if let Some(max_events) = update.max_events_per_batch {
            let busiest = self.batches.max_total_events();
            if busiest > max_events {
                return Err(LedgerError::InvalidConfig {
                    field: "max_events_per_batch",
                    reason: format!(
                        "{} is below an existing batch holding {} events",
                        max_events, busiest
                    ),
                });
            }
        }
        let config = self
            .policy
            .update_config(&ctx.authority, &ctx.caller, update, ctx.now)?
            .clone();
        self.emit(LedgerEvent::ConfigUpdated {
            authority: ctx.authority,
            is_paused: config.is_paused,
            timestamp: ctx.now,
        });
        Ok(config)
    }

    // =========================================================================
    // IDENTITY
    // =========================================================================

    pub fn register_manufacturer(
        &mut self,
        ctx: &CallContext,
        payload: RegisterManufacturer,
        verify: impl FnOnce(&ManufacturerProfile) -> bool,
    ) -> LedgerResult<ManufacturerProfile> {
        let config = self.admit(ctx, Operation::RegisterManufacturer)?;
        let profile = self
            .identities
            .register(
                ctx.caller,
                payload.company_name,
                payload.business_type,
                payload.certifications,
                config.max_participants_or_batches,
                ctx.now,
                verify,
            )?
            .clone();
        self.emit(LedgerEvent::ManufacturerRegistered {
            owner: profile.owner,
            company_name: profile.company_name.clone(),
            is_verified: profile.is_verified,
            timestamp: ctx.now,
        });
        Ok(profile)
    }

    pub fn update_profile(&mut self, ctx: &CallContext, update: &ProfileUpdate) -> LedgerResult<ManufacturerProfile> {
        self.admit(ctx, Operation::UpdateProfile)?;
        Ok(self.identities.update(&ctx.caller, update)?.clone())
    }

    pub fn approve_manufacturer(&mut self, ctx: &CallContext, owner: &Identity) -> LedgerResult<ManufacturerProfile> {
        let config = self.admit(ctx, Operation::ApproveManufacturer)?;
        if ctx.caller != config.authority {
            return Err(LedgerError::unauthorized(
                "only the authority may approve manufacturers",
            ));
        }
        let profile = self.identities.approve(owner)?.clone();
        self.emit(LedgerEvent::ManufacturerApproved {
            owner: *owner,
            timestamp: ctx.now,
        });
        Ok(profile)
    }

    // =========================================================================
    // BATCHES
    // =========================================================================

    pub fn register_batch(&mut self, ctx: &CallContext, payload: RegisterBatch) -> LedgerResult<ProductBatch> {
        let config = self.admit(ctx, Operation::RegisterBatch)?;
        let profile = self.identities.require_verified(&ctx.caller)?;
        let manufacturer_name = profile.company_name.clone();
        let registered = profile.registered_batch_count;

        self.batches.validate_new(
            &payload.batch_id,
            &payload.metadata_ref,
            payload.batch_size,
            config.max_batch_size,
        )?;
        invariant_below_cap(
            registered,
            config.max_participants_or_batches,
            "batches per manufacturer",
        )?;

        let batch = self
            .batches
            .insert(
                payload.batch_id,
                ctx.caller,
                manufacturer_name,
                payload.metadata_ref,
                payload.category,
                payload.batch_size,
                ctx.now,
            )?
            .clone();
        self.identities.increment_batch_count(&ctx.caller)?;

        self.emit(LedgerEvent::BatchRegistered {
            batch_id: batch.batch_id,
            manufacturer: batch.manufacturer,
            batch_size: batch.batch_size,
            timestamp: ctx.now,
        });
        Ok(batch)
    }

    pub fn set_actor_permission(
        &mut self,
        ctx: &CallContext,
        batch_id: &BatchId,
        actor: Identity,
        granted: bool,
    ) -> LedgerResult<bool> {
        let op = if granted {
            Operation::GrantActor
        } else {
            Operation::RevokeActor
        };
        self.admit(ctx, op)?;
        let changed = if granted {
            self.batches.grant_actor(&ctx.caller, batch_id, actor, ctx.now)?
        } else {
            self.batches
                .revoke_actor(&ctx.caller, batch_id, &actor, ctx.now)?
        };
        if changed {
            self.emit(LedgerEvent::ActorPermissionChanged {
                batch_id: *batch_id,
                actor,
                granted,
                timestamp: ctx.now,
            });
        }
        Ok(changed)
    }

    /// Authority, batch manufacturer, or a verified quality inspector.
    fn is_verifier(&self, config: &LedgerConfig, batch: &ProductBatch, caller: &Identity) -> bool {
        caller == &config.authority
            || caller == &batch.manufacturer
            || self
                .identities
                .find(caller)
                .map(ManufacturerProfile::is_verified_inspector)
                .unwrap_or(false)
    }

    pub fn certify_authenticity(&mut self, ctx: &CallContext, batch_id: &BatchId) -> LedgerResult<AuthenticityReport> {
        let config = self.admit(ctx, Operation::CertifyAuthenticity)?;
        let batch = self.batches.get(batch_id)?;
        batch.require_resident()?;
        if !self.is_verifier(&config, batch, &ctx.caller) {
            return Err(LedgerError::unauthorized(
                "only an authorized verifier may certify authenticity",
            ));
        }

        let report = replay_chain(batch, &self.events);
        if !report.is_certifiable() {
            return Err(LedgerError::InvalidTransition {
                from: format!(
                    "chain intact={} all_verified={} events={}",
                    report.chain_intact,
                    report.all_verified,
                    report.events.len()
                ),
                to: "certified".into(),
            });
        }

        let batch = self.batches.get_mut(batch_id)?;
        batch.authenticity_verified = true;
        batch.last_updated = ctx.now;
        self.emit(LedgerEvent::AuthenticityCertified {
            batch_id: *batch_id,
            verifier: ctx.caller,
            timestamp: ctx.now,
        });
        Ok(AuthenticityReport {
            authenticity_verified: true,
            ..report
        })
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    pub fn create_event(&mut self, ctx: &CallContext, payload: CreateEvent) -> LedgerResult<ProductEvent> {
        let config = self.admit(ctx, Operation::CreateEvent)?;
        let batch = self.batches.get(&payload.batch_id)?;
        batch.require_resident()?;

        if self.events.contains(&payload.event_id) {
            return Err(LedgerError::duplicate("event", &payload.event_id));
        }
        invariant_event_capacity(batch.total_events, config.max_events_per_batch)?;

        if !batch.may_log_events(&ctx.caller) {
            return Err(LedgerError::unauthorized(
                "caller is neither the manufacturer nor a permitted actor",
            ));
        }
        if ctx.caller != batch.manufacturer {
            if let Some(role) = payload.event_type.required_role() {
                let holds_role = self
                    .identities
                    .find(&ctx.caller)
                    .map(|p| p.business_type == role)
                    .unwrap_or(false);
                if !holds_role {
                    return Err(LedgerError::unauthorized(format!(
                        "{:?} events require a {:?} profile",
                        payload.event_type, role
                    )));
                }
            }
        }
        if let Some(meta) = &payload.metadata_ref {
            invariant_metadata_ref(meta)?;
        }
        if batch.total_events > 0 {
            config
                .rate_gate()
                .check(batch.last_event_timestamp, ctx.now)?;
        }

        let event = self
            .events
            .append(
                NewEvent {
                    event_id: payload.event_id,
                    batch_id: payload.batch_id,
                    actor: ctx.caller,
                    event_type: payload.event_type,
                    order_status: payload.order_status,
                    metadata_ref: payload.metadata_ref,
                    timestamp: ctx.now,
                },
                payload.previous_event,
            )?
            .clone();

        let batch = self.batches.get_mut(&payload.batch_id)?;
        batch.total_events += 1;
        batch.last_event_timestamp = Some(ctx.now);
        batch.last_updated = ctx.now;
        batch.authenticity_verified = false;

        self.emit(LedgerEvent::EventCreated(EventCreatedEvent {
            event_id: event.event_id,
            batch_id: event.batch_id,
            event_type: event.event_type,
            actor: event.actor,
            timestamp: ctx.now,
        }));
        Ok(event)
    }

    pub fn update_verification(&mut self, ctx: &CallContext, payload: UpdateVerification) -> LedgerResult<ProductEvent> {
        let config = self.admit(ctx, Operation::UpdateVerification)?;
        let batch_id = self.events.get(&payload.event_id)?.batch_id;
        let batch = self.batches.get(&batch_id)?;
        batch.require_resident()?;
        if !self.is_verifier(&config, batch, &ctx.caller) {
            return Err(LedgerError::unauthorized(
                "only an authorized verifier may update verification",
            ));
        }

        let event = self
            .events
            .update_verification(&payload.event_id, payload.status, ctx.now)?
            .clone();
        if event.verification_status == VerificationStatus::Rejected {
            let batch = self.batches.get_mut(&batch_id)?;
            batch.authenticity_verified = false;
            batch.last_updated = ctx.now;
        }
        self.emit(LedgerEvent::VerificationUpdated {
            event_id: event.event_id,
            status: event.verification_status,
            verifier: ctx.caller,
            timestamp: ctx.now,
        });
        Ok(event)
    }

    // =========================================================================
    // DELEGATION
    // =========================================================================

    /// Resident → Delegating, or resume an interrupted handoff.
    pub fn begin_delegation(&mut self, ctx: &CallContext, req: &DelegateRequest) -> LedgerResult<DelegationSnapshot> {
        let config = self.admit(ctx, Operation::Delegate)?;
        let batch = self.batches.get(&req.batch_id)?;
        batch.require_manufacturer(&ctx.caller, "delegate it")?;
        let event = self.events.get(&req.event_id)?;
        if event.batch_id != req.batch_id {
            return Err(LedgerError::not_found("event in batch", &req.event_id));
        }

        let delegated_at = match batch.delegation {
            DelegationState::Resident => ctx.now,
            DelegationState::Delegating => match self.delegations.get(&req.batch_id) {
                Some(record) if record.event_id == req.event_id => record.delegated_at,
                _ => {
                    return Err(LedgerError::NotResident {
                        state: "Delegating for another event".into(),
                    })
                }
            },
            DelegationState::Delegated | DelegationState::Undelegating => {
                return Err(LedgerError::NotResident {
                    state: batch.delegation.to_string(),
                })
            }
        };
        let event = event.clone();

        let batch = self.batches.get_mut(&req.batch_id)?;
        if batch.delegation == DelegationState::Resident {
            batch.transition_delegation(DelegationState::Delegating)?;
            self.delegations.upsert(DelegationRecord {
                batch_id: req.batch_id,
                event_id: req.event_id,
                state: DelegationState::Delegating,
                rollup: None,
                requested_by: ctx.caller,
                delegated_at,
                undelegation_requested_at: None,
            });
        }

        Ok(DelegationSnapshot {
            batch: batch.clone(),
            event,
            max_events_per_batch: config.max_events_per_batch,
            min_event_interval_secs: config.min_event_interval_secs,
            taken_at: delegated_at,
        })
    }

    /// Delegating → Delegated once the rollup domain acknowledged.
    pub fn complete_delegation(
        &mut self,
        ctx: &CallContext,
        batch_id: &BatchId,
        rollup: DomainId,
        correlation_id: Uuid,
    ) -> LedgerResult<DelegationRecord> {
        let batch = self.batches.get_mut(batch_id)?;
        batch.transition_delegation(DelegationState::Delegated)?;
        batch.last_updated = ctx.now;

        let record = self.delegations.get_mut(batch_id)?;
        record.state = DelegationState::Delegated;
        record.rollup = Some(rollup);
        let record = record.clone();

        self.emit(LedgerEvent::DelegationStarted {
            batch_id: *batch_id,
            event_id: record.event_id,
            rollup,
            correlation_id,
            timestamp: ctx.now,
        });
        Ok(record)
    }

    /// Check a rollup-side update before it is sent to the rollup domain.
    pub fn prepare_rollup_update(&self, ctx: &CallContext, payload: &RecordUpdate) -> LedgerResult<RollupUpdate> {
        self.admit(ctx, Operation::RecordUpdate)?;
        let batch = self.batches.get(&payload.batch_id)?;
        if !batch.delegation.accepts_rollup_writes() {
            return Err(LedgerError::NotDelegated {
                state: batch.delegation.to_string(),
            });
        }
        let record = self
            .delegations
            .get(&payload.batch_id)
            .ok_or_else(|| LedgerError::not_found("delegation", &payload.batch_id))?;

        if Some(ctx.domain) != record.rollup {
            if ctx.domain.is_base() {
                return Err(LedgerError::NotResident {
                    state: batch.delegation.to_string(),
                });
            }
            return Err(LedgerError::NotDelegated {
                state: format!("batch held by another domain, not {}", ctx.domain),
            });
        }
        if payload.event_id != record.event_id {
            return Err(LedgerError::NotDelegated {
                state: format!("event {} not delegated", hex::encode(payload.event_id)),
            });
        }

        Ok(RollupUpdate {
            event_id: payload.event_id,
            product_status: payload.product_status,
            order_status: payload.order_status,
            event_type: payload.event_type,
            metadata_ref: payload.metadata_ref.clone(),
            actor: ctx.caller,
            timestamp: ctx.now,
        })
    }

    /// Record an update the rollup domain accepted.
    pub fn note_rollup_update(&mut self, batch_id: &BatchId, event_id: &EventId, logged: &LoggedUpdate) {
        self.emit(LedgerEvent::StateUpdated(StateUpdatedEvent {
            batch_id: *batch_id,
            event_id: *event_id,
            updated_by: logged.actor,
            batch_status: logged.product_status,
            order_status: logged.order_status,
            event_type: logged.event_type,
            timestamp: logged.timestamp,
        }));
    }

    /// Delegated → Undelegating, or decide nothing needs doing.
    pub fn begin_undelegation(
        &mut self,
        ctx: &CallContext,
        req: &UndelegateRequest,
        timeout_secs: u64,
    ) -> LedgerResult<UndelegateStep> {
        let config = self.admit(ctx, Operation::Undelegate)?;
        let batch = self.batches.get(&req.batch_id)?;

        match batch.delegation {
            DelegationState::Resident => return Ok(UndelegateStep::AlreadyResident),
            DelegationState::Delegating => {
                return Err(LedgerError::NotDelegated {
                    state: batch.delegation.to_string(),
                })
            }
            DelegationState::Delegated | DelegationState::Undelegating => {}
        }

        let record = self
            .delegations
            .get(&req.batch_id)
            .ok_or_else(|| LedgerError::not_found("delegation", &req.batch_id))?;
        if record.event_id != req.event_id {
            return Err(LedgerError::NotDelegated {
                state: format!("event {} not delegated", hex::encode(req.event_id)),
            });
        }

        let is_manufacturer = ctx.caller == batch.manufacturer;
        let authority_override =
            ctx.caller == config.authority && record.is_past_timeout(ctx.now, timeout_secs);
        if !is_manufacturer && !authority_override {
            return Err(LedgerError::unauthorized(
                "only the manufacturer, or the authority after the undelegation timeout, may undelegate",
            ));
        }

        if batch.delegation == DelegationState::Delegated {
            self.batches
                .get_mut(&req.batch_id)?
                .transition_delegation(DelegationState::Undelegating)?;
            let record = self.delegations.get_mut(&req.batch_id)?;
            record.state = DelegationState::Undelegating;
            record.undelegation_requested_at = Some(ctx.now);
        }

        let record = self.delegations.get_mut(&req.batch_id)?.clone();
        Ok(UndelegateStep::Reconcile(record))
    }

    /// Merge verified rollup state and return the unit to `Resident`.
    ///
    /// Every check runs before the first write.
    pub fn merge_rollup_state(&mut self, ctx: &CallContext, final_state: RollupState) -> LedgerResult<UndelegateOutcome> {
        let config = self.policy.config(&ctx.authority)?.clone();
        let batch_id = final_state.batch_id;
        let batch = self.batches.get(&batch_id)?;

        match batch.delegation {
            DelegationState::Resident => return Ok(UndelegateOutcome::AlreadyResident),
            DelegationState::Undelegating => {}
            DelegationState::Delegating | DelegationState::Delegated => {
                return Err(LedgerError::InvalidTransition {
                    from: batch.delegation.to_string(),
                    to: DelegationState::Resident.to_string(),
                })
            }
        }

        let record = self
            .delegations
            .get(&batch_id)
            .ok_or_else(|| LedgerError::not_found("delegation", &batch_id))?;
        if record.event_id != final_state.event_id {
            return Err(LedgerError::InvalidCommitment {
                reason: "committed state is for another event".into(),
            });
        }

        let base_count = self.events.count(&batch_id);
        let log_len = u32::try_from(final_state.log.len()).unwrap_or(u32::MAX);
        if base_count.saturating_add(log_len) != final_state.total_events {
            return Err(LedgerError::InvalidCommitment {
                reason: format!(
                    "{} base events + {} rollup updates != {} total events",
                    base_count, log_len, final_state.total_events
                ),
            });
        }
        if final_state.total_events > config.max_events_per_batch {
            return Err(LedgerError::CapacityExceeded {
                what: "events per batch",
                limit: config.max_events_per_batch,
            });
        }
        let mut seen = HashSet::new();
        for logged in &final_state.log {
            if self.events.contains(&logged.derived_event_id) || !seen.insert(logged.derived_event_id) {
                return Err(LedgerError::InvalidCommitment {
                    reason: format!(
                        "derived event id {} already in use",
                        hex::encode(logged.derived_event_id)
                    ),
                });
            }
        }

        for logged in &final_state.log {
            self.events.append(
                NewEvent {
                    event_id: logged.derived_event_id,
                    batch_id,
                    actor: logged.actor,
                    event_type: logged.event_type,
                    order_status: logged.order_status,
                    metadata_ref: logged.metadata_ref.clone(),
                    timestamp: logged.timestamp,
                },
                None,
            )?;
        }

        let event = self.events.get_mut(&final_state.event_id)?;
        event.event_type = final_state.event_type;
        event.order_status = final_state.order_status;
        event.metadata_ref = final_state.metadata_ref.clone();
        event.updated_at = final_state.event_updated_at;
        let verification_status = event.verification_status;

        let batch = self.batches.get_mut(&batch_id)?;
        batch.status = final_state.status;
        batch.total_events = final_state.total_events;
        batch.last_event_timestamp = final_state.last_event_timestamp;
        batch.last_updated = ctx.now;
        if !final_state.log.is_empty() {
            batch.authenticity_verified = false;
        }
        batch.transition_delegation(DelegationState::Resident)?;

        let record = self.delegations.get_mut(&batch_id)?;
        record.state = DelegationState::Resident;

        self.emit(LedgerEvent::SupplyChainCompleted(SupplyChainCompletedEvent {
            batch_id,
            event_id: final_state.event_id,
            final_status: final_state.status,
            final_order_status: final_state.order_status,
            verification_status,
            total_events: final_state.total_events,
            completed_by: ctx.caller,
            completion_timestamp: ctx.now,
        }));

        Ok(UndelegateOutcome::Merged {
            total_events: final_state.total_events,
            final_status: final_state.status,
            final_order_status: final_state.order_status,
        })
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn events_for_batch(&self, batch_id: &BatchId) -> LedgerResult<Vec<ProductEvent>> {
        self.batches.get(batch_id)?;
        Ok(self
            .events
            .events_for_batch(batch_id)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn verify_authenticity(&self, batch_id: &BatchId) -> LedgerResult<AuthenticityReport> {
        let batch = self.batches.get(batch_id)?;
        Ok(replay_chain(batch, &self.events))
    }

    pub fn get_event(&self, event_id: &EventId) -> LedgerResult<ProductEvent> {
        self.events.get(event_id).cloned()
    }

    pub fn units_in_flight(&self) -> usize {
        self.batches
            .in_flight()
            .count()
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        self.pending_events.drain(..).collect()
    }
}
