//! # Delegation
//!
//! Control records for the base/rollup handoff and the rollup-side replica.
//!
//! ## Protocol
//!
//! ```text
//! base:    Resident ─delegate─→ Delegating ─ack─→ Delegated ─undelegate─→ Undelegating ─merge─→ Resident
//! rollup:                         accept_delegation   apply_update*        commit_final          release
//! ```
//!
//! The base ledger never reads the replica directly. It learns the rollup's
//! final state through `commit_final` and trusts it only after the matching
//! commitment proof has been checked.

use super::batch::ProductBatch;
use super::event_chain::ProductEvent;
use super::invariants::{invariant_event_capacity, MAX_METADATA_REF_LEN};
use super::rate_limit::MinIntervalGate;
use super::value_objects::{DelegationState, EventType, OrderStatus, ProductStatus};
use crate::algorithms::commitment::derive_event_id;
use crate::error::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use shared_types::{BatchId, DomainId, EventId, Identity, Timestamp};
use std::collections::HashMap;

/// Base-side control record for one delegated unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRecord {
    pub batch_id: BatchId,
    /// Event whose fields the rollup may update.
    pub event_id: EventId,
    pub state: DelegationState,
    /// Rollup domain holding mutation authority, once acknowledged.
    pub rollup: Option<DomainId>,
    pub requested_by: Identity,
    pub delegated_at: Timestamp,
    pub undelegation_requested_at: Option<Timestamp>,
}

impl DelegationRecord {
    /// Reference point for timeout decisions in the current state.
    fn pending_since(&self) -> Option<Timestamp> {
        match self.state {
            DelegationState::Resident => None,
            DelegationState::Delegating | DelegationState::Delegated => Some(self.delegated_at),
            DelegationState::Undelegating => {
                Some(self.undelegation_requested_at.unwrap_or(self.delegated_at))
            }
        }
    }

    /// True once the unit has sat outside `Resident` longer than `timeout_secs`.
    pub fn is_past_timeout(&self, now: Timestamp, timeout_secs: u64) -> bool {
        self.pending_since()
            .map(|since| now.saturating_sub(since) >= timeout_secs)
            .unwrap_or(false)
    }
}

/// Everything the rollup domain needs to take over a unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationSnapshot {
    pub batch: ProductBatch,
    pub event: ProductEvent,
    pub max_events_per_batch: u32,
    pub min_event_interval_secs: u64,
    pub taken_at: Timestamp,
}

/// One rollup-side update. `None` fields keep their prior value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupUpdate {
    pub event_id: EventId,
    pub product_status: Option<ProductStatus>,
    pub order_status: Option<OrderStatus>,
    pub event_type: Option<EventType>,
    pub metadata_ref: Option<String>,
    pub actor: Identity,
    pub timestamp: Timestamp,
}

/// An accepted rollup update, as it will be materialized on merge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedUpdate {
    pub derived_event_id: EventId,
    /// Absolute position in the batch's event count.
    pub sequence: u32,
    pub actor: Identity,
    pub product_status: ProductStatus,
    pub event_type: EventType,
    pub order_status: OrderStatus,
    pub metadata_ref: Option<String>,
    pub timestamp: Timestamp,
}

/// Rollup-side state of a delegated unit. Its bincode encoding is what the
/// commitment state root covers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupState {
    pub batch_id: BatchId,
    pub event_id: EventId,
    pub status: ProductStatus,
    pub total_events: u32,
    pub last_event_timestamp: Option<Timestamp>,
    pub event_type: EventType,
    pub order_status: OrderStatus,
    pub metadata_ref: Option<String>,
    pub event_updated_at: Timestamp,
    pub log: Vec<LoggedUpdate>,
}

impl RollupState {
    pub fn from_snapshot(snapshot: &DelegationSnapshot) -> Self {
        Self {
            batch_id: snapshot.batch.batch_id,
            event_id: snapshot.event.event_id,
            status: snapshot.batch.status,
            total_events: snapshot.batch.total_events,
            last_event_timestamp: snapshot.batch.last_event_timestamp,
            event_type: snapshot.event.event_type,
            order_status: snapshot.event.order_status,
            metadata_ref: snapshot.event.metadata_ref.clone(),
            event_updated_at: snapshot.event.updated_at,
            log: Vec::new(),
        }
    }
}

/// The rollup domain's working copy of a unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupReplica {
    pub state: RollupState,
    pub manufacturer: Identity,
    pub permitted_actors: Vec<Identity>,
    pub gate: MinIntervalGate,
    pub max_events_per_batch: u32,
    /// Set by `commit_final`; a committed replica accepts no further updates.
    pub committed: bool,
}

impl RollupReplica {
    pub fn from_snapshot(snapshot: &DelegationSnapshot) -> Self {
        Self {
            state: RollupState::from_snapshot(snapshot),
            manufacturer: snapshot.batch.manufacturer,
            permitted_actors: snapshot.batch.permitted_actors.iter().copied().collect(),
            gate: MinIntervalGate::new(snapshot.min_event_interval_secs),
            max_events_per_batch: snapshot.max_events_per_batch,
            committed: false,
        }
    }

    /// Apply one update atomically: every check runs before any field changes.
    pub fn apply(&mut self, update: &RollupUpdate) -> LedgerResult<&LoggedUpdate> {
        if self.committed {
            return Err(LedgerError::NotDelegated {
                state: "committed".into(),
            });
        }
        if update.event_id != self.state.event_id {
            return Err(LedgerError::NotDelegated {
                state: format!("event {} not delegated", hex::encode(update.event_id)),
            });
        }
        if update.actor != self.manufacturer && !self.permitted_actors.contains(&update.actor) {
            return Err(LedgerError::unauthorized(
                "only the manufacturer or a permitted actor may update a delegated batch",
            ));
        }
        if let Some(meta) = &update.metadata_ref {
            if meta.len() > MAX_METADATA_REF_LEN {
                return Err(LedgerError::InvalidMetadata {
                    field: "metadata_ref",
                    reason: format!(
                        "{} bytes exceeds limit of {}",
                        meta.len(),
                        MAX_METADATA_REF_LEN
                    ),
                });
            }
        }
        self.gate
            .check(self.state.last_event_timestamp, update.timestamp)?;
        invariant_event_capacity(self.state.total_events, self.max_events_per_batch)?;

        let state = &mut self.state;
        if let Some(status) = update.product_status {
            state.status = status;
        }
        if let Some(order_status) = update.order_status {
            state.order_status = order_status;
        }
        if let Some(event_type) = update.event_type {
            state.event_type = event_type;
        }
        if let Some(meta) = &update.metadata_ref {
            state.metadata_ref = Some(meta.clone());
        }

        let sequence = state.total_events;
        state.total_events += 1;
        state.last_event_timestamp = Some(update.timestamp);
        state.event_updated_at = update.timestamp;

        state.log.push(LoggedUpdate {
            derived_event_id: derive_event_id(&state.batch_id, &state.event_id, sequence),
            sequence,
            actor: update.actor,
            product_status: state.status,
            event_type: state.event_type,
            order_status: state.order_status,
            metadata_ref: state.metadata_ref.clone(),
            timestamp: update.timestamp,
        });

        let logged = state.log.len() - 1;
        Ok(&state.log[logged])
    }
}

/// Result of an `undelegate` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UndelegateOutcome {
    /// The unit was already resident; nothing changed.
    AlreadyResident,
    /// Rollup state was verified and merged back.
    Merged {
        total_events: u32,
        final_status: ProductStatus,
        final_order_status: OrderStatus,
    },
}

/// Control records, one per batch that has ever been delegated.
#[derive(Debug, Default)]
pub struct DelegationRegistry {
    records: HashMap<BatchId, DelegationRecord>,
}

impl DelegationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, batch_id: &BatchId) -> Option<&DelegationRecord> {
        self.records.get(batch_id)
    }

    pub fn get_mut(&mut self, batch_id: &BatchId) -> LedgerResult<&mut DelegationRecord> {
        self.records
            .get_mut(batch_id)
            .ok_or_else(|| LedgerError::not_found("delegation", batch_id))
    }

    pub fn upsert(&mut self, record: DelegationRecord) {
        self.records.insert(record.batch_id, record);
    }

    /// Records outside `Resident` past `timeout_secs`, oldest first.
    pub fn stalled(&self, now: Timestamp, timeout_secs: u64) -> Vec<DelegationRecord> {
        let mut stalled: Vec<_> = self
            .records
            .values()
            .filter(|r| r.state.is_in_flight() && r.is_past_timeout(now, timeout_secs))
            .cloned()
            .collect();
        stalled.sort_by_key(|r| r.pending_since().unwrap_or(0));
        stalled
    }
}
