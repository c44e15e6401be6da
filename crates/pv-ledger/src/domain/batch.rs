//! # Batch Ledger
//!
//! Aggregate root per product batch. Batches are never deleted.

use super::invariants::{invariant_batch_size, invariant_metadata_ref};
use super::value_objects::{DelegationState, ProductCategory, ProductStatus};
use crate::error::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use shared_types::{BatchId, Identity, Timestamp};
use std::collections::{BTreeSet, HashMap};

/// A registered product batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductBatch {
    pub batch_id: BatchId,
    pub manufacturer: Identity,
    /// Company name at registration time.
    pub manufacturer_name: String,
    pub metadata_ref: String,
    pub batch_size: u32,
    pub category: ProductCategory,
    pub status: ProductStatus,
    /// Always equals the number of chain entries for this batch.
    pub total_events: u32,
    pub authenticity_verified: bool,
    pub delegation: DelegationState,
    pub last_event_timestamp: Option<Timestamp>,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
    /// Actors the manufacturer allowed to log events.
    pub permitted_actors: BTreeSet<Identity>,
}

impl ProductBatch {
    /// Base-domain writes require the unit to be resident.
    pub fn require_resident(&self) -> LedgerResult<()> {
        if !self.delegation.accepts_base_writes() {
            return Err(LedgerError::NotResident {
                state: self.delegation.to_string(),
            });
        }
        Ok(())
    }

    pub fn require_manufacturer(&self, caller: &Identity, action: &str) -> LedgerResult<()> {
        if caller != &self.manufacturer {
            return Err(LedgerError::unauthorized(format!(
                "only the batch manufacturer may {}",
                action
            )));
        }
        Ok(())
    }

    /// Manufacturer or an explicitly permitted actor.
    pub fn may_log_events(&self, actor: &Identity) -> bool {
        actor == &self.manufacturer || self.permitted_actors.contains(actor)
    }

    /// Move the delegation state machine along one edge.
    pub fn transition_delegation(&mut self, next: DelegationState) -> LedgerResult<()> {
        if !self.delegation.can_transition_to(next) {
            return Err(LedgerError::InvalidTransition {
                from: self.delegation.to_string(),
                to: next.to_string(),
            });
        }
        self.delegation = next;
        Ok(())
    }
}

/// Batch store.
#[derive(Debug, Default)]
pub struct BatchLedger {
    batches: HashMap<BatchId, ProductBatch>,
}

impl BatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn contains(&self, batch_id: &BatchId) -> bool {
        self.batches.contains_key(batch_id)
    }

    /// Shape checks for a new batch, before anything is written.
    pub fn validate_new(
        &self,
        batch_id: &BatchId,
        metadata_ref: &str,
        batch_size: u32,
        max_batch_size: u32,
    ) -> LedgerResult<()> {
        invariant_batch_size(batch_size, max_batch_size)?;
        invariant_metadata_ref(metadata_ref)?;
        if self.contains(batch_id) {
            return Err(LedgerError::duplicate("batch", batch_id));
        }
        Ok(())
    }

    /// Insert a validated batch with `status=Created` and zero events.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &mut self,
        batch_id: BatchId,
        manufacturer: Identity,
        manufacturer_name: String,
        metadata_ref: String,
        category: ProductCategory,
        batch_size: u32,
        now: Timestamp,
    ) -> LedgerResult<&ProductBatch> {
        if self.contains(&batch_id) {
            return Err(LedgerError::duplicate("batch", &batch_id));
        }
        let batch = ProductBatch {
            batch_id,
            manufacturer,
            manufacturer_name,
            metadata_ref,
            batch_size,
            category,
            status: ProductStatus::Created,
            total_events: 0,
            authenticity_verified: false,
            delegation: DelegationState::Resident,
            last_event_timestamp: None,
            created_at: now,
            last_updated: now,
            permitted_actors: BTreeSet::new(),
        };
        Ok(&*self.batches.entry(batch_id).or_insert(batch))
    }

    pub fn get(&self, batch_id: &BatchId) -> LedgerResult<&ProductBatch> {
        self.batches
            .get(batch_id)
            .ok_or_else(|| LedgerError::not_found("batch", batch_id))
    }

    pub fn get_mut(&mut self, batch_id: &BatchId) -> LedgerResult<&mut ProductBatch> {
        self.batches
            .get_mut(batch_id)
            .ok_or_else(|| LedgerError::not_found("batch", batch_id))
    }

    /// Grant event-logging rights. Manufacturer only, resident only.
    pub fn grant_actor(
        &mut self,
        caller: &Identity,
        batch_id: &BatchId,
        actor: Identity,
        now: Timestamp,
    ) -> LedgerResult<bool> {
        let batch = self.get_mut(batch_id)?;
        batch.require_resident()?;
        batch.require_manufacturer(caller, "grant actors")?;
        let added = batch.permitted_actors.insert(actor);
        batch.last_updated = now;
        Ok(added)
    }

    /// Revoke event-logging rights. Manufacturer only, resident only.
    pub fn revoke_actor(
        &mut self,
        caller: &Identity,
        batch_id: &BatchId,
        actor: &Identity,
        now: Timestamp,
    ) -> LedgerResult<bool> {
        let batch = self.get_mut(batch_id)?;
        batch.require_resident()?;
        batch.require_manufacturer(caller, "revoke actors")?;
        let removed = batch.permitted_actors.remove(actor);
        batch.last_updated = now;
        Ok(removed)
    }

    /// Largest `total_events` held by any batch.
    pub fn max_total_events(&self) -> u32 {
        self.batches
            .values()
            .map(|b| b.total_events)
            .max()
            .unwrap_or(0)
    }

    /// Batches whose handoff is mid-flight.
    pub fn in_flight(&self) -> impl Iterator<Item = &ProductBatch> {
        self.batches.values().filter(|b| b.delegation.is_in_flight())
    }
}
