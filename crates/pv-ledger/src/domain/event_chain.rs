//! # Event Chain
//!
//! Append-only per-event records linked to a batch.
//!
//! ## Storage
//!
//! Events live in an arena keyed by `EventId`; links between them are keys,
//! not references. Each batch keeps its members in append order. The chain is
//! linear, so append order and link order coincide.
//!
//! ## Link Invariant
//!
//! `A.next == B` iff `B.previous == A`, and the chain is acyclic. Both sides
//! of a link are written in the same call, after validation.

use super::value_objects::{EventType, OrderStatus, VerificationStatus};
use crate::error::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use shared_types::{BatchId, EventId, Identity, Timestamp};
use std::collections::HashMap;

/// One custody or status event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEvent {
    pub event_id: EventId,
    pub batch_id: BatchId,
    pub actor: Identity,
    pub event_type: EventType,
    pub order_status: OrderStatus,
    pub verification_status: VerificationStatus,
    pub metadata_ref: Option<String>,
    pub previous_event: Option<EventId>,
    pub next_event: Option<EventId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields of an event about to be appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEvent {
    pub event_id: EventId,
    pub batch_id: BatchId,
    pub actor: Identity,
    pub event_type: EventType,
    pub order_status: OrderStatus,
    pub metadata_ref: Option<String>,
    pub timestamp: Timestamp,
}

/// Event arena plus per-batch membership.
#[derive(Debug, Default)]
pub struct EventChain {
    events: HashMap<EventId, ProductEvent>,
    by_batch: HashMap<BatchId, Vec<EventId>>,
}

impl EventChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event_id: &EventId) -> bool {
        self.events.contains_key(event_id)
    }

    pub fn get(&self, event_id: &EventId) -> LedgerResult<&ProductEvent> {
        self.events
            .get(event_id)
            .ok_or_else(|| LedgerError::not_found("event", event_id))
    }

    pub fn get_mut(&mut self, event_id: &EventId) -> LedgerResult<&mut ProductEvent> {
        self.events
            .get_mut(event_id)
            .ok_or_else(|| LedgerError::not_found("event", event_id))
    }

    /// Arena lookup without error.
    pub fn find(&self, event_id: &EventId) -> Option<&ProductEvent> {
        self.events.get(event_id)
    }

    /// Member ids of a batch in append order.
    pub fn members(&self, batch_id: &BatchId) -> &[EventId] {
        self.by_batch
            .get(batch_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count(&self, batch_id: &BatchId) -> u32 {
        u32::try_from(self.members(batch_id).len()).unwrap_or(u32::MAX)
    }

    /// Current last event of a batch.
    pub fn tail(&self, batch_id: &BatchId) -> Option<EventId> {
        self.members(batch_id).last().copied()
    }

    /// Validate an optional caller-supplied predecessor.
    ///
    /// With no predecessor the new event goes after the current tail. A
    /// supplied predecessor must belong to the same batch and have no
    /// successor.
    pub fn resolve_previous(
        &self,
        batch_id: &BatchId,
        supplied: Option<EventId>,
    ) -> LedgerResult<Option<EventId>> {
        let Some(previous) = supplied else {
            return Ok(self.tail(batch_id));
        };
        let Some(prev) = self.events.get(&previous) else {
            return Err(LedgerError::InvalidTransition {
                from: format!("unknown event {}", hex::encode(previous)),
                to: "linked".into(),
            });
        };
        if &prev.batch_id != batch_id {
            return Err(LedgerError::InvalidTransition {
                from: format!("event of batch {}", hex::encode(prev.batch_id)),
                to: format!("link in batch {}", hex::encode(batch_id)),
            });
        }
        if let Some(next) = prev.next_event {
            return Err(LedgerError::InvalidTransition {
                from: format!("event already followed by {}", hex::encode(next)),
                to: "second successor".into(),
            });
        }
        Ok(Some(previous))
    }

    /// Append an event after `previous`, writing both sides of the link.
    pub fn append(
        &mut self,
        new: NewEvent,
        previous: Option<EventId>,
    ) -> LedgerResult<&ProductEvent> {
        if self.contains(&new.event_id) {
            return Err(LedgerError::duplicate("event", &new.event_id));
        }
        let resolved = self.resolve_previous(&new.batch_id, previous)?;

        let event = ProductEvent {
            event_id: new.event_id,
            batch_id: new.batch_id,
            actor: new.actor,
            event_type: new.event_type,
            order_status: new.order_status,
            verification_status: VerificationStatus::Pending,
            metadata_ref: new.metadata_ref,
            previous_event: resolved,
            next_event: None,
            created_at: new.timestamp,
            updated_at: new.timestamp,
        };

        if let Some(prev_id) = resolved {
            if let Some(prev) = self.events.get_mut(&prev_id) {
                prev.next_event = Some(new.event_id);
            }
        }
        self.by_batch
            .entry(new.batch_id)
            .or_default()
            .push(new.event_id);
        Ok(&*self.events.entry(new.event_id).or_insert(event))
    }

    /// Monotonic verification update.
    pub fn update_verification(
        &mut self,
        event_id: &EventId,
        status: VerificationStatus,
        now: Timestamp,
    ) -> LedgerResult<&ProductEvent> {
        let event = self.get_mut(event_id)?;
        if !event.verification_status.can_transition_to(status) {
            return Err(LedgerError::InvalidTransition {
                from: format!("{:?}", event.verification_status),
                to: format!("{:?}", status),
            });
        }
        event.verification_status = status;
        event.updated_at = now;
        Ok(&*event)
    }

    /// Events of a batch in chain order.
    pub fn events_for_batch(&self, batch_id: &BatchId) -> Vec<&ProductEvent> {
        self.members(batch_id)
            .iter()
            .filter_map(|id| self.events.get(id))
            .collect()
    }
}
