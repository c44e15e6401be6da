//! # Chain Replay
//!
//! Consumer-facing authenticity check. Walks a batch's event chain from its
//! root along the `next_event` links and reports every inconsistency found,
//! instead of stopping at the first one.

use crate::domain::{EventChain, ProductBatch, ProductEvent, ProductStatus, VerificationStatus};
use serde::{Deserialize, Serialize};
use shared_types::{BatchId, EventId, Identity};
use std::collections::HashSet;

/// One inconsistency found while replaying a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainIssue {
    /// `total_events` disagrees with the number of chain members.
    CountMismatch { recorded: u32, found: u32 },
    /// `a.next == b` without `b.previous == a` (or the reverse).
    BrokenLink { from: EventId, to: EventId },
    /// A link points at an event of another batch or at nothing.
    ForeignEvent { event_id: EventId },
    /// The walk returned to an event already visited.
    Cycle { event_id: EventId },
    /// More than one member without a predecessor.
    MultipleRoots { roots: u32 },
    /// Members the walk from the root never reached.
    Unreachable { count: u32 },
}

/// Result of replaying one batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticityReport {
    pub batch_id: BatchId,
    pub manufacturer: Identity,
    pub manufacturer_name: String,
    pub status: ProductStatus,
    /// Events in walk order.
    pub events: Vec<ProductEvent>,
    pub total_events: u32,
    pub chain_intact: bool,
    pub issues: Vec<ChainIssue>,
    pub rejected_events: Vec<EventId>,
    /// Every walked event is `Verified`.
    pub all_verified: bool,
    pub authenticity_verified: bool,
}

impl AuthenticityReport {
    /// Intact and fully verified: the condition for certification.
    pub fn is_certifiable(&self) -> bool {
        self.chain_intact && self.all_verified && !self.events.is_empty()
    }
}

/// Replay the chain of `batch`.
pub fn replay_chain(batch: &ProductBatch, chain: &EventChain) -> AuthenticityReport {
    let members = chain.members(&batch.batch_id);
    let member_set: HashSet<EventId> = members.iter().copied().collect();
    let mut issues = Vec::new();

    let found = u32::try_from(members.len()).unwrap_or(u32::MAX);
    if found != batch.total_events {
        issues.push(ChainIssue::CountMismatch {
            recorded: batch.total_events,
            found,
        });
    }

    let roots: Vec<EventId> = members
        .iter()
        .filter_map(|id| chain.find(id))
        .filter(|e| e.previous_event.is_none())
        .map(|e| e.event_id)
        .collect();
    if roots.len() > 1 {
        issues.push(ChainIssue::MultipleRoots {
            roots: u32::try_from(roots.len()).unwrap_or(u32::MAX),
        });
    }

    let mut events = Vec::new();
    let mut visited = HashSet::new();
    let mut cursor = roots.first().copied();

    while let Some(id) = cursor {
        if !visited.insert(id) {
            issues.push(ChainIssue::Cycle { event_id: id });
            break;
        }
        let Some(event) = chain.find(&id).filter(|e| e.batch_id == batch.batch_id) else {
            issues.push(ChainIssue::ForeignEvent { event_id: id });
            break;
        };
        if !member_set.contains(&id) {
            issues.push(ChainIssue::ForeignEvent { event_id: id });
        }
        if let Some(next_id) = event.next_event {
            if let Some(next) = chain.find(&next_id) {
                if next.previous_event != Some(id) {
                    issues.push(ChainIssue::BrokenLink {
                        from: id,
                        to: next_id,
                    });
                }
            }
        }
        events.push(event.clone());
        cursor = event.next_event;
    }

    let unreachable = members.iter().filter(|id| !visited.contains(*id)).count();
    if unreachable > 0 && !roots.is_empty() {
        issues.push(ChainIssue::Unreachable {
            count: u32::try_from(unreachable).unwrap_or(u32::MAX),
        });
    }

    let rejected_events = events
        .iter()
        .filter(|e| e.verification_status == VerificationStatus::Rejected)
        .map(|e| e.event_id)
        .collect();
    let all_verified = events
        .iter()
        .all(|e| e.verification_status == VerificationStatus::Verified);

    AuthenticityReport {
        batch_id: batch.batch_id,
        manufacturer: batch.manufacturer,
        manufacturer_name: batch.manufacturer_name.clone(),
        status: batch.status,
        total_events: batch.total_events,
        chain_intact: issues.is_empty(),
        issues,
        events,
        rejected_events,
        all_verified,
        authenticity_verified: batch.authenticity_verified,
    }
}
