//! # Integration Test Flows: recovery
//!
//! Interrupted handoffs, unavailable or forged commitments and the
//! authority's forced undelegation.
//!
//! ## Flows Tested:
//!
//! 1. **Oracle outage**: undelegate fails retryably and the unit stays Undelegating
//! 2. **Finality**: merge waits for the required confirmations
//! 3. **Forged state**: a state that disagrees with its commitment is refused
//! 4. **Forced undelegation**: the authority reclaims a unit after the timeout
//! 5. **Stalled handoffs**: unacknowledged delegations are reported and resumable

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pv_ledger::{
        DelegationSnapshot, DelegationState, InMemoryCommitmentOracle, InMemoryRollupDomain,
        LedgerError, LedgerResult, LoggedUpdate, OrderStatus, ProvenanceApi, RollupDomain,
        RollupState, RollupUpdate, ServiceConfig, SubmissionRef, UndelegateOutcome,
        AutoVerifyPolicy,
    };
    use shared_types::{BatchId, DomainId};
    use std::sync::Arc;

    const BATCH: [u8; 32] = [0x30; 32];
    const EVENT: [u8; 32] = [0x40; 32];

    #[derive(Default)]
    struct Faults {
        tamper_state: bool,
        fail_release: bool,
    }

    /// In-memory rollup domain with injectable misbehavior.
    struct FaultyRollup {
        inner: InMemoryRollupDomain,
        faults: Mutex<Faults>,
    }

    impl FaultyRollup {
        fn new(oracle: Arc<InMemoryCommitmentOracle>) -> Self {
            Self {
                inner: InMemoryRollupDomain::new(OPERATOR, oracle),
                faults: Mutex::new(Faults::default()),
            }
        }

        fn tamper_state(&self, on: bool) {
            self.faults.lock().tamper_state = on;
        }

        fn fail_release(&self, on: bool) {
            self.faults.lock().fail_release = on;
        }
    }

    #[async_trait]
    impl RollupDomain for FaultyRollup {
        fn domain_id(&self) -> DomainId {
            self.inner.domain_id()
        }

        async fn accept_delegation(&self, snapshot: DelegationSnapshot) -> LedgerResult<()> {
            self.inner.accept_delegation(snapshot).await
        }

        async fn apply_update(&self, batch_id: BatchId, update: RollupUpdate) -> LedgerResult<LoggedUpdate> {
            self.inner.apply_update(batch_id, update).await
        }

        async fn commit_final(&self, batch_id: BatchId) -> LedgerResult<(RollupState, SubmissionRef)> {
            let (mut state, submission) = self.inner.commit_final(batch_id).await?;
            if self.faults.lock().tamper_state {
                state.order_status = OrderStatus::Cancelled;
            }
            Ok((state, submission))
        }

        async fn release(&self, batch_id: BatchId) -> LedgerResult<()> {
            if self.faults.lock().fail_release {
                return Err(LedgerError::DomainUnavailable {
                    reason: "release dropped".into(),
                });
            }
            self.inner.release(batch_id).await
        }
    }

    fn faulty_harness(config: ServiceConfig) -> Harness<FaultyRollup> {
        let oracle = Arc::new(InMemoryCommitmentOracle::new());
        let rollup = Arc::new(FaultyRollup::new(Arc::clone(&oracle)));
        Harness::assemble(config, rollup, oracle, Arc::new(AutoVerifyPolicy))
    }

    async fn delegated_with_update(h: &Harness<impl RollupDomain + 'static>) {
        h.seed_techcorp(BATCH, EVENT).await;
        h.delegate(TECHCORP, BATCH, EVENT, T0 + 1).await.unwrap();
        h.update_order(TECHCORP, BATCH, EVENT, OrderStatus::Shipped, T0 + 5)
            .await
            .unwrap();
    }

    // =============================================================================
    // COMMITMENT FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_oracle_outage_leaves_unit_undelegating() {
        let h = Harness::new();
        delegated_with_update(&h).await;

        h.oracle.set_unavailable(true);
        let err = h.undelegate(TECHCORP, BATCH, EVENT, T0 + 6).await.unwrap_err();
        assert!(matches!(err, LedgerError::CommitmentUnavailable { .. }));
        assert!(err.is_retryable());

        let batch = h.service.get_batch(&BATCH).unwrap();
        assert_eq!(batch.delegation, DelegationState::Undelegating);
        assert_eq!(batch.total_events, 1);
        assert_eq!(
            h.service.delegation(&BATCH).unwrap().undelegation_requested_at,
            Some(T0 + 6)
        );

        // Neither domain accepts writes mid-handoff.
        assert!(matches!(
            h.create_event(TECHCORP, BATCH, [0x41; 32], pv_ledger::EventType::Shipped, T0 + 20)
                .await,
            Err(LedgerError::NotResident { .. })
        ));
        assert!(matches!(
            h.update_order(TECHCORP, BATCH, EVENT, OrderStatus::Delivered, T0 + 20)
                .await,
            Err(LedgerError::NotDelegated { .. })
        ));

        h.oracle.set_unavailable(false);
        let outcome = h.undelegate(TECHCORP, BATCH, EVENT, T0 + 30).await.unwrap();
        assert!(matches!(
            outcome,
            UndelegateOutcome::Merged {
                total_events: 2,
                final_order_status: OrderStatus::Shipped,
                ..
            }
        ));
        assert_eq!(
            h.service.get_batch(&BATCH).unwrap().delegation,
            DelegationState::Resident
        );
    }

    #[tokio::test]
    async fn test_merge_waits_for_confirmations() {
        let h = Harness::with_service_config(
            ServiceConfig::for_authority(AUTHORITY).with_required_confirmations(3),
        );
        delegated_with_update(&h).await;

        let err = h.undelegate(TECHCORP, BATCH, EVENT, T0 + 6).await.unwrap_err();
        assert!(matches!(err, LedgerError::CommitmentUnavailable { .. }));
        assert_eq!(
            h.service.get_batch(&BATCH).unwrap().delegation,
            DelegationState::Undelegating
        );

        h.oracle.advance_blocks(2);
        let outcome = h.undelegate(TECHCORP, BATCH, EVENT, T0 + 7).await.unwrap();
        assert!(matches!(outcome, UndelegateOutcome::Merged { total_events: 2, .. }));
    }

    #[tokio::test]
    async fn test_tampered_state_rejected() {
        let h = faulty_harness(ServiceConfig::for_authority(AUTHORITY));
        delegated_with_update(&h).await;

        h.rollup.tamper_state(true);
        let err = h.undelegate(TECHCORP, BATCH, EVENT, T0 + 6).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCommitment { .. }));
        assert!(!err.is_retryable());

        let event = h.service.get_event(&EVENT).unwrap();
        assert_eq!(event.order_status, OrderStatus::Pending);
        assert_eq!(h.service.events_for_batch(&BATCH).unwrap().len(), 1);

        h.rollup.tamper_state(false);
        h.undelegate(TECHCORP, BATCH, EVENT, T0 + 7).await.unwrap();
        assert_eq!(
            h.service.get_event(&EVENT).unwrap().order_status,
            OrderStatus::Shipped
        );
    }

    #[tokio::test]
    async fn test_release_failure_does_not_block_merge() {
        let h = faulty_harness(ServiceConfig::for_authority(AUTHORITY));
        delegated_with_update(&h).await;

        h.rollup.fail_release(true);
        let outcome = h.undelegate(TECHCORP, BATCH, EVENT, T0 + 6).await.unwrap();
        assert!(matches!(outcome, UndelegateOutcome::Merged { .. }));
        assert_eq!(h.rollup.inner.replica_count(), 1);
        assert_eq!(
            h.service.get_batch(&BATCH).unwrap().delegation,
            DelegationState::Resident
        );
    }

    // =============================================================================
    // FORCED UNDELEGATION AND STALLED HANDOFFS
    // =============================================================================

    #[tokio::test]
    async fn test_authority_forces_undelegation_after_timeout() {
        let h = Harness::with_service_config(
            ServiceConfig::for_authority(AUTHORITY).with_undelegation_timeout(60),
        );
        delegated_with_update(&h).await;

        assert!(matches!(
            h.undelegate(AUTHORITY, BATCH, EVENT, T0 + 30).await,
            Err(LedgerError::Unauthorized { .. })
        ));
        assert!(matches!(
            h.undelegate(STRANGER, BATCH, EVENT, T0 + 120).await,
            Err(LedgerError::Unauthorized { .. })
        ));
        assert_eq!(
            h.service.get_batch(&BATCH).unwrap().delegation,
            DelegationState::Delegated
        );

        let outcome = h.undelegate(AUTHORITY, BATCH, EVENT, T0 + 61).await.unwrap();
        assert!(matches!(outcome, UndelegateOutcome::Merged { total_events: 2, .. }));
    }

    #[tokio::test]
    async fn test_unacknowledged_delegation_reported_as_stalled() {
        let h = Harness::new();
        h.seed_techcorp(BATCH, EVENT).await;

        h.rollup.set_unavailable(true);
        let err = h.delegate(TECHCORP, BATCH, EVENT, T0 + 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::DomainUnavailable { .. }));
        assert_eq!(
            h.service.get_batch(&BATCH).unwrap().delegation,
            DelegationState::Delegating
        );

        // Neither side may write, and undelegation has nothing to reclaim yet.
        assert!(matches!(
            h.undelegate(TECHCORP, BATCH, EVENT, T0 + 2).await,
            Err(LedgerError::NotDelegated { .. })
        ));

        assert!(h.service.stalled_delegations(T0 + 100).is_empty());
        let stalled = h.service.stalled_delegations(T0 + 1 + 3_600);
        assert_eq!(stalled.len(), 1);
        assert_eq!(stalled[0].batch_id, BATCH);
        assert_eq!(stalled[0].state, DelegationState::Delegating);

        h.rollup.set_unavailable(false);
        let record = h.delegate(TECHCORP, BATCH, EVENT, T0 + 4_000).await.unwrap();
        assert_eq!(record.state, DelegationState::Delegated);
        assert_eq!(record.delegated_at, T0 + 1);
        assert!(h.service.stalled_delegations(T0 + 4_000).is_empty());
    }

    #[tokio::test]
    async fn test_rollup_outage_rejects_updates_retryably() {
        let h = Harness::new();
        h.seed_techcorp(BATCH, EVENT).await;
        h.delegate(TECHCORP, BATCH, EVENT, T0 + 1).await.unwrap();

        h.rollup.set_unavailable(true);
        let err = h
            .update_order(TECHCORP, BATCH, EVENT, OrderStatus::Confirmed, T0 + 5)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::DomainUnavailable { .. }));
        assert!(err.is_retryable());

        h.rollup.set_unavailable(false);
        let logged = h
            .update_order(TECHCORP, BATCH, EVENT, OrderStatus::Confirmed, T0 + 5)
            .await
            .unwrap();
        assert_eq!(logged.sequence, 1);
    }
}
