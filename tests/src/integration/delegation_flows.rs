//! # Integration Test Flows: delegation
//!
//! The delegate / record_update / undelegate cycle between the ledger, the
//! in-memory rollup domain and the commitment oracle.
//!
//! ## Flows Tested:
//!
//! 1. **End-to-end**: TechCorp batch delegated, three rollup updates, merged back
//! 2. **Exclusive writes**: base-domain mutations rejected while delegated
//! 3. **Rollup rate limit**: updates closer than the interval are rejected
//! 4. **Idempotent undelegate**: a second call is a no-op
//! 5. **Routing**: updates must target the rollup domain holding the unit

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use pv_ledger::{
        derive_event_id, ActorGrant, BusinessType, CertifyAuthenticity, DelegationState,
        EventType, LedgerError, LedgerEvent, OrderStatus, ProductStatus, ProvenanceApi,
        RecordUpdate, UndelegateOutcome, UpdateVerification, VerificationStatus,
    };
    use shared_types::DomainId;

    const BATCH: [u8; 32] = [0x10; 32];
    const EVENT: [u8; 32] = [0x20; 32];

    // =============================================================================
    // END-TO-END
    // =============================================================================

    #[tokio::test]
    async fn test_techcorp_supply_chain_end_to_end() {
        let h = Harness::new();
        let first = h.seed_techcorp(BATCH, EVENT).await;
        assert_eq!(first.order_status, OrderStatus::Pending);
        assert_eq!(h.service.get_batch(&BATCH).unwrap().total_events, 1);

        let record = h.delegate(TECHCORP, BATCH, EVENT, T0 + 1).await.unwrap();
        assert_eq!(record.state, DelegationState::Delegated);
        assert_eq!(record.rollup, Some(h.rollup_domain()));

        let mut derived = Vec::new();
        for (offset, status) in [
            (5, OrderStatus::Confirmed),
            (10, OrderStatus::Shipped),
            (15, OrderStatus::Delivered),
        ] {
            let logged = h
                .update_order(TECHCORP, BATCH, EVENT, status, T0 + offset)
                .await
                .unwrap();
            assert_eq!(logged.order_status, status);
            derived.push(logged.derived_event_id);
        }
        assert_eq!(derived[0], derive_event_id(&BATCH, &EVENT, 1));
        assert_eq!(h.rollup.replica_state(&BATCH).unwrap().total_events, 4);

        let outcome = h.undelegate(TECHCORP, BATCH, EVENT, T0 + 20).await.unwrap();
        assert_eq!(
            outcome,
            UndelegateOutcome::Merged {
                total_events: 4,
                final_status: ProductStatus::Created,
                final_order_status: OrderStatus::Delivered,
            }
        );

        let event = h.service.get_event(&EVENT).unwrap();
        assert_eq!(event.order_status, OrderStatus::Delivered);
        assert_eq!(event.updated_at, T0 + 15);

        let batch = h.service.get_batch(&BATCH).unwrap();
        assert_eq!(batch.delegation, DelegationState::Resident);
        assert_eq!(batch.total_events, 4);
        assert_eq!(batch.last_event_timestamp, Some(T0 + 15));

        let events = h.service.events_for_batch(&BATCH).unwrap();
        assert_eq!(events.len(), 4);
        let chain: Vec<_> = events.iter().map(|e| e.event_id).collect();
        assert_eq!(chain, [vec![EVENT], derived].concat());
        assert_eq!(
            events.iter().map(|e| e.order_status).collect::<Vec<_>>(),
            vec![
                OrderStatus::Delivered,
                OrderStatus::Confirmed,
                OrderStatus::Shipped,
                OrderStatus::Delivered
            ]
        );

        let report = h.service.verify_authenticity(&BATCH).unwrap();
        assert!(report.chain_intact);
        assert!(report.issues.is_empty());
        assert_eq!(h.rollup.replica_count(), 0);
    }

    #[tokio::test]
    async fn test_delegation_cycle_emits_events() {
        let h = Harness::new();
        h.seed_techcorp(BATCH, EVENT).await;
        h.service.take_events();

        let correlation = uuid::Uuid::new_v4();
        let req = h
            .base(
                TECHCORP,
                T0 + 1,
                pv_ledger::DelegateRequest {
                    batch_id: BATCH,
                    event_id: EVENT,
                },
            )
            .with_correlation(correlation);
        h.service.delegate(req).await.unwrap();
        h.update_order(TECHCORP, BATCH, EVENT, OrderStatus::Shipped, T0 + 5)
            .await
            .unwrap();
        h.undelegate(TECHCORP, BATCH, EVENT, T0 + 6).await.unwrap();

        let events = h.service.take_events();
        let names: Vec<_> = events.iter().map(LedgerEvent::name).collect();
        assert_eq!(names, vec!["DelegationStarted", "StateUpdated", "SupplyChainCompleted"]);

        match &events[0] {
            LedgerEvent::DelegationStarted {
                correlation_id,
                rollup,
                ..
            } => {
                assert_eq!(*correlation_id, correlation);
                assert_eq!(*rollup, h.rollup_domain());
            }
            other => panic!("unexpected {:?}", other),
        }
        match &events[2] {
            LedgerEvent::SupplyChainCompleted(done) => {
                assert_eq!(done.total_events, 2);
                assert_eq!(done.final_order_status, OrderStatus::Shipped);
                assert_eq!(done.verification_status, VerificationStatus::Pending);
                assert_eq!(done.completed_by, TECHCORP);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    // =============================================================================
    // EXCLUSIVE WRITES
    // =============================================================================

    #[tokio::test]
    async fn test_base_writes_rejected_while_delegated() {
        let h = Harness::new();
        h.seed_techcorp(BATCH, EVENT).await;
        h.delegate(TECHCORP, BATCH, EVENT, T0 + 1).await.unwrap();
        let at = T0 + 30;

        assert!(matches!(
            h.create_event(TECHCORP, BATCH, [0x21; 32], EventType::Shipped, at).await,
            Err(LedgerError::NotResident { .. })
        ));
        assert!(matches!(
            h.service
                .grant_actor(h.base(TECHCORP, at, ActorGrant { batch_id: BATCH, actor: CARRIER }))
                .await,
            Err(LedgerError::NotResident { .. })
        ));
        assert!(matches!(
            h.service
                .update_verification(h.base(
                    AUTHORITY,
                    at,
                    UpdateVerification {
                        event_id: EVENT,
                        status: VerificationStatus::Verified,
                    },
                ))
                .await,
            Err(LedgerError::NotResident { .. })
        ));
        assert!(matches!(
            h.service
                .certify_authenticity(h.base(AUTHORITY, at, CertifyAuthenticity { batch_id: BATCH }))
                .await,
            Err(LedgerError::NotResident { .. })
        ));
        assert!(matches!(
            h.delegate(TECHCORP, BATCH, EVENT, at).await,
            Err(LedgerError::NotResident { .. })
        ));

        h.undelegate(TECHCORP, BATCH, EVENT, at).await.unwrap();
        h.create_event(TECHCORP, BATCH, [0x21; 32], EventType::Shipped, at + 1)
            .await
            .unwrap();
        assert_eq!(h.service.get_batch(&BATCH).unwrap().total_events, 2);
    }

    #[tokio::test]
    async fn test_only_manufacturer_delegates() {
        let h = Harness::new();
        h.seed_techcorp(BATCH, EVENT).await;
        h.register(CARRIER, "FastFreight", BusinessType::LogisticsProvider)
            .await
            .unwrap();

        assert!(matches!(
            h.delegate(CARRIER, BATCH, EVENT, T0 + 1).await,
            Err(LedgerError::Unauthorized { .. })
        ));
        assert!(matches!(
            h.delegate(TECHCORP, BATCH, [0x99; 32], T0 + 1).await,
            Err(LedgerError::NotFound { .. })
        ));
        assert!(h.service.delegation(&BATCH).is_none());
    }

    // =============================================================================
    // RATE LIMIT AND ROUTING
    // =============================================================================

    #[tokio::test]
    async fn test_rollup_updates_rate_limited() {
        let h = Harness::new();
        h.seed_techcorp(BATCH, EVENT).await;
        h.delegate(TECHCORP, BATCH, EVENT, T0 + 1).await.unwrap();

        h.update_order(TECHCORP, BATCH, EVENT, OrderStatus::Confirmed, T0 + 5)
            .await
            .unwrap();
        let result = h
            .update_order(TECHCORP, BATCH, EVENT, OrderStatus::Shipped, T0 + 7)
            .await;
        match result {
            Err(LedgerError::RateLimited {
                elapsed_secs,
                required_secs,
                retry_after_secs,
            }) => {
                assert_eq!(elapsed_secs, 2);
                assert_eq!(required_secs, 5);
                assert_eq!(retry_after_secs, 3);
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
        h.update_order(TECHCORP, BATCH, EVENT, OrderStatus::Shipped, T0 + 10)
            .await
            .unwrap();

        assert_eq!(h.rollup.replica_state(&BATCH).unwrap().total_events, 3);
    }

    #[tokio::test]
    async fn test_rollup_update_routing() {
        let h = Harness::new();
        h.seed_techcorp(BATCH, EVENT).await;

        assert!(matches!(
            h.update_order(TECHCORP, BATCH, EVENT, OrderStatus::Confirmed, T0 + 5).await,
            Err(LedgerError::NotDelegated { .. })
        ));

        h.delegate(TECHCORP, BATCH, EVENT, T0 + 1).await.unwrap();
        let update = RecordUpdate {
            batch_id: BATCH,
            event_id: EVENT,
            order_status: Some(OrderStatus::Confirmed),
            ..Default::default()
        };

        assert!(matches!(
            h.service
                .record_update(h.base(TECHCORP, T0 + 5, update.clone()))
                .await,
            Err(LedgerError::NotResident { .. })
        ));
        let elsewhere = shared_types::AuthenticatedRequest::new(
            TECHCORP,
            DomainId::Rollup([0xEE; 32]),
            T0 + 5,
            update.clone(),
        );
        assert!(matches!(
            h.service.record_update(elsewhere).await,
            Err(LedgerError::NotDelegated { .. })
        ));
        assert!(matches!(
            h.update_order(TECHCORP, BATCH, [0x21; 32], OrderStatus::Confirmed, T0 + 5).await,
            Err(LedgerError::NotDelegated { .. })
        ));
        assert!(matches!(
            h.update_order(STRANGER, BATCH, EVENT, OrderStatus::Confirmed, T0 + 5).await,
            Err(LedgerError::Unauthorized { .. })
        ));

        // A base-domain operation sent to the rollup domain is refused too.
        let misrouted = h.on_rollup(
            TECHCORP,
            T0 + 5,
            pv_ledger::CreateEvent {
                batch_id: BATCH,
                event_id: [0x21; 32],
                event_type: EventType::Shipped,
                metadata_ref: None,
                order_status: OrderStatus::Pending,
                previous_event: None,
            },
        );
        assert!(matches!(
            h.service.create_event(misrouted).await,
            Err(LedgerError::NotDelegated { .. })
        ));

        h.service
            .record_update(h.on_rollup(TECHCORP, T0 + 5, update))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_permitted_actor_updates_on_rollup() {
        let h = Harness::new();
        h.seed_techcorp(BATCH, EVENT).await;
        h.register(CARRIER, "FastFreight", BusinessType::LogisticsProvider)
            .await
            .unwrap();
        h.service
            .grant_actor(h.base(TECHCORP, T0 + 1, ActorGrant { batch_id: BATCH, actor: CARRIER }))
            .await
            .unwrap();
        h.delegate(TECHCORP, BATCH, EVENT, T0 + 2).await.unwrap();

        let logged = h
            .service
            .record_update(h.on_rollup(
                CARRIER,
                T0 + 5,
                RecordUpdate {
                    batch_id: BATCH,
                    event_id: EVENT,
                    product_status: Some(ProductStatus::InTransit),
                    event_type: Some(EventType::InTransit),
                    metadata_ref: Some("QmGps".to_string()),
                    ..Default::default()
                },
            ))
            .await
            .unwrap();
        assert_eq!(logged.actor, CARRIER);
        assert_eq!(logged.order_status, OrderStatus::Pending);

        let outcome = h.undelegate(TECHCORP, BATCH, EVENT, T0 + 6).await.unwrap();
        assert!(matches!(
            outcome,
            UndelegateOutcome::Merged {
                final_status: ProductStatus::InTransit,
                ..
            }
        ));
        let merged = h.service.get_event(&logged.derived_event_id).unwrap();
        assert_eq!(merged.actor, CARRIER);
        assert_eq!(merged.metadata_ref.as_deref(), Some("QmGps"));
        assert_eq!(merged.verification_status, VerificationStatus::Pending);
    }

    // =============================================================================
    // IDEMPOTENCE
    // =============================================================================

    #[tokio::test]
    async fn test_undelegate_twice_is_noop() {
        let h = Harness::new();
        h.seed_techcorp(BATCH, EVENT).await;
        h.delegate(TECHCORP, BATCH, EVENT, T0 + 1).await.unwrap();
        h.update_order(TECHCORP, BATCH, EVENT, OrderStatus::Confirmed, T0 + 5)
            .await
            .unwrap();

        let first = h.undelegate(TECHCORP, BATCH, EVENT, T0 + 6).await.unwrap();
        assert!(matches!(first, UndelegateOutcome::Merged { total_events: 2, .. }));
        let batch_after_first = h.service.get_batch(&BATCH).unwrap();
        let events_after_first = h.service.events_for_batch(&BATCH).unwrap();

        let second = h.undelegate(TECHCORP, BATCH, EVENT, T0 + 7).await.unwrap();
        assert_eq!(second, UndelegateOutcome::AlreadyResident);
        assert_eq!(h.service.get_batch(&BATCH).unwrap(), batch_after_first);
        assert_eq!(h.service.events_for_batch(&BATCH).unwrap(), events_after_first);
    }

    #[tokio::test]
    async fn test_redelegation_after_merge() {
        let h = Harness::new();
        h.seed_techcorp(BATCH, EVENT).await;

        for round in 0..2u64 {
            let base = T0 + 1 + round * 100;
            h.delegate(TECHCORP, BATCH, EVENT, base).await.unwrap();
            h.update_order(TECHCORP, BATCH, EVENT, OrderStatus::Processing, base + 10)
                .await
                .unwrap();
            h.undelegate(TECHCORP, BATCH, EVENT, base + 11).await.unwrap();
        }

        let batch = h.service.get_batch(&BATCH).unwrap();
        assert_eq!(batch.total_events, 3);
        assert_eq!(h.service.events_for_batch(&BATCH).unwrap().len(), 3);
        assert!(h.service.verify_authenticity(&BATCH).unwrap().chain_intact);
    }
}
