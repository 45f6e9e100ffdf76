//! Scenario: full return run against the in-memory store.
//!
//! # Invariants under test
//!
//! - delivered 10, returned 10, to_laundry 10: available +0, laundry +10,
//!   booked released, one batch of 10, return completed, booking returned
//! - mixed outcomes archive damaged then lost, each with its own row
//! - a missing booking row does not block completion

use chrono::{TimeZone, Utc};
use rbo_returns::*;
use rbo_testkit::{seed_basic, MemoryStore};
use uuid::Uuid;

fn applied(outcome: ProcessOutcome) -> ProcessSummary {
    match outcome {
        ProcessOutcome::Applied(s) => s,
        other => panic!("expected Applied, got {other:?}"),
    }
}

#[tokio::test]
async fn all_used_units_go_to_one_laundry_batch() {
    let store = MemoryStore::new();
    let fx = seed_basic(&store, None).await;
    let now = Utc.timestamp_millis_opt(1_717_171_234_567).unwrap();

    let mut line = ReturnLineInput::new(fx.product.id, 10);
    line.qty_returned = 10;
    line.qty_to_laundry = Some(10);
    let sub = ReturnSubmission {
        items: vec![line],
        ..Default::default()
    };

    let summary = applied(
        process_return(&store, &EngineSettings::default(), &fx.actor, fx.record.id, &sub, now)
            .await
            .expect("process"),
    );
    assert_eq!(summary.items_processed, 1);
    assert_eq!(summary.inventory_updated, 1);
    assert_eq!(summary.items_archived, 0);
    assert_eq!(summary.totals.total_items, 10);
    assert_eq!(summary.totals.total_returned, 10);
    assert!(summary.booking_updated);
    assert_eq!(summary.handover_source, LedgerSource::NoDelivery);

    let p = store.product(fx.product.id).await.unwrap();
    assert_eq!(p.inventory.stock_available, 30);
    assert_eq!(p.inventory.stock_in_laundry, 10);
    assert_eq!(p.inventory.stock_booked, 0);
    assert_eq!(p.inventory.stock_total, 40);

    let st = store.snapshot().await;
    assert_eq!(st.laundry_batches.len(), 1);
    let batch = &st.laundry_batches[0];
    assert_eq!(Some(batch.id), summary.laundry_batch_id);
    assert_eq!(batch.batch_number, "LB-RET-234567");
    assert_eq!(batch.total_items, 10);
    assert!(batch.auto_created);
    assert_eq!(batch.status, BATCH_STATUS_PENDING);
    assert_eq!(batch.items.len(), 1);
    assert_eq!(batch.items[0].condition_before, CONDITION_BEFORE_DIRTY);

    let completion = &st.completions[&fx.record.id];
    assert_eq!(completion.status, ReturnStatus::Completed);
    assert_eq!(completion.processed_by, fx.actor.user_id);
    assert_eq!(completion.processed_at, now);
    assert!(completion.laundry_batch_created);
    assert!(completion.send_to_laundry);

    assert_eq!(
        store
            .booking_status(BookingSource::ProductOrder, fx.record.booking_id)
            .await
            .as_deref(),
        Some(BOOKING_STATUS_RETURNED)
    );
    assert_eq!(
        store.return_record(fx.record.id).await.unwrap().status,
        ReturnStatus::Completed
    );
}

#[tokio::test]
async fn mixed_outcomes_archive_and_restock() {
    let store = MemoryStore::new();
    let fx = seed_basic(&store, None).await;

    let mut line = ReturnLineInput::new(fx.product.id, 10);
    line.qty_returned = 4;
    line.qty_not_used = 3;
    line.qty_damaged = 2;
    line.damage_reason = Some("torn".to_string());
    line.damage_severity = Some("major".to_string());
    line.qty_lost = 1;
    line.lost_reason = Some("Stolen ".to_string());
    let sub = ReturnSubmission {
        items: vec![line],
        send_to_laundry: true,
        ..Default::default()
    };

    let summary = applied(
        process_return(
            &store,
            &EngineSettings::default(),
            &fx.actor,
            fx.record.id,
            &sub,
            Utc::now(),
        )
        .await
        .expect("process"),
    );
    assert_eq!(summary.items_archived, 2);
    assert_eq!(summary.totals.total_damaged, 2);
    assert_eq!(summary.totals.total_lost, 1);

    let p = store.product(fx.product.id).await.unwrap();
    assert_eq!(p.inventory.stock_available, 33);
    assert_eq!(p.inventory.stock_in_laundry, 4);
    assert_eq!(p.inventory.stock_damaged, 2);
    assert_eq!(p.inventory.stock_total, 39);
    assert_eq!(p.inventory.stock_booked, 0);

    let st = store.snapshot().await;
    assert_eq!(st.archives.len(), 2);
    assert_eq!(st.archives[0].reason, ArchiveReason::Damaged);
    assert_eq!(st.archives[0].quantity, 2);
    assert_eq!(st.archives[0].severity.as_deref(), Some("major"));
    assert_eq!(st.archives[1].reason, ArchiveReason::Stolen);
    assert_eq!(st.archives[1].notes, DEFAULT_LOST_NOTES);
    assert!(st.line_items[0].archived);
    assert!(st.line_items[0].sent_to_laundry);
}

#[tokio::test]
async fn missing_booking_still_completes_return() {
    let store = MemoryStore::new();
    let fx = seed_basic(&store, None).await;
    store
        .remove_booking(BookingSource::ProductOrder, fx.record.booking_id)
        .await;

    let mut line = ReturnLineInput::new(fx.product.id, 2);
    line.qty_not_used = 2;
    let sub = ReturnSubmission {
        items: vec![line],
        ..Default::default()
    };

    let summary = applied(
        process_return(
            &store,
            &EngineSettings::default(),
            &fx.actor,
            fx.record.id,
            &sub,
            Utc::now(),
        )
        .await
        .expect("process"),
    );
    assert!(!summary.booking_updated);
    assert_eq!(summary.laundry_batch_id, None);
    assert_eq!(
        store.return_record(fx.record.id).await.unwrap().status,
        ReturnStatus::Completed
    );
}

#[tokio::test]
async fn unknown_return_is_not_found() {
    let store = MemoryStore::new();
    let fx = seed_basic(&store, None).await;

    let err = process_return(
        &store,
        &EngineSettings::default(),
        &fx.actor,
        Uuid::new_v4(),
        &ReturnSubmission::default(),
        Utc::now(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "RETURN_NOT_FOUND");
}
