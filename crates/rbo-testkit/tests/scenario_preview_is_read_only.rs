//! Scenario: impact preview.
//!
//! # Invariants under test
//!
//! - preview projects pools without writing anything
//! - violations are reported next to the projection, not raised
//! - a completed return can still be previewed

use chrono::Utc;
use rbo_returns::*;
use rbo_testkit::{seed_basic, MemoryStore};

#[tokio::test]
async fn preview_reports_projection_and_violations_without_writes() {
    let store = MemoryStore::new();
    let fx = seed_basic(&store, None).await;

    let mut line = ReturnLineInput::new(fx.product.id, 10);
    line.qty_returned = 6;
    line.qty_not_used = 2;
    line.qty_damaged = 2;
    let sub = ReturnSubmission {
        items: vec![line],
        send_to_laundry: true,
        ..Default::default()
    };
    let before = store.snapshot().await;

    let preview = preview_return(&store, &fx.actor, fx.record.id, &sub)
        .await
        .expect("preview");
    assert_eq!(preview.return_number, fx.record.return_number);
    assert_eq!(preview.status, ReturnStatus::Pending);
    assert_eq!(preview.violations.len(), 1);
    assert_eq!(preview.violations[0].code(), "MISSING_DAMAGE_REASON");

    let p = &preview.preview[0];
    assert_eq!(p.current_stock.available, 30);
    assert_eq!(p.new_stock.available, 32);
    assert_eq!(p.new_stock.in_laundry, 6);
    assert_eq!(p.new_stock.damaged, 2);
    assert!(p
        .warnings
        .iter()
        .any(|w| w == "2 items will be archived as damaged"));

    assert_eq!(store.commits(), 0);
    assert_eq!(store.snapshot().await.products, before.products);
}

#[tokio::test]
async fn completed_return_can_be_previewed() {
    let store = MemoryStore::new();
    let fx = seed_basic(&store, None).await;

    let mut line = ReturnLineInput::new(fx.product.id, 1);
    line.qty_not_used = 1;
    let sub = ReturnSubmission {
        items: vec![line],
        ..Default::default()
    };
    process_return(
        &store,
        &EngineSettings::default(),
        &fx.actor,
        fx.record.id,
        &sub,
        Utc::now(),
    )
    .await
    .expect("process");

    let preview = preview_return(&store, &fx.actor, fx.record.id, &sub)
        .await
        .expect("preview");
    assert_eq!(preview.status, ReturnStatus::Completed);
    assert!(preview.violations.is_empty());
}
