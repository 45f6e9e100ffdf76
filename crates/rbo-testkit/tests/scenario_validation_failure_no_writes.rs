//! Scenario: an invalid submission changes nothing.
//!
//! # Invariant under test
//!
//! When one line fails conservation the whole submission is refused with
//! the first violation, no plan reaches the store and the return stays
//! pending so a corrected submission can follow.

use chrono::Utc;
use rbo_returns::*;
use rbo_testkit::{product, seed_basic, MemoryStore};

#[tokio::test]
async fn one_bad_line_refuses_the_whole_submission() {
    let store = MemoryStore::new();
    let fx = seed_basic(&store, None).await;
    let napkin = product("napkin", ProductInventory::default());
    store.insert_product(napkin.clone()).await;

    let mut good = ReturnLineInput::new(fx.product.id, 2);
    good.qty_returned = 2;
    let mut bad = ReturnLineInput::new(napkin.id, 10);
    bad.qty_returned = 5;
    bad.qty_not_used = 4;
    let sub = ReturnSubmission {
        items: vec![good, bad],
        ..Default::default()
    };
    let before = store.snapshot().await;

    let err = process_return(
        &store,
        &EngineSettings::default(),
        &fx.actor,
        fx.record.id,
        &sub,
        Utc::now(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "INVALID_SUBMISSION");
    assert_eq!(
        err.to_string(),
        format!(
            "Quantity mismatch for product {}. Delivered: 10, Accounted: 9",
            napkin.id
        )
    );
    assert_eq!(store.commits(), 0);

    let after = store.snapshot().await;
    assert_eq!(after.products, before.products);
    assert_eq!(
        after.returns[&fx.record.id].status,
        ReturnStatus::Pending
    );
}

#[tokio::test]
async fn empty_submission_is_refused() {
    let store = MemoryStore::new();
    let fx = seed_basic(&store, None).await;

    let err = process_return(
        &store,
        &EngineSettings::default(),
        &fx.actor,
        fx.record.id,
        &ReturnSubmission::default(),
        Utc::now(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "No items provided");
    assert_eq!(store.commits(), 0);
}
