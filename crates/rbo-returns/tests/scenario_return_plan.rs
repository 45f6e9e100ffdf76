//! Return plan scenarios: archive drafts, laundry batch threshold, totals and
//! completion record, built without any store.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use rbo_returns::*;
use uuid::Uuid;

struct Fixture {
    record: ReturnRecord,
    actor: Actor,
    products: BTreeMap<Uuid, ProductSnapshot>,
}

fn product(name: &str, category: &str) -> ProductSnapshot {
    ProductSnapshot {
        id: Uuid::new_v4(),
        name: name.to_string(),
        product_code: Some(format!("{}-001", name.to_uppercase())),
        barcode: None,
        category: Some(category.to_string()),
        image_url: None,
        rental_price_micros: Some(15 * MICROS_SCALE),
        sale_price_micros: None,
        price_micros: Some(120 * MICROS_SCALE),
        inventory: ProductInventory {
            stock_total: 50,
            stock_available: 30,
            stock_booked: 20,
            stock_damaged: 0,
            stock_in_laundry: 0,
        },
    }
}

fn fixture(products: Vec<ProductSnapshot>) -> Fixture {
    let franchise = Uuid::new_v4();
    Fixture {
        record: ReturnRecord {
            id: Uuid::new_v4(),
            return_number: "RET-0042".to_string(),
            booking_id: Uuid::new_v4(),
            booking_source: BookingSource::PackageBooking,
            delivery_id: Some(Uuid::new_v4()),
            franchise_id: franchise,
            status: ReturnStatus::Pending,
            notes: Some("customer called ahead".to_string()),
        },
        actor: Actor::new(Uuid::new_v4(), ActorRole::Staff, Some(franchise)),
        products: products.into_iter().map(|p| (p.id, p)).collect(),
    }
}

fn plan_for(fx: &Fixture, sub: &ReturnSubmission) -> ReturnPlan {
    let known = fx.products.keys().copied().collect();
    let lines = validate_submission(&sub.items, sub.send_to_laundry, &known).unwrap();
    let ctx = PlanContext {
        record: &fx.record,
        actor: &fx.actor,
        now: Utc.timestamp_millis_opt(1_717_171_234_567).unwrap(),
        batch_prefix: DEFAULT_BATCH_PREFIX,
        send_to_laundry: sub.send_to_laundry,
        notes: sub.notes.as_deref(),
        processing_notes: sub.processing_notes.as_deref(),
    };
    build_plan(
        &ctx,
        &lines,
        &fx.products,
        &HandoverLedger::empty(LedgerSource::Loaded),
    )
    .unwrap()
}

#[test]
fn scenario_all_to_laundry_builds_one_batch() {
    let chair = product("chair", "furniture");
    let pid = chair.id;
    let fx = fixture(vec![chair]);

    let mut l = ReturnLineInput::new(pid, 10);
    l.qty_returned = 10;
    l.qty_to_laundry = Some(10);
    let sub = ReturnSubmission {
        items: vec![l],
        ..Default::default()
    };

    let plan = plan_for(&fx, &sub);
    assert_eq!(plan.inventory[0].to_available, 0);
    assert_eq!(plan.inventory[0].to_laundry, 10);

    let batch = plan.laundry.as_ref().expect("batch");
    assert_eq!(batch.total_items, 10);
    assert_eq!(batch.batch_number, "LB-RET-234567");
    assert!(batch.auto_created);
    assert_eq!(batch.status, BATCH_STATUS_PENDING);
    assert_eq!(batch.notes, "Auto-created from return RET-0042");
    assert_eq!(batch.items.len(), 1);
    assert_eq!(batch.items[0].product_name, "chair");
    assert_eq!(batch.items[0].product_category.as_deref(), Some("furniture"));
    assert_eq!(batch.items[0].condition_before, CONDITION_BEFORE_DIRTY);

    assert_eq!(plan.completion.status, ReturnStatus::Completed);
    assert_eq!(plan.completion.laundry_batch_id, Some(batch.id));
    assert!(plan.completion.laundry_batch_created);
    // Flag was false but a batch was built.
    assert!(plan.completion.send_to_laundry);
    assert_eq!(plan.booking.status, BOOKING_STATUS_RETURNED);
    assert_eq!(plan.booking.source, BookingSource::PackageBooking);
}

#[test]
fn scenario_zero_laundry_builds_no_batch() {
    let chair = product("chair", "furniture");
    let pid = chair.id;
    let fx = fixture(vec![chair]);

    let mut l = ReturnLineInput::new(pid, 4);
    l.qty_returned = 4;
    let sub = ReturnSubmission {
        items: vec![l],
        send_to_laundry: false,
        ..Default::default()
    };

    let plan = plan_for(&fx, &sub);
    assert!(plan.laundry.is_none());
    assert_eq!(plan.completion.laundry_batch_id, None);
    assert!(!plan.completion.laundry_batch_created);
    assert!(!plan.completion.send_to_laundry);
    assert!(!plan.lines[0].sent_to_laundry);
}

#[test]
fn scenario_totals_are_fieldwise_sums() {
    let a = product("plate", "tableware");
    let b = product("glass", "tableware");
    let (pa, pb) = (a.id, b.id);
    let fx = fixture(vec![a, b]);

    let mut la = ReturnLineInput::new(pa, 10);
    la.qty_returned = 6;
    la.qty_damaged = 3;
    la.damage_reason = Some("chipped".to_string());
    la.qty_lost = 1;
    la.lost_reason = Some("missing".to_string());
    let mut lb = ReturnLineInput::new(pb, 7);
    lb.qty_returned = 5;
    lb.qty_not_used = 2;

    let sub = ReturnSubmission {
        items: vec![la, lb],
        send_to_laundry: true,
        ..Default::default()
    };
    let plan = plan_for(&fx, &sub);

    assert_eq!(
        plan.totals(),
        ReturnTotals {
            total_items: 17,
            total_returned: 11,
            total_damaged: 3,
            total_lost: 1,
        }
    );
    assert_eq!(plan.laundry.as_ref().map(|b| b.total_items), Some(11));
}

#[test]
fn scenario_archive_drafts_carry_snapshot_and_defaults() {
    let plate = product("plate", "tableware");
    let pid = plate.id;
    let fx = fixture(vec![plate]);

    let mut l = ReturnLineInput::new(pid, 5);
    l.qty_returned = 2;
    l.qty_damaged = 2;
    l.damage_reason = Some("cracked".to_string());
    l.damage_severity = Some("severe".to_string());
    l.qty_lost = 1;
    l.lost_reason = Some("stolen".to_string());
    l.lost_description = Some("taken from venue".to_string());
    let sub = ReturnSubmission {
        items: vec![l],
        ..Default::default()
    };

    let plan = plan_for(&fx, &sub);
    assert_eq!(plan.archives.len(), 2);
    assert!(plan.lines[0].archived);

    let damaged = &plan.archives[0];
    assert_eq!(damaged.reason, ArchiveReason::Damaged);
    assert_eq!(damaged.quantity, 2);
    assert_eq!(damaged.notes, DEFAULT_DAMAGED_NOTES);
    assert_eq!(damaged.severity.as_deref(), Some("severe"));
    assert_eq!(damaged.return_id, fx.record.id);
    assert_eq!(damaged.delivery_id, fx.record.delivery_id);
    assert_eq!(damaged.archived_by, fx.actor.user_id);
    assert_eq!(damaged.franchise_id, fx.record.franchise_id);
    assert_eq!(damaged.original_rental_price_micros, Some(15 * MICROS_SCALE));
    // No sale price: falls back to list price.
    assert_eq!(damaged.original_sale_price_micros, Some(120 * MICROS_SCALE));

    let lost = &plan.archives[1];
    assert_eq!(lost.reason, ArchiveReason::Stolen);
    assert_eq!(lost.quantity, 1);
    assert_eq!(lost.notes, "taken from venue");
    assert_eq!(lost.lost_reason.as_deref(), Some("stolen"));
}

#[test]
fn scenario_non_stolen_lost_reason_archives_as_lost() {
    assert_eq!(ArchiveReason::for_lost_reason("left at venue"), ArchiveReason::Lost);
    assert_eq!(ArchiveReason::for_lost_reason("stolen"), ArchiveReason::Stolen);
}

#[test]
fn scenario_submitted_notes_override_existing_blank_keeps_existing() {
    let chair = product("chair", "furniture");
    let pid = chair.id;
    let fx = fixture(vec![chair]);

    let mut l = ReturnLineInput::new(pid, 1);
    l.qty_returned = 1;

    let mut sub = ReturnSubmission {
        items: vec![l],
        notes: Some("all good".to_string()),
        processing_notes: Some("checked by ops".to_string()),
        ..Default::default()
    };
    let plan = plan_for(&fx, &sub);
    assert_eq!(plan.completion.notes.as_deref(), Some("all good"));
    assert_eq!(plan.completion.processing_notes.as_deref(), Some("checked by ops"));

    sub.notes = Some("  ".to_string());
    let plan = plan_for(&fx, &sub);
    assert_eq!(plan.completion.notes.as_deref(), Some("customer called ahead"));
}

#[test]
fn scenario_plan_refuses_product_missing_from_snapshot() {
    let chair = product("chair", "furniture");
    let fx = fixture(vec![]);
    let mut l = ReturnLineInput::new(chair.id, 1);
    l.qty_returned = 1;
    let lines = vec![ValidatedLine {
        input: l,
        effective_to_laundry: 0,
    }];
    let ctx = PlanContext {
        record: &fx.record,
        actor: &fx.actor,
        now: Utc::now(),
        batch_prefix: DEFAULT_BATCH_PREFIX,
        send_to_laundry: false,
        notes: None,
        processing_notes: None,
    };

    let err = build_plan(
        &ctx,
        &lines,
        &fx.products,
        &HandoverLedger::empty(LedgerSource::NoDelivery),
    )
    .unwrap_err();
    assert_eq!(
        err.violations,
        vec![Violation::UnknownProduct {
            product_id: chair.id
        }]
    );
}
