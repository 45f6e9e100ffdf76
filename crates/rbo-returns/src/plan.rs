//! Return plan: every write a return causes, computed up front.
//!
//! Building the plan is pure. A [`crate::ReturnStore`] applies it in one
//! transaction, so a failure anywhere leaves nothing behind.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::archive::{archive_drafts, ArchiveDraft};
use crate::finalize::{finalize, BookingStatusUpdate, FinalizeInput, ReturnCompletion, ReturnTotals};
use crate::handover::{HandoverLedger, LedgerSource};
use crate::inventory::{compute_delta, InventoryDelta};
use crate::laundry::{build_laundry_batch, LaundryBatchPlan, LaundryContext};
use crate::types::{Actor, ProductSnapshot, ReturnRecord};
use crate::validate::{ValidatedLine, ValidationReport, Violation};

/// Line item row as persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLineRow {
    pub return_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub product_category: Option<String>,
    pub qty_delivered: i64,
    pub qty_returned: i64,
    pub qty_to_laundry: i64,
    pub qty_not_used: i64,
    pub qty_damaged: i64,
    pub qty_lost: i64,
    pub damage_reason: Option<String>,
    pub damage_description: Option<String>,
    pub damage_severity: Option<String>,
    pub lost_reason: Option<String>,
    pub lost_description: Option<String>,
    pub notes: Option<String>,
    pub archived: bool,
    pub sent_to_laundry: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnPlan {
    pub return_id: Uuid,
    pub lines: Vec<ReturnLineRow>,
    pub inventory: Vec<InventoryDelta>,
    pub archives: Vec<ArchiveDraft>,
    pub laundry: Option<LaundryBatchPlan>,
    pub completion: ReturnCompletion,
    pub booking: BookingStatusUpdate,
    pub handover_source: LedgerSource,
}

impl ReturnPlan {
    pub fn totals(&self) -> ReturnTotals {
        self.completion.totals
    }

    pub fn laundry_batch_id(&self) -> Option<Uuid> {
        self.laundry.as_ref().map(|b| b.id)
    }
}

pub struct PlanContext<'a> {
    pub record: &'a ReturnRecord,
    pub actor: &'a Actor,
    pub now: DateTime<Utc>,
    pub batch_prefix: &'a str,
    pub send_to_laundry: bool,
    pub notes: Option<&'a str>,
    pub processing_notes: Option<&'a str>,
}

/// `lines` must come from the validator run against the same `products`;
/// a product missing here is reported as unknown rather than skipped.
pub fn build_plan(
    ctx: &PlanContext<'_>,
    lines: &[ValidatedLine],
    products: &BTreeMap<Uuid, ProductSnapshot>,
    ledger: &HandoverLedger,
) -> Result<ReturnPlan, ValidationReport> {
    let record = ctx.record;
    let mut rows = Vec::with_capacity(lines.len());
    let mut inventory = Vec::with_capacity(lines.len());
    let mut archives = Vec::new();

    for line in lines {
        let product_id = line.product_id();
        let product = products.get(&product_id).ok_or_else(|| ValidationReport {
            violations: vec![Violation::UnknownProduct { product_id }],
        })?;

        let drafts = archive_drafts(line, product, record, ctx.actor.user_id);
        let input = &line.input;

        rows.push(ReturnLineRow {
            return_id: record.id,
            product_id,
            product_name: product.name.clone(),
            product_code: product.product_code.clone(),
            product_category: product.category.clone(),
            qty_delivered: input.qty_delivered,
            qty_returned: input.qty_returned,
            qty_to_laundry: line.effective_to_laundry,
            qty_not_used: input.qty_not_used,
            qty_damaged: input.qty_damaged,
            qty_lost: input.qty_lost,
            damage_reason: input.damage_reason.clone(),
            damage_description: input.damage_description.clone(),
            damage_severity: input.damage_severity.clone(),
            lost_reason: input.lost_reason.clone(),
            lost_description: input.lost_description.clone(),
            notes: input.notes.clone(),
            archived: !drafts.is_empty(),
            sent_to_laundry: line.effective_to_laundry > 0,
        });

        inventory.push(compute_delta(line, ledger.adjustment_for(product_id)));
        archives.extend(drafts);
    }

    let laundry = build_laundry_batch(
        lines,
        products,
        &LaundryContext {
            record,
            created_by: ctx.actor.user_id,
            batch_prefix: ctx.batch_prefix,
            now: ctx.now,
        },
    );

    let (completion, booking) = finalize(FinalizeInput {
        record,
        processed_by: ctx.actor.user_id,
        now: ctx.now,
        send_to_laundry: ctx.send_to_laundry,
        notes: ctx.notes,
        processing_notes: ctx.processing_notes,
        laundry: laundry.as_ref(),
        totals: ReturnTotals::from_lines(lines),
    });

    Ok(ReturnPlan {
        return_id: record.id,
        lines: rows,
        inventory,
        archives,
        laundry,
        completion,
        booking,
        handover_source: ledger.source(),
    })
}
