//! Archive drafts for damaged and lost units.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{non_blank, ProductSnapshot, ReturnRecord};
use crate::validate::ValidatedLine;

pub const DEFAULT_DAMAGED_NOTES: &str = "Damaged during rental";
pub const DEFAULT_LOST_NOTES: &str = "Lost during rental";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveReason {
    Damaged,
    Lost,
    Stolen,
}

impl ArchiveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveReason::Damaged => "damaged",
            ArchiveReason::Lost => "lost",
            ArchiveReason::Stolen => "stolen",
        }
    }

    /// `stolen` is its own archive category; every other lost reason is `lost`.
    pub fn for_lost_reason(reason: &str) -> Self {
        if reason.trim().eq_ignore_ascii_case("stolen") {
            ArchiveReason::Stolen
        } else {
            ArchiveReason::Lost
        }
    }
}

/// Archive row to insert. Carries a product snapshot so the record stays
/// meaningful after the product changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveDraft {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub reason: ArchiveReason,
    pub damage_reason: Option<String>,
    pub lost_reason: Option<String>,
    pub severity: Option<String>,
    pub notes: String,
    pub quantity: i64,
    pub return_id: Uuid,
    pub delivery_id: Option<Uuid>,
    pub original_rental_price_micros: Option<i64>,
    pub original_sale_price_micros: Option<i64>,
    pub archived_by: Uuid,
    pub franchise_id: Uuid,
}

/// Zero, one or two drafts: one per nonzero damaged/lost outcome.
pub fn archive_drafts(
    line: &ValidatedLine,
    product: &ProductSnapshot,
    record: &ReturnRecord,
    archived_by: Uuid,
) -> Vec<ArchiveDraft> {
    let input = &line.input;
    let base = |reason: ArchiveReason, quantity: i64, notes: String| ArchiveDraft {
        product_id: product.id,
        product_name: product.name.clone(),
        product_code: product.product_code.clone(),
        barcode: product.barcode.clone(),
        category: product.category.clone(),
        image_url: product.image_url.clone(),
        reason,
        damage_reason: None,
        lost_reason: None,
        severity: None,
        notes,
        quantity,
        return_id: record.id,
        delivery_id: record.delivery_id,
        original_rental_price_micros: product.rental_price_micros,
        original_sale_price_micros: product.original_sale_price_micros(),
        archived_by,
        franchise_id: record.franchise_id,
    };

    let mut out = Vec::with_capacity(2);

    if input.qty_damaged > 0 {
        let notes = non_blank(&input.damage_description).unwrap_or(DEFAULT_DAMAGED_NOTES);
        let mut d = base(ArchiveReason::Damaged, input.qty_damaged, notes.to_string());
        d.damage_reason = input.damage_reason.clone();
        d.severity = input.damage_severity.clone();
        out.push(d);
    }

    if input.qty_lost > 0 {
        let reason = non_blank(&input.lost_reason)
            .map(ArchiveReason::for_lost_reason)
            .unwrap_or(ArchiveReason::Lost);
        let notes = non_blank(&input.lost_description).unwrap_or(DEFAULT_LOST_NOTES);
        let mut d = base(reason, input.qty_lost, notes.to_string());
        d.lost_reason = input.lost_reason.clone();
        out.push(d);
    }

    out
}
