//! Laundry batch builder: one pending batch per return, only when some line
//! routes units to laundry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ProductSnapshot, ReturnRecord};
use crate::validate::ValidatedLine;

pub const DEFAULT_BATCH_PREFIX: &str = "LB-RET-";
pub const BATCH_STATUS_PENDING: &str = "pending";
pub const CONDITION_BEFORE_DIRTY: &str = "dirty";

/// `<prefix><last 6 digits of epoch millis>`.
pub fn batch_number(prefix: &str, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().rem_euclid(1_000_000);
    format!("{}{:06}", prefix, millis)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaundryItemPlan {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_category: Option<String>,
    pub quantity: i64,
    pub condition_before: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaundryBatchPlan {
    /// Assigned up front so the return can reference the batch within the
    /// same transaction.
    pub id: Uuid,
    pub batch_number: String,
    pub return_id: Uuid,
    pub franchise_id: Uuid,
    pub created_by: Uuid,
    pub auto_created: bool,
    pub status: String,
    pub total_items: i64,
    pub notes: String,
    pub items: Vec<LaundryItemPlan>,
}

pub struct LaundryContext<'a> {
    pub record: &'a ReturnRecord,
    pub created_by: Uuid,
    pub batch_prefix: &'a str,
    pub now: DateTime<Utc>,
}

pub fn build_laundry_batch(
    lines: &[ValidatedLine],
    products: &BTreeMap<Uuid, ProductSnapshot>,
    ctx: &LaundryContext<'_>,
) -> Option<LaundryBatchPlan> {
    let items: Vec<LaundryItemPlan> = lines
        .iter()
        .filter(|l| l.effective_to_laundry > 0)
        .map(|l| {
            let product = products.get(&l.product_id());
            LaundryItemPlan {
                product_id: l.product_id(),
                product_name: product
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                product_category: product.and_then(|p| p.category.clone()),
                quantity: l.effective_to_laundry,
                condition_before: CONDITION_BEFORE_DIRTY.to_string(),
            }
        })
        .collect();

    if items.is_empty() {
        return None;
    }

    let total_items = items.iter().fold(0i64, |acc, i| acc.saturating_add(i.quantity));

    Some(LaundryBatchPlan {
        id: Uuid::new_v4(),
        batch_number: batch_number(ctx.batch_prefix, ctx.now),
        return_id: ctx.record.id,
        franchise_id: ctx.record.franchise_id,
        created_by: ctx.created_by,
        auto_created: true,
        status: BATCH_STATUS_PENDING.to_string(),
        total_items,
        notes: format!("Auto-created from return {}", ctx.record.return_number),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn batch_number_uses_last_six_digits_of_millis() {
        let now = Utc.timestamp_millis_opt(1_717_171_234_567).unwrap();
        assert_eq!(batch_number("LB-RET-", now), "LB-RET-234567");
    }

    #[test]
    fn batch_number_zero_pads() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_042).unwrap();
        assert_eq!(batch_number("LB-", now), "LB-000042");
    }
}
