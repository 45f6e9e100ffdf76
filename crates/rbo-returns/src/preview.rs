//! Impact preview: the inventory arithmetic of a submission without any
//! mutation, with human-readable warnings per product.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::handover::HandoverLedger;
use crate::inventory::{delta_for, total_would_go_negative};
use crate::types::{ProductInventory, ProductSnapshot, ReturnLineInput};
use crate::validate::effective_to_laundry;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StockPools {
    pub total: i64,
    pub available: i64,
    pub damaged: i64,
    pub booked: i64,
    pub in_laundry: i64,
}

impl From<ProductInventory> for StockPools {
    fn from(inv: ProductInventory) -> Self {
        Self {
            total: inv.stock_total,
            available: inv.stock_available,
            damaged: inv.stock_damaged,
            booked: inv.stock_booked,
            in_laundry: inv.stock_in_laundry,
        }
    }
}

impl StockPools {
    fn minus(&self, before: &StockPools) -> StockPools {
        StockPools {
            total: self.total.saturating_sub(before.total),
            available: self.available.saturating_sub(before.available),
            damaged: self.damaged.saturating_sub(before.damaged),
            booked: self.booked.saturating_sub(before.booked),
            in_laundry: self.in_laundry.saturating_sub(before.in_laundry),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PreviewQuantities {
    pub delivered: i64,
    pub returned: i64,
    pub to_laundry: i64,
    pub not_used: i64,
    pub damaged: i64,
    pub lost: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductPreview {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub category: Option<String>,
    pub current_stock: StockPools,
    pub new_stock: StockPools,
    pub changes: StockPools,
    pub quantities: PreviewQuantities,
    pub warnings: Vec<String>,
}

/// One entry per submitted line whose product exists. Unknown products are
/// left to the validator's report.
pub fn preview_lines(
    items: &[ReturnLineInput],
    send_to_laundry: bool,
    products: &BTreeMap<Uuid, ProductSnapshot>,
    ledger: &HandoverLedger,
) -> Vec<ProductPreview> {
    items
        .iter()
        .filter_map(|line| {
            let product = products.get(&line.product_id)?;
            Some(preview_line(line, send_to_laundry, product, ledger))
        })
        .collect()
}

fn preview_line(
    line: &ReturnLineInput,
    send_to_laundry: bool,
    product: &ProductSnapshot,
    ledger: &HandoverLedger,
) -> ProductPreview {
    let to_laundry = effective_to_laundry(line, send_to_laundry);
    let delta = delta_for(line, to_laundry, ledger.adjustment_for(line.product_id));

    let current = product.inventory;
    let projected = current.apply(&delta);

    let mut warnings = Vec::new();
    if total_would_go_negative(&current, &delta) {
        warnings.push("Total stock would go negative".to_string());
    }
    if projected.stock_available < 0 {
        warnings.push("Available stock would go negative".to_string());
    }
    if delta.lost > 0 {
        warnings.push(format!("{} items will be permanently removed", delta.lost));
    }
    if delta.damaged > 0 {
        warnings.push(format!("{} items will be archived as damaged", delta.damaged));
    }
    if delta.to_laundry > 0 {
        warnings.push(format!("{} used items will be sent to laundry", delta.to_laundry));
    }
    let unused_direct = line.qty_not_used.saturating_sub(delta.already_restocked);
    if unused_direct > 0 {
        warnings.push(format!(
            "{} unused items will go directly to available",
            unused_direct
        ));
    }
    if delta.already_restocked > 0 {
        warnings.push(format!(
            "{} units already restocked at handover",
            delta.already_restocked
        ));
    }

    let current_stock = StockPools::from(current);
    let new_stock = StockPools::from(projected);

    ProductPreview {
        product_id: product.id,
        product_name: product.name.clone(),
        product_code: product.product_code.clone(),
        category: product.category.clone(),
        current_stock,
        new_stock,
        changes: new_stock.minus(&current_stock),
        quantities: PreviewQuantities {
            delivered: line.qty_delivered,
            returned: line.qty_returned,
            to_laundry,
            not_used: line.qty_not_used,
            damaged: line.qty_damaged,
            lost: line.qty_lost,
        },
        warnings,
    }
}
