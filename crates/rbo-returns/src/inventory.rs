//! Inventory deltas.
//!
//! Per validated line, exact:
//!
//! ```text
//! already_restocked   = min(handover.restocked, not_used)
//! already_to_laundry  = max(0, handover.returned_laundry)
//! to_available        = (not_used - already_restocked) + (returned - to_laundry)
//! booked_release      = max(0, delivered - (handover.restocked + already_to_laundry))
//!
//! stock_available  += to_available
//! stock_damaged    += damaged
//! stock_total       = max(0, stock_total - lost)
//! stock_in_laundry += to_laundry
//! stock_booked      = max(0, stock_booked - booked_release)
//! ```
//!
//! Stores apply these as per-field increments; [`ProductInventory::apply`] is
//! the in-memory equivalent.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handover::HandoverAdjustment;
use crate::types::{ProductInventory, ReturnLineInput};
use crate::validate::ValidatedLine;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDelta {
    pub product_id: Uuid,
    pub to_available: i64,
    pub damaged: i64,
    pub lost: i64,
    pub to_laundry: i64,
    pub booked_release: i64,
    /// Unused units already put back at handover (not re-added).
    pub already_restocked: i64,
    /// Units already sent to laundry at handover.
    pub already_to_laundry: i64,
}

pub fn compute_delta(line: &ValidatedLine, adj: HandoverAdjustment) -> InventoryDelta {
    delta_for(&line.input, line.effective_to_laundry, adj)
}

/// Delta for a raw line with an already resolved laundry quantity. The
/// preview calls this on unvalidated input, so nothing here may panic.
pub fn delta_for(
    line: &ReturnLineInput,
    effective_to_laundry: i64,
    adj: HandoverAdjustment,
) -> InventoryDelta {
    let already_restocked = adj.restocked_qty.min(line.qty_not_used);
    let already_to_laundry = adj.returned_laundry_qty.max(0);

    let unused_to_available = line.qty_not_used.saturating_sub(already_restocked);
    let used_to_available = line.qty_returned.saturating_sub(effective_to_laundry);
    let to_available = unused_to_available.saturating_add(used_to_available);

    let handled_at_handover = adj.restocked_qty.saturating_add(already_to_laundry);
    let booked_release = line.qty_delivered.saturating_sub(handled_at_handover).max(0);

    InventoryDelta {
        product_id: line.product_id,
        to_available,
        damaged: line.qty_damaged,
        lost: line.qty_lost,
        to_laundry: effective_to_laundry,
        booked_release,
        already_restocked,
        already_to_laundry,
    }
}

impl ProductInventory {
    /// Pools after `delta`. Booked and total are floored at zero.
    pub fn apply(&self, delta: &InventoryDelta) -> ProductInventory {
        ProductInventory {
            stock_total: self.stock_total.saturating_sub(delta.lost).max(0),
            stock_available: self.stock_available.saturating_add(delta.to_available),
            stock_booked: self.stock_booked.saturating_sub(delta.booked_release).max(0),
            stock_damaged: self.stock_damaged.saturating_add(delta.damaged),
            stock_in_laundry: self.stock_in_laundry.saturating_add(delta.to_laundry),
        }
    }

    /// True when some pool is below zero.
    pub fn has_negative_pool(&self) -> bool {
        self.stock_total < 0
            || self.stock_available < 0
            || self.stock_booked < 0
            || self.stock_damaged < 0
            || self.stock_in_laundry < 0
    }
}

/// `stock_total - lost` before the floor engages.
pub fn total_would_go_negative(current: &ProductInventory, delta: &InventoryDelta) -> bool {
    current.stock_total.saturating_sub(delta.lost) < 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_units_floor_total_at_zero() {
        let current = ProductInventory {
            stock_total: 1,
            ..Default::default()
        };
        let delta = InventoryDelta {
            product_id: Uuid::new_v4(),
            to_available: 0,
            damaged: 0,
            lost: 3,
            to_laundry: 0,
            booked_release: 0,
            already_restocked: 0,
            already_to_laundry: 0,
        };
        assert!(total_would_go_negative(&current, &delta));
        assert_eq!(current.apply(&delta).stock_total, 0);
    }
}
