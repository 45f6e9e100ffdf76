//! Conservation validator.
//!
//! Pure gate in front of every mutation. Each line contributes at most one
//! violation: the first check it fails, in this order:
//!
//! 1. product is known
//! 2. product not already seen in this submission
//! 3. every quantity is non-negative
//! 4. returned + not_used + damaged + lost == delivered
//! 5. damaged > 0 requires a damage reason
//! 6. lost > 0 requires a lost reason
//! 7. effective laundry quantity <= returned

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::types::{non_blank, ReturnLineInput};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    NoItems,
    UnknownProduct {
        product_id: Uuid,
    },
    DuplicateProduct {
        product_id: Uuid,
    },
    NegativeQuantity {
        product_id: Uuid,
        field: &'static str,
        value: i64,
    },
    QuantityMismatch {
        product_id: Uuid,
        delivered: i64,
        accounted: i64,
    },
    MissingDamageReason {
        product_id: Uuid,
    },
    MissingLostReason {
        product_id: Uuid,
    },
    LaundryQuantityExceedsUsed {
        product_id: Uuid,
        to_laundry: i64,
        returned: i64,
    },
}

impl Violation {
    pub fn product_id(&self) -> Option<Uuid> {
        match self {
            Violation::NoItems => None,
            Violation::UnknownProduct { product_id }
            | Violation::DuplicateProduct { product_id }
            | Violation::NegativeQuantity { product_id, .. }
            | Violation::QuantityMismatch { product_id, .. }
            | Violation::MissingDamageReason { product_id }
            | Violation::MissingLostReason { product_id }
            | Violation::LaundryQuantityExceedsUsed { product_id, .. } => Some(*product_id),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Violation::NoItems => "NO_ITEMS",
            Violation::UnknownProduct { .. } => "UNKNOWN_PRODUCT",
            Violation::DuplicateProduct { .. } => "DUPLICATE_PRODUCT",
            Violation::NegativeQuantity { .. } => "NEGATIVE_QUANTITY",
            Violation::QuantityMismatch { .. } => "QUANTITY_MISMATCH",
            Violation::MissingDamageReason { .. } => "MISSING_DAMAGE_REASON",
            Violation::MissingLostReason { .. } => "MISSING_LOST_REASON",
            Violation::LaundryQuantityExceedsUsed { .. } => "LAUNDRY_QUANTITY_EXCEEDS_USED",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NoItems => write!(f, "No items provided"),
            Violation::UnknownProduct { product_id } => {
                write!(f, "Product {} not found", product_id)
            }
            Violation::DuplicateProduct { product_id } => {
                write!(f, "Product {} appears more than once", product_id)
            }
            Violation::NegativeQuantity {
                product_id,
                field,
                value,
            } => write!(
                f,
                "Negative {} ({}) for product {}",
                field, value, product_id
            ),
            Violation::QuantityMismatch {
                product_id,
                delivered,
                accounted,
            } => write!(
                f,
                "Quantity mismatch for product {}. Delivered: {}, Accounted: {}",
                product_id, delivered, accounted
            ),
            Violation::MissingDamageReason { product_id } => {
                write!(f, "Damage reason required for product {}", product_id)
            }
            Violation::MissingLostReason { product_id } => {
                write!(f, "Lost reason required for product {}", product_id)
            }
            Violation::LaundryQuantityExceedsUsed {
                product_id,
                to_laundry,
                returned,
            } => write!(
                f,
                "Laundry quantity {} exceeds used quantity {} for product {}",
                to_laundry, returned, product_id
            ),
        }
    }
}

/// Every violation found, in submission order. Never empty when returned
/// from [`validate_submission`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "validation passed"),
        }
    }
}

impl std::error::Error for ValidationReport {}

/// A line that passed every check, with its laundry quantity resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedLine {
    pub input: ReturnLineInput,
    pub effective_to_laundry: i64,
}

impl ValidatedLine {
    pub fn product_id(&self) -> Uuid {
        self.input.product_id
    }
}

/// Explicit per-line value wins; otherwise the submission flag routes all
/// used units to laundry.
pub fn effective_to_laundry(line: &ReturnLineInput, send_to_laundry: bool) -> i64 {
    match line.qty_to_laundry {
        Some(q) => q,
        None if send_to_laundry => line.qty_returned,
        None => 0,
    }
}

pub fn validate_submission(
    items: &[ReturnLineInput],
    send_to_laundry: bool,
    known_products: &BTreeSet<Uuid>,
) -> Result<Vec<ValidatedLine>, ValidationReport> {
    let violations = collect_violations(items, send_to_laundry, known_products);
    if !violations.is_empty() {
        return Err(ValidationReport { violations });
    }

    Ok(items
        .iter()
        .map(|line| ValidatedLine {
            effective_to_laundry: effective_to_laundry(line, send_to_laundry),
            input: line.clone(),
        })
        .collect())
}

/// Same checks as [`validate_submission`] without producing lines. Used by
/// the preview, which reports violations instead of refusing.
pub fn collect_violations(
    items: &[ReturnLineInput],
    send_to_laundry: bool,
    known_products: &BTreeSet<Uuid>,
) -> Vec<Violation> {
    if items.is_empty() {
        return vec![Violation::NoItems];
    }

    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for line in items {
        let first_seen = seen.insert(line.product_id);
        if let Some(v) = check_line(line, send_to_laundry, known_products, first_seen) {
            out.push(v);
        }
    }
    out
}

fn check_line(
    line: &ReturnLineInput,
    send_to_laundry: bool,
    known_products: &BTreeSet<Uuid>,
    first_seen: bool,
) -> Option<Violation> {
    let product_id = line.product_id;

    if !known_products.contains(&product_id) {
        return Some(Violation::UnknownProduct { product_id });
    }
    if !first_seen {
        return Some(Violation::DuplicateProduct { product_id });
    }

    let to_laundry = effective_to_laundry(line, send_to_laundry);
    let fields = [
        ("qty_delivered", line.qty_delivered),
        ("qty_returned", line.qty_returned),
        ("qty_not_used", line.qty_not_used),
        ("qty_damaged", line.qty_damaged),
        ("qty_lost", line.qty_lost),
        ("qty_to_laundry", to_laundry),
    ];
    if let Some((field, value)) = fields.into_iter().find(|(_, v)| *v < 0) {
        return Some(Violation::NegativeQuantity {
            product_id,
            field,
            value,
        });
    }

    let accounted = i128::from(line.qty_returned)
        + i128::from(line.qty_not_used)
        + i128::from(line.qty_damaged)
        + i128::from(line.qty_lost);
    if accounted != i128::from(line.qty_delivered) {
        return Some(Violation::QuantityMismatch {
            product_id,
            delivered: line.qty_delivered,
            accounted: i64::try_from(accounted).unwrap_or(i64::MAX),
        });
    }

    if line.qty_damaged > 0 && non_blank(&line.damage_reason).is_none() {
        return Some(Violation::MissingDamageReason { product_id });
    }
    if line.qty_lost > 0 && non_blank(&line.lost_reason).is_none() {
        return Some(Violation::MissingLostReason { product_id });
    }

    if to_laundry > line.qty_returned {
        return Some(Violation::LaundryQuantityExceedsUsed {
            product_id,
            to_laundry,
            returned: line.qty_returned,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_laundry_quantity_overrides_flag() {
        let mut line = ReturnLineInput::new(Uuid::new_v4(), 4);
        line.qty_returned = 4;
        line.qty_to_laundry = Some(1);
        assert_eq!(effective_to_laundry(&line, true), 1);
        assert_eq!(effective_to_laundry(&line, false), 1);
    }

    #[test]
    fn flag_routes_all_used_units_when_quantity_absent() {
        let mut line = ReturnLineInput::new(Uuid::new_v4(), 4);
        line.qty_returned = 3;
        assert_eq!(effective_to_laundry(&line, true), 3);
        assert_eq!(effective_to_laundry(&line, false), 0);
    }

    #[test]
    fn blank_reason_counts_as_missing() {
        let id = Uuid::new_v4();
        let known: BTreeSet<Uuid> = [id].into_iter().collect();
        let mut line = ReturnLineInput::new(id, 2);
        line.qty_damaged = 2;
        line.damage_reason = Some("   ".to_string());

        let err = validate_submission(&[line], false, &known).unwrap_err();
        assert_eq!(err.violations, vec![Violation::MissingDamageReason { product_id: id }]);
    }
}
