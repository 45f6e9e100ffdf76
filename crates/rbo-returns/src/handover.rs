//! Handover ledger.
//!
//! At delivery handover some units may already have been restocked or routed
//! to laundry. The return must not count them a second time, so the ledger
//! for the return's delivery is read once and fed into the inventory delta.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::store::ReturnStore;

/// One row of the handover checkpoint for a delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoverEntry {
    pub delivery_id: Uuid,
    pub product_id: Uuid,
    pub restocked_qty: i64,
    pub returned_laundry_qty: i64,
}

/// Where the ledger came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerSource {
    /// Return has no delivery; nothing to discount.
    NoDelivery,
    Loaded,
    /// Reader failed and policy allowed proceeding without the discount.
    Unavailable,
}

impl LedgerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerSource::NoDelivery => "no_delivery",
            LedgerSource::Loaded => "loaded",
            LedgerSource::Unavailable => "unavailable",
        }
    }
}

/// Per-product amounts already handled at handover.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandoverAdjustment {
    pub restocked_qty: i64,
    pub returned_laundry_qty: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandoverLedger {
    source: LedgerSource,
    already_restocked: BTreeMap<Uuid, i64>,
    already_to_laundry: BTreeMap<Uuid, i64>,
}

impl HandoverLedger {
    pub fn empty(source: LedgerSource) -> Self {
        Self {
            source,
            already_restocked: BTreeMap::new(),
            already_to_laundry: BTreeMap::new(),
        }
    }

    /// Rows for the same product are summed.
    pub fn from_entries(entries: &[HandoverEntry]) -> Self {
        let mut ledger = Self::empty(LedgerSource::Loaded);
        for e in entries {
            let r = ledger.already_restocked.entry(e.product_id).or_insert(0);
            *r = r.saturating_add(e.restocked_qty);
            let l = ledger.already_to_laundry.entry(e.product_id).or_insert(0);
            *l = l.saturating_add(e.returned_laundry_qty);
        }
        ledger
    }

    pub fn source(&self) -> LedgerSource {
        self.source
    }

    pub fn adjustment_for(&self, product_id: Uuid) -> HandoverAdjustment {
        HandoverAdjustment {
            restocked_qty: self.already_restocked.get(&product_id).copied().unwrap_or(0),
            returned_laundry_qty: self
                .already_to_laundry
                .get(&product_id)
                .copied()
                .unwrap_or(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// What to do when the handover ledger cannot be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoverFallback {
    /// Proceed with an empty ledger (no discount).
    #[default]
    Proceed,
    /// Refuse the return before any mutation.
    Reject,
}

impl HandoverFallback {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandoverFallback::Proceed => "proceed",
            HandoverFallback::Reject => "reject",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "proceed" => Ok(HandoverFallback::Proceed),
            "reject" => Ok(HandoverFallback::Reject),
            other => Err(anyhow!("invalid handover fallback policy: {}", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandoverUnavailable {
    pub delivery_id: Uuid,
    pub cause: String,
}

impl fmt::Display for HandoverUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "handover ledger for delivery {} unavailable: {}",
            self.delivery_id, self.cause
        )
    }
}

impl std::error::Error for HandoverUnavailable {}

pub async fn read_handover_ledger(
    store: &dyn ReturnStore,
    delivery_id: Option<Uuid>,
    fallback: HandoverFallback,
) -> Result<HandoverLedger, HandoverUnavailable> {
    let Some(delivery_id) = delivery_id else {
        return Ok(HandoverLedger::empty(LedgerSource::NoDelivery));
    };

    match store.fetch_handover_entries(delivery_id).await {
        Ok(entries) => Ok(HandoverLedger::from_entries(&entries)),
        Err(err) => match fallback {
            HandoverFallback::Proceed => {
                warn!(
                    delivery_id = %delivery_id,
                    error = %format!("{err:#}"),
                    "handover ledger unavailable; proceeding without handover adjustment"
                );
                Ok(HandoverLedger::empty(LedgerSource::Unavailable))
            }
            HandoverFallback::Reject => Err(HandoverUnavailable {
                delivery_id,
                cause: format!("{err:#}"),
            }),
        },
    }
}
