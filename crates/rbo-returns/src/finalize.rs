//! Return finalizer: totals, completion record, booking status update.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::laundry::LaundryBatchPlan;
use crate::types::{BookingSource, ReturnRecord, ReturnStatus};
use crate::validate::ValidatedLine;

pub const BOOKING_STATUS_RETURNED: &str = "returned";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnTotals {
    pub total_items: i64,
    pub total_returned: i64,
    pub total_damaged: i64,
    pub total_lost: i64,
}

impl ReturnTotals {
    pub fn from_lines(lines: &[ValidatedLine]) -> Self {
        lines.iter().fold(Self::default(), |acc, l| Self {
            total_items: acc.total_items.saturating_add(l.input.qty_delivered),
            total_returned: acc.total_returned.saturating_add(l.input.qty_returned),
            total_damaged: acc.total_damaged.saturating_add(l.input.qty_damaged),
            total_lost: acc.total_lost.saturating_add(l.input.qty_lost),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnCompletion {
    pub return_id: Uuid,
    pub status: ReturnStatus,
    pub processed_by: Uuid,
    pub processed_at: DateTime<Utc>,
    pub send_to_laundry: bool,
    pub laundry_batch_id: Option<Uuid>,
    pub laundry_batch_created: bool,
    pub notes: Option<String>,
    pub processing_notes: Option<String>,
    pub totals: ReturnTotals,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStatusUpdate {
    pub booking_id: Uuid,
    pub source: BookingSource,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlreadyProcessed {
    pub return_id: Uuid,
}

impl fmt::Display for AlreadyProcessed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Return {} has already been processed", self.return_id)
    }
}

impl std::error::Error for AlreadyProcessed {}

/// `completed` is terminal.
pub fn ensure_pending(record: &ReturnRecord) -> Result<(), AlreadyProcessed> {
    if record.status.is_terminal() {
        return Err(AlreadyProcessed {
            return_id: record.id,
        });
    }
    Ok(())
}

pub struct FinalizeInput<'a> {
    pub record: &'a ReturnRecord,
    pub processed_by: Uuid,
    pub now: DateTime<Utc>,
    pub send_to_laundry: bool,
    pub notes: Option<&'a str>,
    pub processing_notes: Option<&'a str>,
    pub laundry: Option<&'a LaundryBatchPlan>,
    pub totals: ReturnTotals,
}

pub fn finalize(input: FinalizeInput<'_>) -> (ReturnCompletion, BookingStatusUpdate) {
    let record = input.record;
    let batch_id = input.laundry.map(|b| b.id);

    // Blank submitted notes keep whatever the return already carried.
    let notes = input
        .notes
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .or_else(|| record.notes.clone());

    let completion = ReturnCompletion {
        return_id: record.id,
        status: ReturnStatus::Completed,
        processed_by: input.processed_by,
        processed_at: input.now,
        send_to_laundry: input.send_to_laundry || batch_id.is_some(),
        laundry_batch_id: batch_id,
        laundry_batch_created: batch_id.is_some(),
        notes,
        processing_notes: input.processing_notes.map(str::to_string),
        totals: input.totals,
    };

    let booking = BookingStatusUpdate {
        booking_id: record.booking_id,
        source: record.booking_source,
        status: BOOKING_STATUS_RETURNED.to_string(),
    };

    (completion, booking)
}
