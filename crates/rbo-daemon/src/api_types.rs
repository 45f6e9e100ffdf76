//! Request and response bodies for the rbo-daemon HTTP endpoints.
//!
//! The request body is [`rbo_returns::ReturnSubmission`] as-is. No business
//! logic lives here.

use rbo_returns::{LedgerSource, ProcessSummary, ReturnPreview};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// POST /v1/returns/:id/process
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResults {
    pub items_processed: usize,
    pub inventory_updated: usize,
    pub items_archived: usize,
    pub laundry_batch_id: Option<Uuid>,
    pub total_items: i64,
    pub total_returned: i64,
    pub total_damaged: i64,
    pub total_lost: i64,
    pub handover_source: LedgerSource,
    pub booking_updated: bool,
}

impl From<ProcessSummary> for ProcessResults {
    fn from(s: ProcessSummary) -> Self {
        Self {
            items_processed: s.items_processed,
            inventory_updated: s.inventory_updated,
            items_archived: s.items_archived,
            laundry_batch_id: s.laundry_batch_id,
            total_items: s.totals.total_items,
            total_returned: s.totals.total_returned,
            total_damaged: s.totals.total_damaged,
            total_lost: s.totals.total_lost,
            handover_source: s.handover_source,
            booking_updated: s.booking_updated,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub return_id: Uuid,
    pub results: ProcessResults,
}

// ---------------------------------------------------------------------------
// POST /v1/returns/:id/preview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub success: bool,
    #[serde(flatten)]
    pub preview: ReturnPreview,
}
