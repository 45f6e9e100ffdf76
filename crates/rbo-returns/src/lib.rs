//! rbo-returns
//!
//! Return reconciliation engine for the rental back office.
//!
//! Closing a rental reconciles what was delivered against what came back and
//! routes each unit to the right stock pool:
//! - conservation: returned + not_used + damaged + lost == delivered
//! - units already handled at delivery handover are never counted twice
//! - damaged / lost units are archived with a product snapshot
//! - used units headed for cleaning become one auto-created laundry batch
//! - the return goes `pending -> completed` exactly once and the booking
//!   becomes `returned`
//!
//! Everything up to [`ReturnPlan`] is pure. A [`ReturnStore`] applies the
//! plan atomically.

mod archive;
mod engine;
mod finalize;
mod handover;
mod inventory;
mod laundry;
mod plan;
mod preview;
mod store;
mod types;
mod validate;

pub use archive::{
    archive_drafts, ArchiveDraft, ArchiveReason, DEFAULT_DAMAGED_NOTES, DEFAULT_LOST_NOTES,
};
pub use engine::{
    preview_return, process_return, EngineSettings, ProcessError, ProcessOutcome, ProcessSummary,
    ReturnPreview,
};
pub use finalize::{
    ensure_pending, finalize, AlreadyProcessed, BookingStatusUpdate, FinalizeInput,
    ReturnCompletion, ReturnTotals, BOOKING_STATUS_RETURNED,
};
pub use handover::{
    read_handover_ledger, HandoverAdjustment, HandoverEntry, HandoverFallback, HandoverLedger,
    HandoverUnavailable, LedgerSource,
};
pub use inventory::{compute_delta, delta_for, total_would_go_negative, InventoryDelta};
pub use laundry::{
    batch_number, build_laundry_batch, LaundryBatchPlan, LaundryContext, LaundryItemPlan,
    BATCH_STATUS_PENDING, CONDITION_BEFORE_DIRTY, DEFAULT_BATCH_PREFIX,
};
pub use plan::{build_plan, PlanContext, ReturnLineRow, ReturnPlan};
pub use preview::{preview_lines, PreviewQuantities, ProductPreview, StockPools};
pub use store::{CommitError, CommitReceipt, ReturnStore};
pub use types::*;
pub use validate::{
    collect_violations, effective_to_laundry, validate_submission, ValidatedLine,
    ValidationReport, Violation,
};
