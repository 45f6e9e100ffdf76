//! Return processing orchestrator.
//!
//! load → authorize → pending check → products → validate → handover ledger
//! → plan → commit. Nothing is written before commit, and commit is a single
//! all-or-nothing store call.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::finalize::{ensure_pending, AlreadyProcessed, ReturnTotals};
use crate::handover::{read_handover_ledger, HandoverFallback, HandoverUnavailable, LedgerSource};
use crate::laundry::DEFAULT_BATCH_PREFIX;
use crate::plan::{build_plan, PlanContext};
use crate::preview::{preview_lines, ProductPreview};
use crate::store::{CommitError, ReturnStore};
use crate::types::{
    Actor, ProductSnapshot, ReturnLineInput, ReturnRecord, ReturnStatus, ReturnSubmission,
};
use crate::validate::{collect_violations, validate_submission, ValidationReport, Violation};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    pub batch_number_prefix: String,
    pub handover_unavailable: HandoverFallback,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            batch_number_prefix: DEFAULT_BATCH_PREFIX.to_string(),
            handover_unavailable: HandoverFallback::Proceed,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors / outcomes
// ---------------------------------------------------------------------------

/// Refusals raised before anything is written.
#[derive(Debug)]
pub enum ProcessError {
    NotFound { return_id: Uuid },
    Forbidden { return_id: Uuid },
    AlreadyProcessed(AlreadyProcessed),
    Invalid(ValidationReport),
    HandoverUnavailable(HandoverUnavailable),
    /// A read failed; nothing was attempted.
    Storage {
        correlation_id: Uuid,
        source: anyhow::Error,
    },
}

impl ProcessError {
    pub fn code(&self) -> &'static str {
        match self {
            ProcessError::NotFound { .. } => "RETURN_NOT_FOUND",
            ProcessError::Forbidden { .. } => "FORBIDDEN",
            ProcessError::AlreadyProcessed(_) => "ALREADY_PROCESSED",
            ProcessError::Invalid(_) => "INVALID_SUBMISSION",
            ProcessError::HandoverUnavailable(_) => "HANDOVER_UNAVAILABLE",
            ProcessError::Storage { .. } => "STORAGE_ERROR",
        }
    }

    fn storage(context: &str, source: anyhow::Error) -> Self {
        let correlation_id = Uuid::new_v4();
        error!(
            correlation_id = %correlation_id,
            error = %format!("{source:#}"),
            "{}",
            context
        );
        ProcessError::Storage {
            correlation_id,
            source,
        }
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::NotFound { .. } => write!(f, "Return not found"),
            ProcessError::Forbidden { .. } => write!(f, "Forbidden"),
            ProcessError::AlreadyProcessed(e) => write!(f, "{}", e),
            ProcessError::Invalid(report) => write!(f, "{}", report),
            ProcessError::HandoverUnavailable(e) => write!(f, "{}", e),
            ProcessError::Storage { correlation_id, .. } => {
                write!(f, "storage error (correlation_id={})", correlation_id)
            }
        }
    }
}

impl std::error::Error for ProcessError {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub return_id: Uuid,
    pub items_processed: usize,
    pub inventory_updated: usize,
    pub items_archived: usize,
    pub laundry_batch_id: Option<Uuid>,
    #[serde(flatten)]
    pub totals: ReturnTotals,
    pub handover_source: LedgerSource,
    pub booking_updated: bool,
}

#[derive(Debug)]
pub enum ProcessOutcome {
    Applied(ProcessSummary),
    /// Commit failed and was rolled back; the return is still `pending`.
    RolledBack {
        return_id: Uuid,
        reason: String,
        correlation_id: Uuid,
    },
}

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

pub async fn process_return(
    store: &dyn ReturnStore,
    settings: &EngineSettings,
    actor: &Actor,
    return_id: Uuid,
    submission: &ReturnSubmission,
    now: DateTime<Utc>,
) -> Result<ProcessOutcome, ProcessError> {
    let record = load_authorized(store, actor, return_id).await?;
    if !actor.can_process_returns() {
        return Err(ProcessError::Forbidden { return_id });
    }
    ensure_pending(&record).map_err(ProcessError::AlreadyProcessed)?;

    let products = load_products(store, &submission.items).await?;
    let known: BTreeSet<Uuid> = products.keys().copied().collect();
    let lines = validate_submission(&submission.items, submission.send_to_laundry, &known)
        .map_err(ProcessError::Invalid)?;

    let ledger = read_handover_ledger(store, record.delivery_id, settings.handover_unavailable)
        .await
        .map_err(ProcessError::HandoverUnavailable)?;

    let plan = build_plan(
        &PlanContext {
            record: &record,
            actor,
            now,
            batch_prefix: &settings.batch_number_prefix,
            send_to_laundry: submission.send_to_laundry,
            notes: submission.notes.as_deref(),
            processing_notes: submission.processing_notes.as_deref(),
        },
        &lines,
        &products,
        &ledger,
    )
    .map_err(ProcessError::Invalid)?;

    match store.commit_return_plan(&plan).await {
        Ok(receipt) => {
            let summary = ProcessSummary {
                return_id,
                items_processed: receipt.line_items_inserted,
                inventory_updated: receipt.inventory_updated,
                items_archived: receipt.items_archived,
                laundry_batch_id: receipt.laundry_batch_id,
                totals: plan.totals(),
                handover_source: plan.handover_source,
                booking_updated: receipt.booking_updated,
            };
            if !receipt.booking_updated {
                warn!(
                    return_id = %return_id,
                    booking_id = %plan.booking.booking_id,
                    source = plan.booking.source.as_str(),
                    "booking row missing; return completed without booking status update"
                );
            }
            info!(
                return_id = %return_id,
                actor = %actor.user_id,
                items = summary.items_processed,
                archived = summary.items_archived,
                laundry_batch_id = ?summary.laundry_batch_id,
                handover_source = summary.handover_source.as_str(),
                "return processed"
            );
            Ok(ProcessOutcome::Applied(summary))
        }
        Err(CommitError::AlreadyCompleted { return_id }) => {
            Err(ProcessError::AlreadyProcessed(AlreadyProcessed { return_id }))
        }
        Err(CommitError::Storage(e)) => {
            let correlation_id = Uuid::new_v4();
            let reason = format!("{e:#}");
            error!(
                return_id = %return_id,
                correlation_id = %correlation_id,
                error = %reason,
                "return commit rolled back"
            );
            Ok(ProcessOutcome::RolledBack {
                return_id,
                reason,
                correlation_id,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReturnPreview {
    pub return_id: Uuid,
    pub return_number: String,
    pub status: ReturnStatus,
    pub handover_source: LedgerSource,
    pub preview: Vec<ProductPreview>,
    pub violations: Vec<Violation>,
}

/// Read-only projection of a submission. Not gated on status and never
/// refuses on validation; violations are reported alongside the preview.
pub async fn preview_return(
    store: &dyn ReturnStore,
    actor: &Actor,
    return_id: Uuid,
    submission: &ReturnSubmission,
) -> Result<ReturnPreview, ProcessError> {
    let record = load_authorized(store, actor, return_id).await?;

    let products = load_products(store, &submission.items).await?;
    let known: BTreeSet<Uuid> = products.keys().copied().collect();
    let violations = collect_violations(&submission.items, submission.send_to_laundry, &known);

    let ledger = read_handover_ledger(store, record.delivery_id, HandoverFallback::Proceed)
        .await
        .map_err(ProcessError::HandoverUnavailable)?;

    Ok(ReturnPreview {
        return_id,
        return_number: record.return_number,
        status: record.status,
        handover_source: ledger.source(),
        preview: preview_lines(
            &submission.items,
            submission.send_to_laundry,
            &products,
            &ledger,
        ),
        violations,
    })
}

// ---------------------------------------------------------------------------
// Shared reads
// ---------------------------------------------------------------------------

async fn load_authorized(
    store: &dyn ReturnStore,
    actor: &Actor,
    return_id: Uuid,
) -> Result<ReturnRecord, ProcessError> {
    let record = store
        .fetch_return(return_id)
        .await
        .map_err(|e| ProcessError::storage("fetch_return failed", e))?
        .ok_or(ProcessError::NotFound { return_id })?;

    if !actor.can_access_franchise(record.franchise_id) {
        warn!(
            return_id = %return_id,
            actor = %actor.user_id,
            role = actor.role.as_str(),
            "franchise access denied"
        );
        return Err(ProcessError::Forbidden { return_id });
    }
    Ok(record)
}

async fn load_products(
    store: &dyn ReturnStore,
    items: &[ReturnLineInput],
) -> Result<BTreeMap<Uuid, ProductSnapshot>, ProcessError> {
    let ids: Vec<Uuid> = items
        .iter()
        .map(|i| i.product_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let products = store
        .fetch_products(&ids)
        .await
        .map_err(|e| ProcessError::storage("fetch_products failed", e))?;
    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}
