//! Storage seam.
//!
//! The engine reads through this trait and hands back a finished
//! [`ReturnPlan`]. Implementations must apply a plan all-or-nothing and must
//! refuse a plan for a return that is no longer `pending`.

use std::fmt;

use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

use crate::handover::HandoverEntry;
use crate::plan::ReturnPlan;
use crate::types::{ProductSnapshot, ReturnRecord};

#[derive(Debug)]
pub enum CommitError {
    /// Another caller completed the return first.
    AlreadyCompleted { return_id: Uuid },
    /// Anything else; the transaction was rolled back.
    Storage(anyhow::Error),
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitError::AlreadyCompleted { return_id } => {
                write!(f, "return {} already completed", return_id)
            }
            CommitError::Storage(e) => write!(f, "storage error: {:#}", e),
        }
    }
}

impl std::error::Error for CommitError {}

impl From<anyhow::Error> for CommitError {
    fn from(e: anyhow::Error) -> Self {
        CommitError::Storage(e)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub line_items_inserted: usize,
    pub inventory_updated: usize,
    pub items_archived: usize,
    pub laundry_batch_id: Option<Uuid>,
    /// False when the booking row no longer exists.
    pub booking_updated: bool,
}

#[async_trait::async_trait]
pub trait ReturnStore: Send + Sync {
    async fn fetch_return(&self, return_id: Uuid) -> Result<Option<ReturnRecord>>;

    /// Unknown ids are simply absent from the result.
    async fn fetch_products(&self, product_ids: &[Uuid]) -> Result<Vec<ProductSnapshot>>;

    async fn fetch_handover_entries(
        &self,
        delivery_id: Uuid,
    ) -> Result<Vec<HandoverEntry>>;

    async fn commit_return_plan(&self, plan: &ReturnPlan) -> Result<CommitReceipt, CommitError>;
}
