//! Deterministic in-memory store.
//!
//! Commit works on a clone of the whole state and swaps it in only when every
//! step succeeded, so an injected failure leaves the previous state intact.
//! Pool floors and the one-batch-per-return rule mirror the Postgres schema.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, bail, Result};
use rbo_returns::{
    ArchiveDraft, BookingSource, CommitError, CommitReceipt, HandoverEntry, LaundryBatchPlan,
    ProductSnapshot, ReturnCompletion, ReturnLineRow, ReturnPlan, ReturnRecord, ReturnStatus,
    ReturnStore,
};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct MemoryState {
    pub returns: BTreeMap<Uuid, ReturnRecord>,
    pub completions: BTreeMap<Uuid, ReturnCompletion>,
    pub products: BTreeMap<Uuid, ProductSnapshot>,
    pub bookings: BTreeMap<(BookingSource, Uuid), String>,
    pub handover: Vec<HandoverEntry>,
    pub line_items: Vec<ReturnLineRow>,
    pub archives: Vec<ArchiveDraft>,
    pub laundry_batches: Vec<LaundryBatchPlan>,
}

/// Failures to inject on the next calls.
#[derive(Clone, Debug, Default)]
pub struct Faults {
    pub fail_return_reads: bool,
    pub fail_handover_reads: bool,
    /// Commit fails while applying inventory for this product.
    pub fail_commit_at_product: Option<Uuid>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    faults: Mutex<Faults>,
    product_reads: AtomicUsize,
    commits: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_product(&self, p: ProductSnapshot) {
        self.state.lock().await.products.insert(p.id, p);
    }

    pub async fn insert_return(&self, r: ReturnRecord) {
        self.state.lock().await.returns.insert(r.id, r);
    }

    pub async fn insert_booking(&self, source: BookingSource, booking_id: Uuid, status: &str) {
        self.state
            .lock()
            .await
            .bookings
            .insert((source, booking_id), status.to_string());
    }

    pub async fn remove_booking(&self, source: BookingSource, booking_id: Uuid) {
        self.state.lock().await.bookings.remove(&(source, booking_id));
    }

    pub async fn insert_handover(&self, e: HandoverEntry) {
        self.state.lock().await.handover.push(e);
    }

    pub async fn set_faults(&self, faults: Faults) {
        *self.faults.lock().await = faults;
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub async fn product(&self, product_id: Uuid) -> Option<ProductSnapshot> {
        self.state.lock().await.products.get(&product_id).cloned()
    }

    pub async fn return_record(&self, return_id: Uuid) -> Option<ReturnRecord> {
        self.state.lock().await.returns.get(&return_id).cloned()
    }

    pub async fn booking_status(&self, source: BookingSource, booking_id: Uuid) -> Option<String> {
        self.state
            .lock()
            .await
            .bookings
            .get(&(source, booking_id))
            .cloned()
    }

    /// Number of `fetch_products` calls so far.
    pub fn product_reads(&self) -> usize {
        self.product_reads.load(Ordering::SeqCst)
    }

    /// Number of `commit_return_plan` calls so far, successful or not.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReturnStore for MemoryStore {
    async fn fetch_return(&self, return_id: Uuid) -> Result<Option<ReturnRecord>> {
        if self.faults.lock().await.fail_return_reads {
            bail!("injected: return read failed");
        }
        Ok(self.state.lock().await.returns.get(&return_id).cloned())
    }

    async fn fetch_products(&self, product_ids: &[Uuid]) -> Result<Vec<ProductSnapshot>> {
        self.product_reads.fetch_add(1, Ordering::SeqCst);
        let st = self.state.lock().await;
        Ok(product_ids
            .iter()
            .filter_map(|id| st.products.get(id).cloned())
            .collect())
    }

    async fn fetch_handover_entries(&self, delivery_id: Uuid) -> Result<Vec<HandoverEntry>> {
        if self.faults.lock().await.fail_handover_reads {
            bail!("injected: handover read failed for delivery {}", delivery_id);
        }
        Ok(self
            .state
            .lock()
            .await
            .handover
            .iter()
            .filter(|e| e.delivery_id == delivery_id)
            .cloned()
            .collect())
    }

    async fn commit_return_plan(&self, plan: &ReturnPlan) -> Result<CommitReceipt, CommitError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        let fail_at = self.faults.lock().await.fail_commit_at_product;

        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        let receipt = apply_plan(&mut next, plan, fail_at)?;
        *guard = next;
        Ok(receipt)
    }
}

fn apply_plan(
    st: &mut MemoryState,
    plan: &ReturnPlan,
    fail_at: Option<Uuid>,
) -> Result<CommitReceipt, CommitError> {
    let status = st
        .returns
        .get(&plan.return_id)
        .map(|r| r.status)
        .ok_or_else(|| anyhow!("return {} not found", plan.return_id))?;
    if status.is_terminal() {
        return Err(CommitError::AlreadyCompleted {
            return_id: plan.return_id,
        });
    }

    st.line_items.extend(plan.lines.iter().cloned());

    for d in &plan.inventory {
        if fail_at == Some(d.product_id) {
            return Err(anyhow!("injected: inventory update failed for {}", d.product_id).into());
        }
        let p = st
            .products
            .get_mut(&d.product_id)
            .ok_or_else(|| anyhow!("product {} not found", d.product_id))?;
        let next = p.inventory.apply(d);
        if next.has_negative_pool() {
            return Err(anyhow!("stock pool check violated for product {}", d.product_id).into());
        }
        p.inventory = next;
    }

    st.archives.extend(plan.archives.iter().cloned());

    if let Some(batch) = &plan.laundry {
        if st
            .laundry_batches
            .iter()
            .any(|b| b.return_id == batch.return_id)
        {
            return Err(anyhow!("laundry batch already exists for return {}", batch.return_id).into());
        }
        st.laundry_batches.push(batch.clone());
    }

    if let Some(r) = st.returns.get_mut(&plan.return_id) {
        r.status = ReturnStatus::Completed;
        r.notes = plan.completion.notes.clone();
    }
    st.completions
        .insert(plan.return_id, plan.completion.clone());

    let booking_updated = match st
        .bookings
        .get_mut(&(plan.booking.source, plan.booking.booking_id))
    {
        Some(status) => {
            *status = plan.booking.status.clone();
            true
        }
        None => false,
    };

    Ok(CommitReceipt {
        line_items_inserted: plan.lines.len(),
        inventory_updated: plan.inventory.len(),
        items_archived: plan.archives.len(),
        laundry_batch_id: plan.laundry_batch_id(),
        booking_updated,
    })
}
