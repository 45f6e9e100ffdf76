use anyhow::Result;
use rbo_returns::{
    CommitError, CommitReceipt, HandoverEntry, ProductSnapshot, ReturnPlan, ReturnRecord,
    ReturnStore,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{commit, rows};

/// [`ReturnStore`] over a Postgres pool.
#[derive(Clone)]
pub struct PgReturnStore {
    pool: PgPool,
}

impl PgReturnStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl ReturnStore for PgReturnStore {
    async fn fetch_return(&self, return_id: Uuid) -> Result<Option<ReturnRecord>> {
        rows::fetch_return(&self.pool, return_id).await
    }

    async fn fetch_products(&self, product_ids: &[Uuid]) -> Result<Vec<ProductSnapshot>> {
        rows::fetch_products(&self.pool, product_ids).await
    }

    async fn fetch_handover_entries(&self, delivery_id: Uuid) -> Result<Vec<HandoverEntry>> {
        rows::fetch_handover_entries(&self.pool, delivery_id).await
    }

    async fn commit_return_plan(&self, plan: &ReturnPlan) -> Result<CommitReceipt, CommitError> {
        commit::commit_return_plan(&self.pool, plan).await
    }
}
