//! rbo-db
//!
//! Postgres persistence for return reconciliation: connection, embedded
//! migrations, row loaders and [`PgReturnStore`], which applies a whole
//! [`rbo_returns::ReturnPlan`] inside one transaction.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

mod commit;
mod rows;
mod store;

pub use rows::{
    fetch_booking_status, fetch_handover_entries, fetch_product, fetch_products, fetch_return,
    fetch_return_state, insert_booking, insert_handover_item, insert_product, insert_return,
    list_archives_for_return, list_laundry_batch_items, list_return_items, ArchiveRow,
    LaundryBatchItemRow, ReturnItemRow, ReturnStateRow,
};
pub use store::PgReturnStore;

pub const ENV_DB_URL: &str = "RBO_DATABASE_URL";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Connect to Postgres using RBO_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    connect_from_env_with(DEFAULT_MAX_CONNECTIONS).await
}

pub async fn connect_from_env_with(max_connections: u32) -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_returns_table: bool,
}

/// Connectivity + schema presence.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='returns'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_returns_table: exists,
    })
}
