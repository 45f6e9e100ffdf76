//! Row loaders and seed inserts.
//!
//! Returns, products, bookings and handover rows are created by other parts
//! of the back office; the inserts here exist for operator tooling and
//! DB-backed tests.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rbo_returns::{
    ArchiveReason, BookingSource, HandoverEntry, ProductInventory, ProductSnapshot, ReturnRecord,
    ReturnStatus, ReturnTotals,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

pub async fn fetch_return(pool: &PgPool, return_id: Uuid) -> Result<Option<ReturnRecord>> {
    let row = sqlx::query(
        r#"
        select id, return_number, booking_id, booking_source, delivery_id,
               franchise_id, status, notes
        from returns
        where id = $1
        "#,
    )
    .bind(return_id)
    .fetch_optional(pool)
    .await
    .context("fetch_return failed")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let booking_source: String = row.try_get("booking_source")?;
    let status: String = row.try_get("status")?;

    Ok(Some(ReturnRecord {
        id: row.try_get("id")?,
        return_number: row.try_get("return_number")?,
        booking_id: row.try_get("booking_id")?,
        booking_source: BookingSource::parse(&booking_source)?,
        delivery_id: row.try_get("delivery_id")?,
        franchise_id: row.try_get("franchise_id")?,
        status: ReturnStatus::parse(&status)?,
        notes: row.try_get("notes")?,
    }))
}

/// Post-processing view of a return header.
#[derive(Debug, Clone)]
pub struct ReturnStateRow {
    pub status: ReturnStatus,
    pub totals: ReturnTotals,
    pub send_to_laundry: bool,
    pub laundry_batch_created: bool,
    pub laundry_batch_id: Option<Uuid>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub processing_notes: Option<String>,
}

pub async fn fetch_return_state(pool: &PgPool, return_id: Uuid) -> Result<ReturnStateRow> {
    let row = sqlx::query(
        r#"
        select status, total_items, total_returned, total_damaged, total_lost,
               send_to_laundry, laundry_batch_created, laundry_batch_id,
               processed_by, processed_at, notes, processing_notes
        from returns
        where id = $1
        "#,
    )
    .bind(return_id)
    .fetch_one(pool)
    .await
    .context("fetch_return_state failed")?;

    let status: String = row.try_get("status")?;
    Ok(ReturnStateRow {
        status: ReturnStatus::parse(&status)?,
        totals: ReturnTotals {
            total_items: row.try_get("total_items")?,
            total_returned: row.try_get("total_returned")?,
            total_damaged: row.try_get("total_damaged")?,
            total_lost: row.try_get("total_lost")?,
        },
        send_to_laundry: row.try_get("send_to_laundry")?,
        laundry_batch_created: row.try_get("laundry_batch_created")?,
        laundry_batch_id: row.try_get("laundry_batch_id")?,
        processed_by: row.try_get("processed_by")?,
        processed_at: row.try_get("processed_at")?,
        notes: row.try_get("notes")?,
        processing_notes: row.try_get("processing_notes")?,
    })
}

pub async fn insert_return(pool: &PgPool, r: &ReturnRecord) -> Result<()> {
    sqlx::query(
        r#"
        insert into returns (
            id, return_number, booking_id, booking_source, delivery_id,
            franchise_id, status, notes
        ) values ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(r.id)
    .bind(&r.return_number)
    .bind(r.booking_id)
    .bind(r.booking_source.as_str())
    .bind(r.delivery_id)
    .bind(r.franchise_id)
    .bind(r.status.as_str())
    .bind(&r.notes)
    .execute(pool)
    .await
    .context("insert_return failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ReturnItemRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub qty_delivered: i64,
    pub qty_returned: i64,
    pub qty_to_laundry: i64,
    pub qty_not_used: i64,
    pub qty_damaged: i64,
    pub qty_lost: i64,
    pub archived: bool,
    pub sent_to_laundry: bool,
}

pub async fn list_return_items(pool: &PgPool, return_id: Uuid) -> Result<Vec<ReturnItemRow>> {
    let rows = sqlx::query(
        r#"
        select product_id, product_name, qty_delivered, qty_returned, qty_to_laundry,
               qty_not_used, qty_damaged, qty_lost, archived, sent_to_laundry
        from return_items
        where return_id = $1
        order by product_name, product_id
        "#,
    )
    .bind(return_id)
    .fetch_all(pool)
    .await
    .context("list_return_items failed")?;

    rows.iter()
        .map(|row| -> Result<ReturnItemRow> {
            Ok(ReturnItemRow {
                product_id: row.try_get("product_id")?,
                product_name: row.try_get("product_name")?,
                qty_delivered: row.try_get("qty_delivered")?,
                qty_returned: row.try_get("qty_returned")?,
                qty_to_laundry: row.try_get("qty_to_laundry")?,
                qty_not_used: row.try_get("qty_not_used")?,
                qty_damaged: row.try_get("qty_damaged")?,
                qty_lost: row.try_get("qty_lost")?,
                archived: row.try_get("archived")?,
                sent_to_laundry: row.try_get("sent_to_laundry")?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

const PRODUCT_COLUMNS: &str = "id, name, product_code, barcode, category, image_url, \
     rental_price_micros, sale_price_micros, price_micros, \
     stock_total, stock_available, stock_booked, stock_damaged, stock_in_laundry";

fn product_from_row(row: &PgRow) -> Result<ProductSnapshot> {
    Ok(ProductSnapshot {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        product_code: row.try_get("product_code")?,
        barcode: row.try_get("barcode")?,
        category: row.try_get("category")?,
        image_url: row.try_get("image_url")?,
        rental_price_micros: row.try_get("rental_price_micros")?,
        sale_price_micros: row.try_get("sale_price_micros")?,
        price_micros: row.try_get("price_micros")?,
        inventory: ProductInventory {
            stock_total: row.try_get("stock_total")?,
            stock_available: row.try_get("stock_available")?,
            stock_booked: row.try_get("stock_booked")?,
            stock_damaged: row.try_get("stock_damaged")?,
            stock_in_laundry: row.try_get("stock_in_laundry")?,
        },
    })
}

/// Unknown ids are absent from the result.
pub async fn fetch_products(pool: &PgPool, product_ids: &[Uuid]) -> Result<Vec<ProductSnapshot>> {
    let sql = format!("select {PRODUCT_COLUMNS} from products where id = any($1)");
    let rows = sqlx::query(&sql)
        .bind(product_ids)
        .fetch_all(pool)
        .await
        .context("fetch_products failed")?;

    rows.iter().map(product_from_row).collect()
}

pub async fn fetch_product(pool: &PgPool, product_id: Uuid) -> Result<Option<ProductSnapshot>> {
    let sql = format!("select {PRODUCT_COLUMNS} from products where id = $1");
    let row = sqlx::query(&sql)
        .bind(product_id)
        .fetch_optional(pool)
        .await
        .context("fetch_product failed")?;

    row.as_ref().map(product_from_row).transpose()
}

pub async fn insert_product(pool: &PgPool, p: &ProductSnapshot) -> Result<()> {
    sqlx::query(
        r#"
        insert into products (
            id, name, product_code, barcode, category, image_url,
            rental_price_micros, sale_price_micros, price_micros,
            stock_total, stock_available, stock_booked, stock_damaged, stock_in_laundry
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(p.id)
    .bind(&p.name)
    .bind(&p.product_code)
    .bind(&p.barcode)
    .bind(&p.category)
    .bind(&p.image_url)
    .bind(p.rental_price_micros)
    .bind(p.sale_price_micros)
    .bind(p.price_micros)
    .bind(p.inventory.stock_total)
    .bind(p.inventory.stock_available)
    .bind(p.inventory.stock_booked)
    .bind(p.inventory.stock_damaged)
    .bind(p.inventory.stock_in_laundry)
    .execute(pool)
    .await
    .context("insert_product failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Handover ledger
// ---------------------------------------------------------------------------

pub async fn fetch_handover_entries(pool: &PgPool, delivery_id: Uuid) -> Result<Vec<HandoverEntry>> {
    let rows = sqlx::query(
        r#"
        select delivery_id, product_id, restocked_qty, returned_laundry_qty
        from delivery_handover_items
        where delivery_id = $1
        "#,
    )
    .bind(delivery_id)
    .fetch_all(pool)
    .await
    .context("fetch_handover_entries failed")?;

    rows.iter()
        .map(|row| -> Result<HandoverEntry> {
            Ok(HandoverEntry {
                delivery_id: row.try_get("delivery_id")?,
                product_id: row.try_get("product_id")?,
                restocked_qty: row.try_get("restocked_qty")?,
                returned_laundry_qty: row.try_get("returned_laundry_qty")?,
            })
        })
        .collect()
}

pub async fn insert_handover_item(pool: &PgPool, e: &HandoverEntry) -> Result<()> {
    sqlx::query(
        r#"
        insert into delivery_handover_items (delivery_id, product_id, restocked_qty, returned_laundry_qty)
        values ($1, $2, $3, $4)
        "#,
    )
    .bind(e.delivery_id)
    .bind(e.product_id)
    .bind(e.restocked_qty)
    .bind(e.returned_laundry_qty)
    .execute(pool)
    .await
    .context("insert_handover_item failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

pub async fn insert_booking(
    pool: &PgPool,
    source: BookingSource,
    booking_id: Uuid,
    franchise_id: Uuid,
    status: &str,
) -> Result<()> {
    let sql = format!(
        "insert into {} (id, franchise_id, status) values ($1, $2, $3)",
        source.table_name()
    );
    sqlx::query(&sql)
        .bind(booking_id)
        .bind(franchise_id)
        .bind(status)
        .execute(pool)
        .await
        .context("insert_booking failed")?;
    Ok(())
}

pub async fn fetch_booking_status(
    pool: &PgPool,
    source: BookingSource,
    booking_id: Uuid,
) -> Result<Option<String>> {
    let sql = format!("select status from {} where id = $1", source.table_name());
    let row = sqlx::query(&sql)
        .bind(booking_id)
        .fetch_optional(pool)
        .await
        .context("fetch_booking_status failed")?;

    row.map(|r| r.try_get::<String, _>("status"))
        .transpose()
        .context("fetch_booking_status decode failed")
}

// ---------------------------------------------------------------------------
// Archive / laundry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ArchiveRow {
    pub product_id: Uuid,
    pub reason: ArchiveReason,
    pub quantity: i64,
    pub notes: String,
    pub archived_by: Uuid,
    pub original_sale_price_micros: Option<i64>,
}

pub async fn list_archives_for_return(pool: &PgPool, return_id: Uuid) -> Result<Vec<ArchiveRow>> {
    let rows = sqlx::query(
        r#"
        select product_id, reason, quantity, notes, archived_by, original_sale_price_micros
        from product_archive
        where return_id = $1
        order by archived_at, reason
        "#,
    )
    .bind(return_id)
    .fetch_all(pool)
    .await
    .context("list_archives_for_return failed")?;

    rows.iter()
        .map(|row| -> Result<ArchiveRow> {
            let reason: String = row.try_get("reason")?;
            let reason = match reason.as_str() {
                "damaged" => ArchiveReason::Damaged,
                "lost" => ArchiveReason::Lost,
                "stolen" => ArchiveReason::Stolen,
                other => anyhow::bail!("invalid archive reason in db: {}", other),
            };
            Ok(ArchiveRow {
                product_id: row.try_get("product_id")?,
                reason,
                quantity: row.try_get("quantity")?,
                notes: row.try_get("notes")?,
                archived_by: row.try_get("archived_by")?,
                original_sale_price_micros: row.try_get("original_sale_price_micros")?,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct LaundryBatchItemRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub condition_before: String,
}

pub async fn list_laundry_batch_items(
    pool: &PgPool,
    batch_id: Uuid,
) -> Result<Vec<LaundryBatchItemRow>> {
    let rows = sqlx::query(
        r#"
        select product_id, product_name, quantity, condition_before
        from laundry_batch_items
        where batch_id = $1
        order by product_name
        "#,
    )
    .bind(batch_id)
    .fetch_all(pool)
    .await
    .context("list_laundry_batch_items failed")?;

    rows.iter()
        .map(|row| -> Result<LaundryBatchItemRow> {
            Ok(LaundryBatchItemRow {
                product_id: row.try_get("product_id")?,
                product_name: row.try_get("product_name")?,
                quantity: row.try_get("quantity")?,
                condition_before: row.try_get("condition_before")?,
            })
        })
        .collect()
}
