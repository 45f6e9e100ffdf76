//! Transactional apply of a return plan.
//!
//! Order inside the transaction:
//!   1. lock the return row (`for update`), refuse unless `pending`
//!   2. insert line items
//!   3. per-field stock increments (never read-modify-write)
//!   4. archive rows
//!   5. laundry batch + items
//!   6. complete the return (guarded by `status = 'pending'`)
//!   7. booking status -> returned
//!
//! Any error drops the transaction, which rolls everything back.

use anyhow::{anyhow, Context};
use rbo_returns::{CommitError, CommitReceipt, ReturnPlan, ReturnStatus};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

pub(crate) async fn commit_return_plan(
    pool: &PgPool,
    plan: &ReturnPlan,
) -> Result<CommitReceipt, CommitError> {
    match apply_in_tx(pool, plan).await {
        Ok(receipt) => {
            info!(
                return_id = %plan.return_id,
                line_items = receipt.line_items_inserted,
                archived = receipt.items_archived,
                "return plan committed"
            );
            Ok(receipt)
        }
        Err(err) => {
            warn!(return_id = %plan.return_id, error = %err, "return plan rolled back");
            Err(err)
        }
    }
}

async fn apply_in_tx(pool: &PgPool, plan: &ReturnPlan) -> Result<CommitReceipt, CommitError> {
    let mut tx = pool.begin().await.context("commit_return_plan: begin failed")?;

    lock_pending_return(&mut tx, plan.return_id).await?;

    let line_items_inserted = insert_line_items(&mut tx, plan).await?;
    let inventory_updated = apply_inventory(&mut tx, plan).await?;
    let items_archived = insert_archives(&mut tx, plan).await?;
    let laundry_batch_id = insert_laundry_batch(&mut tx, plan).await?;
    complete_return(&mut tx, plan).await?;
    let booking_updated = update_booking(&mut tx, plan).await?;

    tx.commit()
        .await
        .context("commit_return_plan: commit failed")?;

    Ok(CommitReceipt {
        line_items_inserted,
        inventory_updated,
        items_archived,
        laundry_batch_id,
        booking_updated,
    })
}

async fn lock_pending_return(
    tx: &mut Transaction<'_, Postgres>,
    return_id: Uuid,
) -> Result<(), CommitError> {
    let row = sqlx::query("select status from returns where id = $1 for update")
        .bind(return_id)
        .fetch_optional(&mut **tx)
        .await
        .context("commit_return_plan: lock return failed")?;

    let Some(row) = row else {
        return Err(CommitError::Storage(anyhow!(
            "commit_return_plan: return {} not found",
            return_id
        )));
    };

    let status: String = row
        .try_get("status")
        .context("commit_return_plan: decode status failed")?;
    if ReturnStatus::parse(&status)?.is_terminal() {
        return Err(CommitError::AlreadyCompleted { return_id });
    }
    Ok(())
}

async fn insert_line_items(
    tx: &mut Transaction<'_, Postgres>,
    plan: &ReturnPlan,
) -> Result<usize, CommitError> {
    for l in &plan.lines {
        sqlx::query(
            r#"
            insert into return_items (
                return_id, product_id, product_name, product_code, product_category,
                qty_delivered, qty_returned, qty_to_laundry, qty_not_used, qty_damaged, qty_lost,
                damage_reason, damage_description, damage_severity,
                lost_reason, lost_description, notes, archived, sent_to_laundry
            ) values (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9, $10, $11,
                $12, $13, $14,
                $15, $16, $17, $18, $19
            )
            "#,
        )
        .bind(l.return_id)
        .bind(l.product_id)
        .bind(&l.product_name)
        .bind(&l.product_code)
        .bind(&l.product_category)
        .bind(l.qty_delivered)
        .bind(l.qty_returned)
        .bind(l.qty_to_laundry)
        .bind(l.qty_not_used)
        .bind(l.qty_damaged)
        .bind(l.qty_lost)
        .bind(&l.damage_reason)
        .bind(&l.damage_description)
        .bind(&l.damage_severity)
        .bind(&l.lost_reason)
        .bind(&l.lost_description)
        .bind(&l.notes)
        .bind(l.archived)
        .bind(l.sent_to_laundry)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("commit_return_plan: insert return item {} failed", l.product_id))?;
    }
    Ok(plan.lines.len())
}

async fn apply_inventory(
    tx: &mut Transaction<'_, Postgres>,
    plan: &ReturnPlan,
) -> Result<usize, CommitError> {
    for d in &plan.inventory {
        let res = sqlx::query(
            r#"
            update products
            set stock_available  = stock_available + $2,
                stock_damaged    = stock_damaged + $3,
                stock_total      = greatest(0, stock_total - $4),
                stock_in_laundry = stock_in_laundry + $5,
                stock_booked     = greatest(0, stock_booked - $6),
                updated_at       = now()
            where id = $1
            "#,
        )
        .bind(d.product_id)
        .bind(d.to_available)
        .bind(d.damaged)
        .bind(d.lost)
        .bind(d.to_laundry)
        .bind(d.booked_release)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("commit_return_plan: update product {} failed", d.product_id))?;

        if res.rows_affected() == 0 {
            return Err(CommitError::Storage(anyhow!(
                "commit_return_plan: product {} not found",
                d.product_id
            )));
        }
    }
    Ok(plan.inventory.len())
}

async fn insert_archives(
    tx: &mut Transaction<'_, Postgres>,
    plan: &ReturnPlan,
) -> Result<usize, CommitError> {
    for a in &plan.archives {
        sqlx::query(
            r#"
            insert into product_archive (
                product_id, product_name, product_code, barcode, category, image_url,
                reason, damage_reason, lost_reason, severity, notes, quantity,
                return_id, delivery_id, original_rental_price_micros, original_sale_price_micros,
                archived_by, franchise_id
            ) values (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16,
                $17, $18
            )
            "#,
        )
        .bind(a.product_id)
        .bind(&a.product_name)
        .bind(&a.product_code)
        .bind(&a.barcode)
        .bind(&a.category)
        .bind(&a.image_url)
        .bind(a.reason.as_str())
        .bind(&a.damage_reason)
        .bind(&a.lost_reason)
        .bind(&a.severity)
        .bind(&a.notes)
        .bind(a.quantity)
        .bind(a.return_id)
        .bind(a.delivery_id)
        .bind(a.original_rental_price_micros)
        .bind(a.original_sale_price_micros)
        .bind(a.archived_by)
        .bind(a.franchise_id)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("commit_return_plan: archive product {} failed", a.product_id))?;
    }
    Ok(plan.archives.len())
}

async fn insert_laundry_batch(
    tx: &mut Transaction<'_, Postgres>,
    plan: &ReturnPlan,
) -> Result<Option<Uuid>, CommitError> {
    let Some(batch) = &plan.laundry else {
        return Ok(None);
    };

    sqlx::query(
        r#"
        insert into laundry_batches (
            id, batch_number, return_id, franchise_id, created_by,
            auto_created, status, total_items, notes
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(batch.id)
    .bind(&batch.batch_number)
    .bind(batch.return_id)
    .bind(batch.franchise_id)
    .bind(batch.created_by)
    .bind(batch.auto_created)
    .bind(&batch.status)
    .bind(batch.total_items)
    .bind(&batch.notes)
    .execute(&mut **tx)
    .await
    .context("commit_return_plan: insert laundry batch failed")?;

    for item in &batch.items {
        sqlx::query(
            r#"
            insert into laundry_batch_items (
                batch_id, product_id, product_name, product_category, quantity, condition_before
            ) values ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(batch.id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(&item.product_category)
        .bind(item.quantity)
        .bind(&item.condition_before)
        .execute(&mut **tx)
        .await
        .with_context(|| {
            format!(
                "commit_return_plan: insert laundry item {} failed",
                item.product_id
            )
        })?;
    }

    Ok(Some(batch.id))
}

async fn complete_return(
    tx: &mut Transaction<'_, Postgres>,
    plan: &ReturnPlan,
) -> Result<(), CommitError> {
    let c = &plan.completion;
    let res = sqlx::query(
        r#"
        update returns
        set status                = $2,
            processed_by          = $3,
            processed_at          = $4,
            send_to_laundry       = $5,
            laundry_batch_id      = $6,
            laundry_batch_created = $7,
            notes                 = $8,
            processing_notes      = $9,
            total_items           = $10,
            total_returned        = $11,
            total_damaged         = $12,
            total_lost            = $13,
            updated_at            = now()
        where id = $1
          and status = 'pending'
        "#,
    )
    .bind(c.return_id)
    .bind(c.status.as_str())
    .bind(c.processed_by)
    .bind(c.processed_at)
    .bind(c.send_to_laundry)
    .bind(c.laundry_batch_id)
    .bind(c.laundry_batch_created)
    .bind(&c.notes)
    .bind(&c.processing_notes)
    .bind(c.totals.total_items)
    .bind(c.totals.total_returned)
    .bind(c.totals.total_damaged)
    .bind(c.totals.total_lost)
    .execute(&mut **tx)
    .await
    .context("commit_return_plan: complete return failed")?;

    if res.rows_affected() == 0 {
        return Err(CommitError::AlreadyCompleted {
            return_id: c.return_id,
        });
    }
    Ok(())
}

/// False when the booking row is gone; that does not abort the return.
async fn update_booking(
    tx: &mut Transaction<'_, Postgres>,
    plan: &ReturnPlan,
) -> Result<bool, CommitError> {
    let b = &plan.booking;
    let sql = format!(
        "update {} set status = $1, updated_at = now() where id = $2",
        b.source.table_name()
    );
    let res = sqlx::query(&sql)
        .bind(&b.status)
        .bind(b.booking_id)
        .execute(&mut **tx)
        .await
        .context("commit_return_plan: update booking failed")?;
    Ok(res.rows_affected() > 0)
}
