//! `rbo return preview|process` handlers.
//!
//! Both read a submission JSON file (the same body the daemon accepts) and
//! run the engine against Postgres. Output is `key=value` lines on stdout.

use anyhow::{bail, Result};
use chrono::Utc;
use rbo_db::PgReturnStore;
use rbo_returns::{preview_return, process_return, ProcessOutcome};

use super::{load_cli_config, parse_actor, parse_uuid, read_submission};

// ---------------------------------------------------------------------------
// return preview
// ---------------------------------------------------------------------------

pub async fn preview(
    id: &str,
    file: &str,
    actor: Option<&str>,
    role: &str,
    franchise: Option<&str>,
) -> Result<()> {
    let return_id = parse_uuid("id", id)?;
    let actor = parse_actor(actor, role, franchise)?;
    let submission = read_submission(file)?;

    let cfg = load_cli_config()?;
    let pool = rbo_db::connect_from_env_with(cfg.daemon_settings()?.db_max_connections).await?;
    let store = PgReturnStore::new(pool);

    let preview = preview_return(&store, &actor, return_id, &submission).await?;

    println!("return_id={}", preview.return_id);
    println!("return_number={}", preview.return_number);
    println!("status={}", preview.status.as_str());
    println!("handover_source={}", preview.handover_source.as_str());
    for p in &preview.preview {
        println!(
            "product={} available={}->{} in_laundry={}->{} damaged={}->{} booked={}->{} total={}->{}",
            p.product_id,
            p.current_stock.available,
            p.new_stock.available,
            p.current_stock.in_laundry,
            p.new_stock.in_laundry,
            p.current_stock.damaged,
            p.new_stock.damaged,
            p.current_stock.booked,
            p.new_stock.booked,
            p.current_stock.total,
            p.new_stock.total,
        );
        for w in &p.warnings {
            println!("  warning={}", w);
        }
    }
    println!("violations={}", preview.violations.len());
    for v in &preview.violations {
        println!("  violation={} {}", v.code(), v);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// return process
// ---------------------------------------------------------------------------

pub async fn process(
    id: &str,
    file: &str,
    actor: Option<&str>,
    role: &str,
    franchise: Option<&str>,
) -> Result<()> {
    let return_id = parse_uuid("id", id)?;
    let actor = parse_actor(actor, role, franchise)?;
    let submission = read_submission(file)?;

    let cfg = load_cli_config()?;
    let settings = cfg.engine_settings()?;
    let pool = rbo_db::connect_from_env_with(cfg.daemon_settings()?.db_max_connections).await?;
    let store = PgReturnStore::new(pool);

    let outcome = process_return(
        &store,
        &settings,
        &actor,
        return_id,
        &submission,
        Utc::now(),
    )
    .await?;

    match outcome {
        ProcessOutcome::Applied(s) => {
            println!("return_id={}", s.return_id);
            println!("outcome=applied");
            println!("items_processed={}", s.items_processed);
            println!("inventory_updated={}", s.inventory_updated);
            println!("items_archived={}", s.items_archived);
            match s.laundry_batch_id {
                Some(b) => println!("laundry_batch_id={}", b),
                None => println!("laundry_batch_id=none"),
            }
            println!("total_items={}", s.totals.total_items);
            println!("total_returned={}", s.totals.total_returned);
            println!("total_damaged={}", s.totals.total_damaged);
            println!("total_lost={}", s.totals.total_lost);
            println!("handover_source={}", s.handover_source.as_str());
            println!("booking_updated={}", s.booking_updated);
            Ok(())
        }
        ProcessOutcome::RolledBack {
            return_id,
            reason,
            correlation_id,
        } => {
            println!("return_id={}", return_id);
            println!("outcome=rolled_back");
            println!("correlation_id={}", correlation_id);
            bail!("return {} rolled back: {}", return_id, reason)
        }
    }
}
