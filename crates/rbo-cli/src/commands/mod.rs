//! Command handler modules for rbo-cli.
//!
//! Shared utilities used by multiple command paths live here.

pub mod returns;

use anyhow::{Context, Result};
use rbo_config::{report_unused_keys, ConfigSurface, LoadedConfig, UnusedKeyPolicy};
use rbo_returns::{Actor, ActorRole, ReturnSubmission};
use std::fs;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub fn parse_uuid(flag: &str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).with_context(|| format!("invalid --{flag} '{raw}': expected a uuid"))
}

pub fn parse_actor(actor: Option<&str>, role: &str, franchise: Option<&str>) -> Result<Actor> {
    let user_id = match actor {
        Some(a) => parse_uuid("actor", a)?,
        None => Uuid::new_v4(),
    };
    let role = ActorRole::parse(role).with_context(|| format!("invalid --role '{role}'"))?;
    let franchise_id = franchise.map(|f| parse_uuid("franchise", f)).transpose()?;
    if franchise_id.is_none() && role != ActorRole::SuperAdmin {
        anyhow::bail!("--franchise is required for role {}", role.as_str());
    }
    Ok(Actor::new(user_id, role, franchise_id))
}

/// Reads a submission JSON file. A UTF-8 BOM is tolerated.
pub fn read_submission(path: &str) -> Result<ReturnSubmission> {
    let bytes = fs::read(path).with_context(|| format!("read submission failed: {}", path))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let sub: ReturnSubmission =
        serde_json::from_slice(bytes).context("submission file must contain valid JSON")?;
    Ok(sub)
}

/// `RBO_CONFIG` layers with unused keys reported on stderr.
pub fn load_cli_config() -> Result<LoadedConfig> {
    let loaded = rbo_config::load_from_env()?;
    let report = report_unused_keys(ConfigSurface::Cli, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        eprintln!(
            "WARN: CONFIG_UNUSED_KEYS surface={} unused_leaf_keys={}",
            report.surface,
            report.unused_leaf_pointers.len()
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            eprintln!("  unused={}", p);
        }
    }
    Ok(loaded)
}
