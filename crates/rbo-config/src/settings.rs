//! Typed views over the merged config document.
//!
//! ```yaml
//! returns:
//!   batch_number_prefix: "LB-RET-"
//!   handover_unavailable: proceed   # or: reject
//! database:
//!   max_connections: 5
//! daemon:
//!   bind_addr: "127.0.0.1:8790"
//! ```
//!
//! Absent keys take their defaults; present keys with the wrong type or an
//! unknown value fail the load with `CONFIG_INVALID`.

use anyhow::{anyhow, bail, Result};
use rbo_returns::{EngineSettings, HandoverFallback, DEFAULT_BATCH_PREFIX};
use serde_json::Value;

use crate::LoadedConfig;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8790";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonSettings {
    pub bind_addr: String,
    pub db_max_connections: u32,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl LoadedConfig {
    pub fn engine_settings(&self) -> Result<EngineSettings> {
        let v = &self.config_json;

        let batch_number_prefix = match opt_str(v, "/returns/batch_number_prefix")? {
            Some(p) if p.trim().is_empty() => {
                bail!("CONFIG_INVALID /returns/batch_number_prefix must not be blank")
            }
            Some(p) => p.to_string(),
            None => DEFAULT_BATCH_PREFIX.to_string(),
        };

        let handover_unavailable = match opt_str(v, "/returns/handover_unavailable")? {
            Some(s) => HandoverFallback::parse(s)
                .map_err(|e| anyhow!("CONFIG_INVALID /returns/handover_unavailable: {e}"))?,
            None => HandoverFallback::default(),
        };

        Ok(EngineSettings {
            batch_number_prefix,
            handover_unavailable,
        })
    }

    pub fn daemon_settings(&self) -> Result<DaemonSettings> {
        let v = &self.config_json;

        let bind_addr = opt_str(v, "/daemon/bind_addr")?
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let db_max_connections = match v.pointer("/database/max_connections") {
            None | Some(Value::Null) => DEFAULT_DB_MAX_CONNECTIONS,
            Some(n) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    anyhow!("CONFIG_INVALID /database/max_connections must be a positive integer")
                })?,
        };

        Ok(DaemonSettings {
            bind_addr,
            db_max_connections,
        })
    }
}

fn opt_str<'a>(v: &'a Value, ptr: &str) -> Result<Option<&'a str>> {
    match v.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => bail!("CONFIG_INVALID {} must be a string", ptr),
    }
}
