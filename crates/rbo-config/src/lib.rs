//! rbo-config
//!
//! Layered YAML configuration for the back-office binaries.
//!
//! - later files override earlier ones (deep merge of mappings)
//! - secret-looking literals abort the load with `CONFIG_SECRET_DETECTED`;
//!   credentials come from the environment, never from YAML
//! - the merged document is canonicalised and hashed (SHA-256) so every
//!   process can log exactly which configuration it ran with
//! - each binary declares the JSON pointers it reads; anything else shows up
//!   in an unused-key report (warn or fail)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

mod settings;

pub use settings::{DaemonSettings, DEFAULT_BIND_ADDR, DEFAULT_DB_MAX_CONNECTIONS};

/// Comma separated YAML paths, base first.
pub const ENV_CONFIG_PATHS: &str = "RBO_CONFIG";

/// Leaf strings starting with any of these are treated as leaked credentials.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",
    "sk_live",
    "sk_test",
    "AKIA",
    "-----BEGIN",
    "ghp_",
    "gho_",
    "glpat-",
    "xoxb-",
    "xoxp-",
    "postgres://",
    "postgresql://",
];

// ---------------------------------------------------------------------------
// Consumption registry
// ---------------------------------------------------------------------------

/// Which binary is reading the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSurface {
    Daemon,
    Cli,
}

impl ConfigSurface {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSurface::Daemon => "DAEMON",
            ConfigSurface::Cli => "CLI",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub surface: String,
    /// Sorted, unique.
    pub consumed_prefixes: Vec<String>,
    /// Sorted.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// JSON-pointer prefixes each surface actually reads. Keep in sync with
/// `settings.rs`.
pub fn consumed_pointers_for_surface(surface: ConfigSurface) -> &'static [&'static str] {
    match surface {
        ConfigSurface::Daemon => &[
            "/returns/batch_number_prefix",
            "/returns/handover_unavailable",
            "/database/max_connections",
            "/daemon/bind_addr",
        ],
        ConfigSurface::Cli => &[
            "/returns/batch_number_prefix",
            "/returns/handover_unavailable",
            "/database/max_connections",
        ],
    }
}

/// With `Fail`, unused keys are an error; with `Warn` the report is always
/// returned.
pub fn report_unused_keys(
    surface: ConfigSurface,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = consumed_pointers_for_surface(surface)
        .iter()
        .map(|p| normalize_pointer(p))
        .collect();
    let consumed_prefixes: Vec<String> = consumed.into_iter().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !consumed_prefixes.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        surface: surface.as_str().to_string(),
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS (surface={}): {} unused config leaf key(s) detected. \
            Remove them or update the consumed registry. First few: {}",
            report.surface,
            report.unused_leaf_pointers.len(),
            preview_list(&report.unused_leaf_pointers, 12)
        );
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// JSON pointer helpers
// ---------------------------------------------------------------------------

fn normalize_pointer(p: &str) -> String {
    let mut s = p.trim().to_string();
    if s.is_empty() {
        return "/".to_string();
    }
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    while s.ends_with('/') && s.len() > 1 {
        s.pop();
    }
    s
}

/// "/a/b" covers "/a/b" and "/a/b/c" but not "/a/bc". "/" covers everything.
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    let take = items.iter().take(n).cloned().collect::<Vec<_>>();
    format!("{:?}", take)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Empty document: every setting takes its default.
    pub fn defaults() -> Result<Self> {
        load_layered_yaml_from_strings(&["{}"])
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        // An empty YAML document parses to null; treat it as an empty layer.
        if v_json.is_null() {
            continue;
        }
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Paths from `RBO_CONFIG` (comma separated). Unset or blank => defaults.
pub fn load_from_env() -> Result<LoadedConfig> {
    match std::env::var(ENV_CONFIG_PATHS) {
        Ok(raw) if !raw.trim().is_empty() => {
            let paths = split_paths(&raw);
            let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            load_layered_yaml(&refs)
        }
        _ => LoadedConfig::defaults(),
    }
}

fn split_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        let Some(s) = v.pointer(&ptr).and_then(Value::as_str) else {
            continue;
        };
        if looks_like_secret(s) {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
