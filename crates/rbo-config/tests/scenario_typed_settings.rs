//! Typed settings: defaults, overrides and rejection of bad values.

use std::io::Write;

use rbo_config::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig};
use rbo_returns::{HandoverFallback, DEFAULT_BATCH_PREFIX};

#[test]
fn empty_config_yields_defaults() {
    let loaded = LoadedConfig::defaults().unwrap();

    let engine = loaded.engine_settings().unwrap();
    assert_eq!(engine.batch_number_prefix, DEFAULT_BATCH_PREFIX);
    assert_eq!(engine.handover_unavailable, HandoverFallback::Proceed);

    let daemon = loaded.daemon_settings().unwrap();
    assert_eq!(daemon.bind_addr, rbo_config::DEFAULT_BIND_ADDR);
    assert_eq!(daemon.db_max_connections, rbo_config::DEFAULT_DB_MAX_CONNECTIONS);
}

#[test]
fn overrides_are_read() {
    let yaml = r#"
returns:
  batch_number_prefix: "LB-NYC-"
  handover_unavailable: reject
database:
  max_connections: 12
daemon:
  bind_addr: "0.0.0.0:9000"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();

    let engine = loaded.engine_settings().unwrap();
    assert_eq!(engine.batch_number_prefix, "LB-NYC-");
    assert_eq!(engine.handover_unavailable, HandoverFallback::Reject);

    let daemon = loaded.daemon_settings().unwrap();
    assert_eq!(daemon.bind_addr, "0.0.0.0:9000");
    assert_eq!(daemon.db_max_connections, 12);
}

#[test]
fn unknown_fallback_policy_is_invalid() {
    let loaded =
        load_layered_yaml_from_strings(&["returns:\n  handover_unavailable: retry\n"]).unwrap();
    let err = loaded.engine_settings().unwrap_err();
    assert!(format!("{err}").contains("CONFIG_INVALID"));
}

#[test]
fn blank_prefix_is_invalid() {
    let loaded =
        load_layered_yaml_from_strings(&["returns:\n  batch_number_prefix: \"  \"\n"]).unwrap();
    assert!(loaded.engine_settings().is_err());
}

#[test]
fn zero_connections_is_invalid() {
    let loaded = load_layered_yaml_from_strings(&["database:\n  max_connections: 0\n"]).unwrap();
    assert!(loaded.daemon_settings().is_err());
}

#[test]
fn files_are_layered_in_order() {
    let mut base = tempfile::NamedTempFile::new().unwrap();
    writeln!(base, "returns:\n  batch_number_prefix: \"LB-A-\"").unwrap();
    let mut overlay = tempfile::NamedTempFile::new().unwrap();
    writeln!(overlay, "returns:\n  batch_number_prefix: \"LB-B-\"").unwrap();

    let base_path = base.path().to_str().unwrap().to_string();
    let overlay_path = overlay.path().to_str().unwrap().to_string();
    let loaded = load_layered_yaml(&[&base_path, &overlay_path]).unwrap();

    assert_eq!(loaded.engine_settings().unwrap().batch_number_prefix, "LB-B-");
}

#[test]
fn missing_file_names_the_path() {
    let err = load_layered_yaml(&["/definitely/not/here.yaml"]).unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.yaml"));
}

#[test]
fn shipped_defaults_match_builtin_defaults() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../config/defaults.yaml");
    let path = path.to_string_lossy().to_string();

    let shipped = load_layered_yaml(&[path.as_str()]).unwrap();
    let builtin = LoadedConfig::defaults().unwrap();

    assert_eq!(
        shipped.engine_settings().unwrap(),
        builtin.engine_settings().unwrap()
    );
    assert_eq!(
        shipped.daemon_settings().unwrap(),
        builtin.daemon_settings().unwrap()
    );

    let report = rbo_config::report_unused_keys(
        rbo_config::ConfigSurface::Daemon,
        &shipped.config_json,
        rbo_config::UnusedKeyPolicy::Fail,
    )
    .unwrap();
    assert!(report.is_clean());
}
