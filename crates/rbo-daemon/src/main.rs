//! rbo-daemon entry point.
//!
//! Thin on purpose: tracing, config, database, middleware, serve. Handlers
//! live in `routes.rs`; shared state in `state.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{bail, Context};
use axum::http::{HeaderValue, Method};
use rbo_config::{report_unused_keys, ConfigSurface, UnusedKeyPolicy};
use rbo_daemon::{routes, state};
use rbo_db::PgReturnStore;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

const ENV_DAEMON_ADDR: &str = "RBO_DAEMON_ADDR";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cfg = rbo_config::load_from_env().context("config load failed")?;
    let unused = report_unused_keys(ConfigSurface::Daemon, &cfg.config_json, UnusedKeyPolicy::Warn)?;
    if !unused.is_clean() {
        warn!(unused = ?unused.unused_leaf_pointers, "unused config keys");
    }
    let engine = cfg.engine_settings()?;
    let daemon = cfg.daemon_settings()?;
    info!(config_hash = %cfg.config_hash, "config loaded");

    let pool = rbo_db::connect_from_env_with(daemon.db_max_connections).await?;
    let st = rbo_db::status(&pool).await?;
    if !st.has_returns_table {
        bail!("returns schema missing; run `rbo db migrate` first");
    }

    let shared = Arc::new(state::AppState::new(
        Arc::new(PgReturnStore::new(pool)),
        engine,
    ));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = match bind_addr_from_env() {
        Some(a) => a,
        None => daemon
            .bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid daemon.bind_addr {}", daemon.bind_addr))?,
    };
    info!("rbo-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var(ENV_DAEMON_ADDR).ok()?.parse().ok()
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
