//! Axum router and all HTTP handlers for rbo-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rbo_returns::{preview_return, process_return, ProcessOutcome, ReturnSubmission};
use tracing::info;
use uuid::Uuid;

use crate::{
    actor::ActorHeaders,
    api_types::{HealthResponse, PreviewResponse, ProcessResponse},
    error::ApiError,
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/returns/:id/process", post(process))
        .route("/v1/returns/:id/preview", post(preview))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/returns/:id/process
// ---------------------------------------------------------------------------

pub(crate) async fn process(
    State(st): State<Arc<AppState>>,
    Path(return_id): Path<Uuid>,
    ActorHeaders(actor): ActorHeaders,
    body: Result<Json<ReturnSubmission>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(submission) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = process_return(
        st.store.as_ref(),
        &st.settings,
        &actor,
        return_id,
        &submission,
        Utc::now(),
    )
    .await?;

    match outcome {
        ProcessOutcome::Applied(summary) => {
            info!(return_id = %return_id, "returns/process ok");
            Ok((
                StatusCode::OK,
                Json(ProcessResponse {
                    success: true,
                    return_id,
                    results: summary.into(),
                }),
            )
                .into_response())
        }
        ProcessOutcome::RolledBack { correlation_id, .. } => {
            Err(ApiError::RolledBack { correlation_id })
        }
    }
}

// ---------------------------------------------------------------------------
// POST /v1/returns/:id/preview
// ---------------------------------------------------------------------------

pub(crate) async fn preview(
    State(st): State<Arc<AppState>>,
    Path(return_id): Path<Uuid>,
    ActorHeaders(actor): ActorHeaders,
    body: Result<Json<ReturnSubmission>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(submission) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let preview = preview_return(st.store.as_ref(), &actor, return_id, &submission).await?;

    Ok((
        StatusCode::OK,
        Json(PreviewResponse {
            success: true,
            preview,
        }),
    )
        .into_response())
}
