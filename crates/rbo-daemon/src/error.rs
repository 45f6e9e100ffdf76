//! One place that turns engine refusals into HTTP responses.
//!
//! | refusal                         | status |
//! |---------------------------------|--------|
//! | missing / malformed actor       | 401    |
//! | malformed body, invalid lines   | 400    |
//! | already processed               | 400    |
//! | other franchise, readonly role  | 403    |
//! | unknown return                  | 404    |
//! | handover ledger unavailable     | 503    |
//! | storage failure, rolled back    | 500    |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rbo_returns::ProcessError;
use uuid::Uuid;

use crate::api_types::ErrorResponse;

const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    Process(ProcessError),
    RolledBack { correlation_id: Uuid },
}

impl From<ProcessError> for ApiError {
    fn from(e: ProcessError) -> Self {
        ApiError::Process(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: msg,
                    code: Some("UNAUTHORIZED".to_string()),
                    correlation_id: None,
                },
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: msg,
                    code: Some("BAD_REQUEST".to_string()),
                    correlation_id: None,
                },
            ),
            ApiError::RolledBack { correlation_id } => internal(correlation_id),
            ApiError::Process(ProcessError::Storage { correlation_id, .. }) => {
                internal(correlation_id)
            }
            ApiError::Process(e) => {
                let status = match &e {
                    ProcessError::NotFound { .. } => StatusCode::NOT_FOUND,
                    ProcessError::Forbidden { .. } => StatusCode::FORBIDDEN,
                    ProcessError::AlreadyProcessed(_) | ProcessError::Invalid(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    ProcessError::HandoverUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    ProcessError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (
                    status,
                    ErrorResponse {
                        error: e.to_string(),
                        code: Some(e.code().to_string()),
                        correlation_id: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

fn internal(correlation_id: Uuid) -> (StatusCode, ErrorResponse) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse {
            error: INTERNAL_ERROR.to_string(),
            code: None,
            correlation_id: Some(correlation_id),
        },
    )
}
