//! REST API handlers

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::storage;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// JSON error body returned by every handler
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Build an error response with a status code
pub fn error_response(
    status: StatusCode,
    code: &str,
    error: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

/// Map a storage failure to an HTTP error
pub(crate) fn storage_error(err: storage::Error) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        storage::Error::Forbidden(_) => {
            error_response(StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string())
        }
        other => {
            tracing::error!("storage error: {}", other);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                other.to_string(),
            )
        }
    }
}
