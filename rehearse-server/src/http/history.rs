//! Session history REST API endpoints
//!
//! Every route sits behind [`require_auth`](crate::middleware::require_auth)
//! and is scoped to the caller's own records.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use rehearse_core::StoredHistory;
use rehearse_core::history::SaveHistoryResponse;
use serde::Deserialize;
use serde_json::Value;

use super::api::{ErrorResponse, error_response, storage_error};
use crate::AppState;
use crate::auth::Identity;
use crate::storage::HistoryUpsert;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Body of `POST /api/sessions/history`
///
/// Identifiers are optional here so that a missing one is a 400 rather than a
/// body rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveHistoryRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub case_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub final_score: Option<f64>,
    #[serde(default)]
    pub final_state: Value,
}

fn required(field: Option<String>, name: &str) -> Result<String, ApiError> {
    field.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_REQUEST",
            format!("{} is required", name),
        )
    })
}

/// POST /api/sessions/history
pub async fn save_history(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<SaveHistoryRequest>,
) -> ApiResult<SaveHistoryResponse> {
    let session_id = required(body.session_id, "sessionId")?;
    let case_id = required(body.case_id, "caseId")?;
    let final_state = match body.final_state {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };

    let entry = HistoryUpsert {
        session_id,
        case_id,
        messages: body.messages,
        final_score: body.final_score.unwrap_or(0.0),
        final_state,
    };

    let history = state
        .histories
        .upsert_history(&identity.user_id, &entry)
        .await
        .map_err(storage_error)?;

    tracing::info!(
        session_id = %history.session_id,
        user_id = %identity.user_id,
        final_score = history.final_score,
        "session history saved"
    );

    Ok(Json(SaveHistoryResponse {
        message: "Session history saved".to_string(),
        history,
    }))
}

/// GET /api/sessions/history
pub async fn list_histories(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<StoredHistory>> {
    let histories = state
        .histories
        .list_histories(&identity.user_id)
        .await
        .map_err(storage_error)?;
    Ok(Json(histories))
}

/// GET /api/sessions/history/:session_id
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(session_id): Path<String>,
) -> ApiResult<StoredHistory> {
    match state
        .histories
        .get_history(&identity.user_id, &session_id)
        .await
        .map_err(storage_error)?
    {
        Some(history) => Ok(Json(history)),
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("history not found: {}", session_id),
        )),
    }
}
