//! Case store REST API endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rehearse_core::CaseSummary;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::api::{ErrorResponse, error_response, storage_error};
use crate::AppState;
use crate::storage::CaseDocument;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Body of `POST /api/cases`
#[derive(Debug, Deserialize)]
pub struct SaveCaseRequest {
    #[serde(default)]
    pub case_id: Option<String>,
    #[serde(default)]
    pub skeleton: Value,
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub personas: Value,
}

/// Response of `POST /api/cases`
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveCaseResponse {
    pub message: String,
    pub case_id: String,
    pub personas_count: usize,
}

/// GET /api/cases
pub async fn list_cases(State(state): State<Arc<AppState>>) -> ApiResult<Vec<CaseSummary>> {
    let cases = state.cases.list_cases().await.map_err(storage_error)?;
    Ok(Json(cases))
}

/// GET /api/cases/:case_id
pub async fn get_case(
    State(state): State<Arc<AppState>>,
    Path(case_id): Path<String>,
) -> ApiResult<Value> {
    match state.cases.get_case(&case_id).await.map_err(storage_error)? {
        Some(case) => Ok(Json(json!({
            "skeleton": case.skeleton,
            "personas": case.personas,
            "context": case.context,
        }))),
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("case not found: {}", case_id),
        )),
    }
}

/// POST /api/cases
pub async fn save_case(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SaveCaseRequest>,
) -> ApiResult<SaveCaseResponse> {
    let Some(case_id) = body.case_id.filter(|id| !id.trim().is_empty()) else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_REQUEST",
            "case_id is required",
        ));
    };

    let case = CaseDocument {
        case_id,
        skeleton: body.skeleton,
        context: body.context,
        personas: body.personas,
    };
    state.cases.upsert_case(&case).await.map_err(storage_error)?;

    let personas_count = case.personas_count();
    tracing::info!(case_id = %case.case_id, personas_count, "case saved");

    Ok(Json(SaveCaseResponse {
        message: format!("Case '{}' saved", case.case_id),
        case_id: case.case_id,
        personas_count,
    }))
}
