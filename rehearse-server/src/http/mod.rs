//! HTTP server module

mod api;
mod cases;
mod history;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::middleware::require_auth;

pub use api::{ErrorResponse, HealthResponse, error_response};
pub use cases::{SaveCaseRequest, SaveCaseResponse};
pub use history::SaveHistoryRequest;

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route(
            "/api/sessions/history",
            post(history::save_history).get(history::list_histories),
        )
        .route(
            "/api/sessions/history/:session_id",
            get(history::get_history),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/cases", get(cases::list_cases).post(cases::save_case))
        .route("/api/cases/:case_id", get(cases::get_case))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
