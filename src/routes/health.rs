//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    cached_pages: usize,
}

/// Liveness probe. Does not contact the content API.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "spacetraveling",
        version: env!("CARGO_PKG_VERSION"),
        cached_pages: state.pages.len().await,
    })
}
