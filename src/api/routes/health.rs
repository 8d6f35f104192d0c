// Health Check Route

use crate::api::{models::response::HealthResponse, state::AppState};
use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::Arc;

/// Health check endpoint
///
/// Returns the health status of the service and when it last completed a run
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
        last_run_at: state.latest().last_run_at(),
    })
}
