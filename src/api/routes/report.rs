// Latest Report Route

use crate::api::{
    models::error::{ApiError, ApiErrorResponse},
    state::AppState,
};
use crate::monitor::payload::ReportPayload;
use axum::{Json, extract::State};
use std::sync::Arc;

/// Latest report
///
/// Summary and statistics of the most recently published report. Individual
/// credentials are never listed here.
#[utoipa::path(
    get,
    path = "/api/v1/report",
    tag = "report",
    responses(
        (status = 200, description = "Latest report", body = ReportPayload),
        (status = 404, description = "No run has completed yet", body = ApiErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn get_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReportPayload>, ApiError> {
    let report = state
        .latest()
        .current()
        .ok_or_else(|| ApiError::NotFound("No report available yet".to_string()))?;

    Ok(Json(ReportPayload::from(report.as_ref())))
}
