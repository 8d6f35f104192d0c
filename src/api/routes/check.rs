// Trigger Check Route

use crate::api::{
    middleware::{AuthExtension, require_operator},
    models::{
        error::{ApiError, ApiErrorResponse},
        response::CheckResponse,
    },
    state::AppState,
};
use axum::{Extension, Json, extract::State};
use std::sync::Arc;

/// Trigger a check
///
/// Runs a full check synchronously and returns its outcome. A request that
/// arrives during another run waits for that run to finish first.
#[utoipa::path(
    post,
    path = "/api/v1/check",
    tag = "check",
    responses(
        (status = 200, description = "Run completed", body = CheckResponse),
        (status = 401, description = "Missing or invalid API key", body = ApiErrorResponse),
        (status = 403, description = "Operator permission required", body = ApiErrorResponse),
        (status = 502, description = "Directory could not be read", body = ApiErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn trigger_check(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthExtension>>,
) -> Result<Json<CheckResponse>, ApiError> {
    require_operator(auth.as_ref().map(|Extension(ext)| ext))?;

    tracing::info!("On-demand check requested");
    let outcome = state.use_case.execute().await?;

    Ok(Json(CheckResponse::from(&outcome)))
}
