// Authentication Middleware

use crate::api::{
    config::{ApiConfig, Permission},
    models::error::ApiError,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Paths reachable without a key
const PUBLIC_PATHS: [&str; 3] = ["/health", "/api/v1/health", "/api/openapi.json"];

/// Authentication extension inserted into request
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub permission: Permission,
}

/// Authentication middleware
pub async fn authenticate(
    State(config): State<Arc<ApiConfig>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // No keys configured: every caller is an operator
    if !config.auth_enabled() {
        req.extensions_mut().insert(AuthExtension {
            permission: Permission::Operator,
        });
        return Ok(next.run(req).await);
    }

    if PUBLIC_PATHS.contains(&req.uri().path()) {
        return Ok(next.run(req).await);
    }

    // Extract API key from X-API-Key header
    let api_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-API-Key header".to_string()))?;

    // Validate API key
    let permission = config
        .validate_key(api_key)
        .ok_or_else(|| ApiError::Unauthorized("Invalid API key".to_string()))?;

    req.extensions_mut().insert(AuthExtension { permission });

    Ok(next.run(req).await)
}

/// Check if the caller may trigger runs
pub fn require_operator(auth: Option<&AuthExtension>) -> Result<(), ApiError> {
    match auth {
        Some(ext) if ext.permission.can_trigger() => Ok(()),
        _ => Err(ApiError::Forbidden(
            "Operator permission required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_operator() {
        let operator = AuthExtension {
            permission: Permission::Operator,
        };
        let reader = AuthExtension {
            permission: Permission::ReadOnly,
        };

        assert!(require_operator(Some(&operator)).is_ok());
        assert!(matches!(
            require_operator(Some(&reader)),
            Err(ApiError::Forbidden(_))
        ));
        assert!(require_operator(None).is_err());
    }
}
