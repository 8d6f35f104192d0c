// API Server Implementation

use crate::api::{config::ApiConfig, middleware, openapi::ApiDoc, routes, state::AppState};
use anyhow::Result;
use axum::{
    Json, Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tracing::info;
use utoipa::OpenApi;

/// API Server
pub struct ApiServer {
    config: ApiConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create new API server
    pub fn new(state: Arc<AppState>) -> Self {
        let config = state.config.as_ref().clone();
        Self { config, state }
    }

    /// Build the router
    pub fn build_router(&self) -> Router {
        let api_routes = Router::new()
            .route("/report", get(routes::report::get_report))
            .route("/check", post(routes::check::trigger_check))
            .route("/health", get(routes::health::health_check));

        let mut router = Router::new()
            .nest("/api/v1", api_routes)
            // Also support /health at root level
            .route("/health", get(routes::health::health_check));

        if self.config.enable_openapi {
            router = router.route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));
        }

        let router = router
            // Add authentication middleware
            .layer(axum_middleware::from_fn_with_state(
                self.state.config.clone(),
                middleware::authenticate,
            ));

        let router = if self.config.enable_cors {
            router.layer(middleware::cors_layer())
        } else {
            router
        };

        router
            // Add compression
            .layer(CompressionLayer::new())
            // Add logging
            .layer(middleware::logging_layer())
            // Add shared state
            .with_state(self.state.clone())
    }

    /// Run the server until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.build_router();

        let addr = self.config.bind_address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("credwatch API listening on {}", addr);
        if self.config.enable_openapi {
            info!("OpenAPI document available at: http://{}/api/openapi.json", addr);
        }
        info!("Health check endpoint: http://{}/health", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server stopped");
        Ok(())
    }

    /// Get the application state
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }
}
