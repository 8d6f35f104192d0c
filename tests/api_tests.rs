// REST API integration tests

mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use common::{RecordingChannel, StaticDirectory, UnreachableDirectory};
use credwatch::api::{ApiConfig, ApiServer, AppState, Permission};
use credwatch::directory::CredentialDirectory;
use credwatch::monitor::{
    CheckExpiringCredentials, Credential, CredentialType, NotificationDispatcher, Thresholds,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const OPERATOR_KEY: &str = "operator-key";
const READER_KEY: &str = "reader-key";

fn inventory() -> Vec<Credential> {
    let now = Utc::now();
    vec![
        Credential::new(
            "secret-1",
            CredentialType::Password,
            "app-billing",
            "Billing API",
            now - Duration::days(2),
        ),
        Credential::new(
            "cert-1",
            CredentialType::Certificate,
            "app-crm",
            "CRM Sync",
            now + Duration::days(200),
        ),
    ]
}

fn keyed_config() -> ApiConfig {
    let mut config = ApiConfig::default();
    config.add_key(OPERATOR_KEY.to_string(), Permission::Operator);
    config.add_key(READER_KEY.to_string(), Permission::ReadOnly);
    config
}

fn app_with(
    config: ApiConfig,
    directory: Arc<dyn CredentialDirectory>,
    channel: &RecordingChannel,
) -> Router {
    let mut dispatcher = NotificationDispatcher::new();
    dispatcher.add_channel(Box::new(channel.clone()));

    let use_case = Arc::new(CheckExpiringCredentials::new(
        directory,
        dispatcher,
        Thresholds::default(),
    ));
    let state = Arc::new(AppState::new(config, use_case));
    ApiServer::new(state).build_router()
}

fn app(config: ApiConfig) -> Router {
    app_with(
        config,
        Arc::new(StaticDirectory::new(inventory())),
        &RecordingChannel::new("webhook"),
    )
}

fn get(uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(key) = key {
        builder = builder.header("X-API-Key", key);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(key) = key {
        builder = builder.header("X-API-Key", key);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let app = app(keyed_config());

    let response = app.clone().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/v1/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body.get("last_run_at").is_none());
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_missing_key_is_unauthorized() {
    let response = app(keyed_config())
        .oneshot(get("/api/v1/report", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_key_is_unauthorized() {
    let response = app(keyed_config())
        .oneshot(post("/api/v1/check", Some("nope")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_read_only_key_cannot_trigger() {
    let channel = RecordingChannel::new("webhook");
    let app = app_with(
        keyed_config(),
        Arc::new(StaticDirectory::new(inventory())),
        &channel,
    );

    let response = app
        .oneshot(post("/api/v1/check", Some(READER_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(channel.sends(), 0);
}

// ============================================================================
// Report and Check
// ============================================================================

#[tokio::test]
async fn test_report_not_found_before_first_run() {
    let response = app(keyed_config())
        .oneshot(get("/api/v1/report", Some(READER_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(body["message"], "Not found: No report available yet");
}

#[tokio::test]
async fn test_check_then_report() {
    let channel = RecordingChannel::new("webhook");
    let app = app_with(
        keyed_config(),
        Arc::new(StaticDirectory::new(inventory())),
        &channel,
    );

    let response = app
        .clone()
        .oneshot(post("/api/v1/check", Some(OPERATOR_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["dry_run"], false);
    assert_eq!(body["report"]["notification_level"], "expired");
    assert_eq!(body["deliveries"][0]["channel"], "webhook");
    assert_eq!(body["deliveries"][0]["status"], "sent");
    assert_eq!(channel.sends(), 1);

    let response = app
        .oneshot(get("/api/v1/report", Some(READER_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["statistics"]["total_credentials"], 2);
    assert_eq!(body["statistics"]["expired_count"], 1);
    assert_eq!(body["statistics"]["healthy_count"], 1);
    assert_eq!(body["requires_notification"], true);
    assert!(body.get("credentials").is_none());
}

#[tokio::test]
async fn test_check_reports_directory_failure_as_bad_gateway() {
    let app = app_with(
        keyed_config(),
        Arc::new(UnreachableDirectory),
        &RecordingChannel::new("webhook"),
    );

    let response = app
        .clone()
        .oneshot(post("/api/v1/check", Some(OPERATOR_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = app
        .oneshot(get("/api/v1/report", Some(OPERATOR_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_open_api_without_keys() {
    let response = app(ApiConfig::default())
        .oneshot(post("/api/v1/check", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = app(keyed_config())
        .oneshot(get("/api/openapi.json", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"].get("/api/v1/check").is_some());
}
