// Generic Webhook Notification Channel

use crate::Result;
use crate::error::CredwatchError;
use crate::monitor::alerts::{CHANNEL_TIMEOUT, NotificationChannel, http_client};
use crate::monitor::config::WebhookConfig;
use crate::monitor::payload::{CredentialDetail, DetailedReportPayload};
use crate::monitor::report::ExpirationReport;
use crate::monitor::types::CredentialSource;
use async_trait::async_trait;
use std::time::Duration;
use serde_json::{Value, json};

pub const EVENT_TYPE: &str = "credential_expiry_alert";

/// Generic webhook channel, the only one that receives per-credential detail
pub struct WebhookChannel {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookChannel {
    /// Create new webhook channel
    pub fn new(config: WebhookConfig) -> Result<Self> {
        Self::with_timeout(config, CHANNEL_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(config: WebhookConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            config,
            client: http_client(timeout)?,
        })
    }

    /// Detailed payload plus per-source sections
    fn format_payload(&self, report: &ExpirationReport) -> Result<Value> {
        let mut payload = serde_json::to_value(DetailedReportPayload::from(report))?;

        if let Some(object) = payload.as_object_mut() {
            object.insert("event_type".to_string(), json!(EVENT_TYPE));
            object.insert(
                "app_registrations".to_string(),
                source_section(report, CredentialSource::AppRegistration)?,
            );
            object.insert(
                "service_principals".to_string(),
                source_section(report, CredentialSource::ServicePrincipal)?,
            );
        }

        Ok(payload)
    }

    async fn post(&self, payload: &Value) -> Result<()> {
        let mut request = self.client.post(&self.config.url).json(payload);

        // Add custom headers
        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CredwatchError::delivery(
                "webhook",
                format!("webhook returned status {}: {}", status, body),
            ));
        }

        Ok(())
    }
}

fn source_section(report: &ExpirationReport, source: CredentialSource) -> Result<Value> {
    let mut credentials: Vec<_> = report
        .by_source(source)
        .into_iter()
        .filter(|c| c.status.requires_attention())
        .collect();
    credentials.sort_by_key(|c| c.days_until_expiry);

    let details: Vec<CredentialDetail> = credentials.into_iter().map(CredentialDetail::from).collect();

    Ok(json!({
        "summary": report.source_summary(source),
        "statistics": serde_json::to_value(report.source_statistics(source))?,
        "credentials": details,
    }))
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, report: &ExpirationReport) -> Result<()> {
        let payload = self.format_payload(report)?;
        self.post(&payload).await?;
        tracing::info!("Webhook notification sent to {}", self.config.url);
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn test_connection(&self) -> Result<()> {
        let test_payload = json!({
            "event_type": EVENT_TYPE,
            "test": true,
            "message": "credwatch connection test"
        });
        self.post(&test_payload).await
    }
}
