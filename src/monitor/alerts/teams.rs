// Microsoft Teams Notification Channel - Adaptive Card via incoming webhook

use crate::Result;
use crate::error::CredwatchError;
use crate::monitor::alerts::{
    ATTENTION_ORDER, CHANNEL_TIMEOUT, MAX_LISTED_PER_STATUS, NotificationChannel, http_client,
    remaining_label, status_heading,
};
use crate::monitor::config::TeamsConfig;
use crate::monitor::report::ExpirationReport;
use crate::monitor::types::CredentialSource;
use async_trait::async_trait;
use std::time::Duration;
use serde_json::{Value, json};

/// Microsoft Teams channel
pub struct TeamsChannel {
    config: TeamsConfig,
    client: reqwest::Client,
}

impl TeamsChannel {
    /// Create new Teams channel
    pub fn new(config: TeamsConfig) -> Result<Self> {
        Self::with_timeout(config, CHANNEL_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(config: TeamsConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            config,
            client: http_client(timeout)?,
        })
    }

    /// Format report as an Adaptive Card message
    fn format_message(&self, report: &ExpirationReport) -> Value {
        let level = report.notification_level();
        let stats = report.statistics();

        let facts = vec![
            json!({"title": "Applications Affected", "value": report.affected_applications().to_string()}),
            json!({"title": "Expired", "value": stats.expired_count.to_string()}),
            json!({"title": "Critical", "value": stats.critical_count.to_string()}),
            json!({"title": "Warning", "value": stats.warning_count.to_string()}),
            json!({"title": "Info", "value": stats.info_count.to_string()}),
            json!({"title": "Generated", "value": report.generated_at().format("%Y-%m-%d %H:%M:%S UTC").to_string()}),
        ];

        let mut body = vec![
            json!({
                "type": "Container",
                "style": "emphasis",
                "items": [{
                    "type": "TextBlock",
                    "text": format!("{} Credential Expiry Alert", level.emoji()),
                    "weight": "Bolder",
                    "size": "Large",
                    "wrap": true
                }]
            }),
            json!({"type": "TextBlock", "text": stats.summary(), "wrap": true, "size": "Medium"}),
            json!({"type": "FactSet", "facts": facts}),
        ];

        for source in [CredentialSource::AppRegistration, CredentialSource::ServicePrincipal] {
            body.extend(self.source_section(report, source));
        }

        json!({
            "type": "message",
            "attachments": [{
                "contentType": "application/vnd.microsoft.card.adaptive",
                "contentVersion": "1.4",
                "content": {
                    "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
                    "type": "AdaptiveCard",
                    "version": "1.4",
                    "body": body
                }
            }]
        })
    }

    /// Card items for one source, empty when nothing needs attention
    fn source_section(&self, report: &ExpirationReport, source: CredentialSource) -> Vec<Value> {
        let credentials = report.by_source(source);
        if !credentials.iter().any(|c| c.status.requires_attention()) {
            return Vec::new();
        }

        let mut items = vec![json!({
            "type": "TextBlock",
            "text": format!("**{}s**", source.display_name()),
            "wrap": true,
            "weight": "Bolder",
            "size": "Medium",
            "color": "Accent",
            "spacing": "Large"
        })];

        for status in ATTENTION_ORDER {
            let matching: Vec<_> = credentials.iter().filter(|c| c.status == status).collect();
            if matching.is_empty() {
                continue;
            }

            items.push(json!({
                "type": "TextBlock",
                "text": format!("**{}:**", status_heading(status, report.thresholds())),
                "wrap": true,
                "weight": "Bolder",
                "spacing": "Medium"
            }));

            for c in matching.iter().take(MAX_LISTED_PER_STATUS) {
                let cred = &c.credential;
                items.push(json!({
                    "type": "TextBlock",
                    "text": format!(
                        "• {} - {} '{}' ({}) [Manage]({})",
                        cred.application_name,
                        cred.credential_type,
                        cred.label(),
                        remaining_label(c),
                        cred.portal_url()
                    ),
                    "wrap": true,
                    "spacing": "None"
                }));
            }

            if matching.len() > MAX_LISTED_PER_STATUS {
                items.push(json!({
                    "type": "TextBlock",
                    "text": format!("… and {} more", matching.len() - MAX_LISTED_PER_STATUS),
                    "wrap": true,
                    "isSubtle": true,
                    "spacing": "None"
                }));
            }
        }

        items
    }

    async fn post(&self, payload: &Value) -> Result<()> {
        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CredwatchError::delivery(
                "teams",
                format!("webhook returned status {}: {}", status, body),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for TeamsChannel {
    async fn send(&self, report: &ExpirationReport) -> Result<()> {
        self.post(&self.format_message(report)).await?;
        tracing::info!("Teams notification sent");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "teams"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn test_connection(&self) -> Result<()> {
        let test_message = json!({
            "type": "message",
            "attachments": [{
                "contentType": "application/vnd.microsoft.card.adaptive",
                "content": {
                    "type": "AdaptiveCard",
                    "version": "1.4",
                    "body": [{"type": "TextBlock", "text": "credwatch connection test"}]
                }
            }]
        });
        self.post(&test_message).await
    }
}
