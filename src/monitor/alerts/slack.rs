// Slack Notification Channel - Incoming webhook with Block Kit

use crate::Result;
use crate::error::CredwatchError;
use crate::monitor::alerts::{
    ATTENTION_ORDER, CHANNEL_TIMEOUT, MAX_LISTED_PER_STATUS, NotificationChannel, http_client,
    status_heading,
};
use crate::monitor::config::SlackConfig;
use crate::monitor::report::ExpirationReport;
use crate::monitor::status::ExpirationStatus;
use crate::monitor::types::CredentialSource;
use async_trait::async_trait;
use std::time::Duration;
use serde_json::{Value, json};

/// Slack channel
pub struct SlackChannel {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create new Slack channel
    pub fn new(config: SlackConfig) -> Result<Self> {
        Self::with_timeout(config, CHANNEL_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(config: SlackConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            config,
            client: http_client(timeout)?,
        })
    }

    /// Format report as a Block Kit message
    fn format_message(&self, report: &ExpirationReport) -> Value {
        let level = report.notification_level();
        let stats = report.statistics();

        let mut blocks = vec![
            json!({
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!("{} Credential Expiry Alert", level.emoji()),
                    "emoji": true
                }
            }),
            json!({
                "type": "section",
                "text": {"type": "mrkdwn", "text": format!("*{}*", stats.summary())}
            }),
            json!({
                "type": "section",
                "fields": [
                    {"type": "mrkdwn", "text": format!("*Apps Affected:*\n{}", report.affected_applications())},
                    {"type": "mrkdwn", "text": format!("*Total:*\n{}", stats.total_credentials)}
                ]
            }),
            json!({
                "type": "section",
                "fields": [
                    {"type": "mrkdwn", "text": format!("*🔴 Expired:*\n{}", stats.expired_count)},
                    {"type": "mrkdwn", "text": format!("*🟠 Critical:*\n{}", stats.critical_count)},
                    {"type": "mrkdwn", "text": format!("*🟡 Warning:*\n{}", stats.warning_count)},
                    {"type": "mrkdwn", "text": format!("*🔵 Info:*\n{}", stats.info_count)}
                ]
            }),
        ];

        for (source, title) in [
            (CredentialSource::AppRegistration, "*📦 APP REGISTRATIONS*"),
            (CredentialSource::ServicePrincipal, "*🔧 SERVICE PRINCIPALS*"),
        ] {
            let details = self.source_details(report, source);
            if details.is_empty() {
                continue;
            }
            blocks.push(json!({"type": "divider"}));
            blocks.push(json!({"type": "section", "text": {"type": "mrkdwn", "text": title}}));
            blocks.push(json!({"type": "section", "text": {"type": "mrkdwn", "text": details}}));
        }

        blocks.push(json!({"type": "divider"}));
        blocks.push(json!({
            "type": "context",
            "elements": [{
                "type": "mrkdwn",
                "text": format!("credwatch | {}", report.generated_at().format("%Y-%m-%d %H:%M UTC"))
            }]
        }));

        json!({
            "text": stats.summary(),
            "blocks": blocks,
            "attachments": [{"color": level.color_hex(), "blocks": []}]
        })
    }

    /// Up to three entries per non-healthy band for one source
    fn source_details(&self, report: &ExpirationReport, source: CredentialSource) -> String {
        let credentials = report.by_source(source);
        let mut parts = Vec::new();

        for status in ATTENTION_ORDER {
            let matching: Vec<_> = credentials.iter().filter(|c| c.status == status).collect();
            if matching.is_empty() {
                continue;
            }

            let prefix = if parts.is_empty() { "" } else { "\n" };
            parts.push(format!(
                "{}*{} {}:*",
                prefix,
                status_emoji(status),
                status_heading(status, report.thresholds())
            ));

            for c in matching.iter().take(MAX_LISTED_PER_STATUS) {
                let cred = &c.credential;
                let remaining = if status == ExpirationStatus::Expired {
                    format!("{}", cred.credential_type)
                } else {
                    format!("{}d", c.days_until_expiry)
                };
                parts.push(format!(
                    "• `{}` - _{}_ ({}) <{}|Manage>",
                    cred.application_name,
                    cred.label(),
                    remaining,
                    cred.portal_url()
                ));
            }

            if matching.len() > MAX_LISTED_PER_STATUS {
                parts.push(format!("… and {} more", matching.len() - MAX_LISTED_PER_STATUS));
            }
        }

        parts.join("\n")
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
                "slack",
                format!("webhook returned status {}: {}", status, body),
            ));
        }

        Ok(())
    }
}

fn status_emoji(status: ExpirationStatus) -> &'static str {
    match status {
        ExpirationStatus::Expired => "🔴",
        ExpirationStatus::Critical => "🟠",
        ExpirationStatus::Warning => "🟡",
        ExpirationStatus::Info => "🔵",
        ExpirationStatus::Healthy => "🟢",
    }
}

#[async_trait]
impl NotificationChannel for SlackChannel {
    async fn send(&self, report: &ExpirationReport) -> Result<()> {
        self.post(&self.format_message(report)).await?;
        tracing::info!("Slack notification sent");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "slack"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn test_connection(&self) -> Result<()> {
        self.post(&json!({"text": "credwatch connection test"})).await
    }
}
