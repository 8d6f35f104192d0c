// Graph Mail Notification Channel - sendMail on behalf of a mailbox

use crate::Result;
use crate::error::CredwatchError;
use crate::graph::{GraphClient, GraphCredentials};
use crate::monitor::alerts::NotificationChannel;
use crate::monitor::alerts::email::{format_html_body, format_subject};
use crate::monitor::config::{GraphEmailConfig, MonitorConfig};
use crate::monitor::report::ExpirationReport;
use async_trait::async_trait;
use serde_json::{Value, json};

const GRAPH_MAIL_TIMEOUT_SECONDS: u64 = 30;

/// Email delivered through Microsoft Graph instead of SMTP
pub struct GraphEmailChannel {
    config: GraphEmailConfig,
    client: GraphClient,
}

impl GraphEmailChannel {
    pub fn new(config: GraphEmailConfig, client: GraphClient) -> Self {
        Self { config, client }
    }

    /// Build from configuration, borrowing directory credentials when needed
    pub fn from_config(monitor: &MonitorConfig, config: &GraphEmailConfig) -> Result<Self> {
        let (tenant_id, client_id, client_secret) = monitor
            .graph_email_credentials()
            .ok_or_else(|| CredwatchError::config("graph_email channel has no tenant/client credentials"))?;

        let client = GraphClient::new(
            GraphCredentials {
                tenant_id,
                client_id,
                client_secret,
            },
            GRAPH_MAIL_TIMEOUT_SECONDS,
        )?;

        Ok(Self::new(config.clone(), client))
    }

    fn send_mail_endpoint(&self) -> String {
        format!("/users/{}/sendMail", self.config.from_address)
    }

    fn build_message(&self, subject: String, html: String) -> Value {
        let recipients: Vec<Value> = self
            .config
            .to_addresses
            .iter()
            .map(|addr| json!({"emailAddress": {"address": addr.trim()}}))
            .collect();

        json!({
            "message": {
                "subject": subject,
                "body": {"contentType": "HTML", "content": html},
                "toRecipients": recipients
            },
            "saveToSentItems": self.config.save_to_sent_items
        })
    }

    async fn deliver(&self, message: &Value) -> Result<()> {
        self.client
            .post_json(&self.send_mail_endpoint(), message)
            .await
            .map_err(|e| CredwatchError::delivery("graph_email", e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for GraphEmailChannel {
    async fn send(&self, report: &ExpirationReport) -> Result<()> {
        let message = self.build_message(format_subject(report), format_html_body(report));
        self.deliver(&message).await?;

        tracing::info!(
            "Graph email sent to {}",
            self.config.to_addresses.join(", ")
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "graph_email"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn test_connection(&self) -> Result<()> {
        self.client
            .access_token()
            .await
            .map_err(|e| CredwatchError::delivery("graph_email", e.to_string()))?;
        Ok(())
    }
}
