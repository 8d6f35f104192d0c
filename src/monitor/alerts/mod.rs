// Notification Channels - Multi-channel report delivery

pub mod channels;
pub mod email;
pub mod graph_email;
pub mod slack;
pub mod teams;
pub mod webhook;

use crate::Result;
use crate::monitor::analyzer::ClassifiedCredential;
use crate::monitor::config::MonitorConfig;
use crate::monitor::status::ExpirationStatus;
use crate::monitor::thresholds::Thresholds;
use std::time::Duration;

pub use channels::NotificationChannel;

/// Request timeout for the webhook-style channels
pub const CHANNEL_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials listed per severity in chat-style channels
pub const MAX_LISTED_PER_STATUS: usize = 3;

/// Non-healthy bands in the order channels render them
pub const ATTENTION_ORDER: [ExpirationStatus; 4] = [
    ExpirationStatus::Expired,
    ExpirationStatus::Critical,
    ExpirationStatus::Warning,
    ExpirationStatus::Info,
];

/// Build every enabled channel, in dispatch order
pub fn build_channels(config: &MonitorConfig) -> Result<Vec<Box<dyn NotificationChannel>>> {
    let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

    // Initialize SMTP email channel if configured
    if let Some(ref email_config) = config.channels.email
        && email_config.enabled
    {
        channels.push(Box::new(email::EmailChannel::new(email_config.clone())?));
    }

    // Initialize Graph mail channel if configured
    if let Some(ref graph_email_config) = config.channels.graph_email
        && graph_email_config.enabled
    {
        let channel = graph_email::GraphEmailChannel::from_config(config, graph_email_config)?;
        channels.push(Box::new(channel));
    }

    // Initialize Slack channel if configured
    if let Some(ref slack_config) = config.channels.slack
        && slack_config.enabled
    {
        channels.push(Box::new(slack::SlackChannel::new(slack_config.clone())?));
    }

    // Initialize Teams channel if configured
    if let Some(ref teams_config) = config.channels.teams
        && teams_config.enabled
    {
        channels.push(Box::new(teams::TeamsChannel::new(teams_config.clone())?));
    }

    // Initialize Webhook channel if configured
    if let Some(ref webhook_config) = config.channels.webhook
        && webhook_config.enabled
    {
        channels.push(Box::new(webhook::WebhookChannel::new(webhook_config.clone())?));
    }

    Ok(channels)
}

/// HTTP client whose requests give up after `timeout`
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Section heading for a severity band
pub fn status_heading(status: ExpirationStatus, thresholds: Thresholds) -> String {
    match status {
        ExpirationStatus::Expired => "Expired".to_string(),
        ExpirationStatus::Critical => {
            format!("Critical (≤{} days)", thresholds.critical_days)
        }
        ExpirationStatus::Warning => {
            format!("Warning (≤{} days)", thresholds.warning_days)
        }
        ExpirationStatus::Info => format!("Info (≤{} days)", thresholds.info_days),
        ExpirationStatus::Healthy => "Healthy".to_string(),
    }
}

/// "EXPIRED" or the remaining day count
pub fn remaining_label(classified: &ClassifiedCredential) -> String {
    if classified.status == ExpirationStatus::Expired {
        "EXPIRED".to_string()
    } else {
        format!("{}d", classified.days_until_expiry)
    }
}

/// Plain-text list used by email bodies, truncated after `max_items`
pub fn format_credential_list(
    credentials: &[&ClassifiedCredential],
    max_items: usize,
    include_url: bool,
) -> String {
    let mut lines: Vec<String> = credentials
        .iter()
        .take(max_items)
        .map(|c| {
            let cred = &c.credential;
            let mut line = format!(
                "• {} - {} '{}': {}",
                cred.application_name,
                cred.credential_type,
                cred.label(),
                remaining_label(c)
            );
            if include_url {
                line.push_str(&format!("\n  Manage: {}", cred.portal_url()));
            }
            line
        })
        .collect();

    if credentials.len() > max_items {
        lines.push(format!("... and {} more", credentials.len() - max_items));
    }

    lines.join("\n")
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::config::{SlackConfig, WebhookConfig};
    use std::collections::HashMap;

    #[test]
    fn test_build_channels_only_enabled() {
        let mut config = MonitorConfig::default();
        config.channels.slack = Some(SlackConfig {
            enabled: false,
            webhook_url: "https://hooks.slack.com/services/TEST".to_string(),
        });
        config.channels.webhook = Some(WebhookConfig {
            enabled: true,
            url: "https://example.com/hook".to_string(),
            headers: HashMap::new(),
        });

        let channels = build_channels(&config).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].channel_name(), "webhook");
    }

    #[test]
    fn test_format_credential_list_truncates() {
        let report = test_support::sample_report();
        let attention: Vec<_> = report.requiring_attention().collect();

        let text = format_credential_list(&attention, 2, false);
        assert!(text.contains("• Billing API - password 'prod-secret': EXPIRED"));
        assert!(text.contains("• Payroll - certificate 'crit-1': 3d"));
        assert!(text.ends_with("... and 2 more"));
    }

    #[test]
    fn test_status_heading_uses_report_thresholds() {
        let thresholds = Thresholds::new(5, 10, 20).unwrap();
        assert_eq!(
            status_heading(ExpirationStatus::Critical, thresholds),
            "Critical (≤5 days)"
        );
        assert_eq!(status_heading(ExpirationStatus::Expired, thresholds), "Expired");
    }
}
