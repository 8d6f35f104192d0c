// Monitoring configuration

use crate::Result;
use crate::api::config::ApiConfig;
use crate::error::CredwatchError;
use crate::monitor::scheduler::parse_schedule;
use crate::monitor::thresholds::Thresholds;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Run behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Analyse and publish, but never deliver to channels
    pub dry_run: bool,
    /// Cron expression (5 or 6 fields, UTC)
    pub schedule: String,
    /// Run once immediately when the scheduler starts
    pub run_on_startup: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            schedule: "0 8 * * *".to_string(),
            run_on_startup: true,
        }
    }
}

/// Credential inventory source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectoryConfig {
    /// Microsoft Graph (Entra ID)
    Graph(GraphDirectoryConfig),
    /// JSON file of applications and credentials
    File { path: String },
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        DirectoryConfig::Graph(GraphDirectoryConfig::default())
    }
}

/// Microsoft Graph directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphDirectoryConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub include_service_principals: bool,
    pub timeout_seconds: u64,
}

impl Default for GraphDirectoryConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            include_service_principals: true,
            timeout_seconds: 30,
        }
    }
}

/// Notification channels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    pub email: Option<EmailConfig>,
    pub graph_email: Option<GraphEmailConfig>,
    pub slack: Option<SlackConfig>,
    pub teams: Option<TeamsConfig>,
    pub webhook: Option<WebhookConfig>,
}

/// SMTP email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub from_address: String,
    pub to_addresses: Vec<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_true")]
    pub use_tls: bool,
}

/// Microsoft Graph sendMail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEmailConfig {
    pub enabled: bool,
    /// Falls back to the directory credentials when absent
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Sending mailbox; the application needs Mail.Send
    pub from_address: String,
    pub to_addresses: Vec<String>,
    #[serde(default)]
    pub save_to_sent_items: bool,
}

/// Slack configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    pub enabled: bool,
    pub webhook_url: String,
}

/// Microsoft Teams configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamsConfig {
    pub enabled: bool,
    pub webhook_url: String,
}

/// Webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

impl MonitorConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            CredwatchError::config(format!(
                "Failed to read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        let config: MonitorConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| CredwatchError::Other(format!("Failed to serialize config: {}", e)))?;

        fs::write(path.as_ref(), toml_str)?;
        Ok(())
    }

    /// Configuration written by `--config-example`
    pub fn example() -> Self {
        let mut config = Self::default();
        config.channels.webhook = Some(WebhookConfig {
            enabled: true,
            url: "https://hooks.example.com/credwatch".to_string(),
            headers: HashMap::new(),
        });
        config.channels.slack = Some(SlackConfig {
            enabled: false,
            webhook_url: "https://hooks.slack.com/services/T000/B000/XXXX".to_string(),
        });
        config
    }

    /// Fill secrets left empty in the file from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    /// Same as [`apply_env`](Self::apply_env) with an injectable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let DirectoryConfig::Graph(graph) = &mut self.directory {
            fill_from(&mut graph.tenant_id, &lookup, "AZURE_TENANT_ID");
            fill_from(&mut graph.client_id, &lookup, "AZURE_CLIENT_ID");
            fill_from(&mut graph.client_secret, &lookup, "AZURE_CLIENT_SECRET");
        }

        if let Some(email) = &mut self.channels.email {
            fill_from(&mut email.password, &lookup, "SMTP_PASSWORD");
        }
    }

    /// Startup gate; every error here is fatal before any run
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        parse_schedule(&self.run.schedule)?;

        match &self.directory {
            DirectoryConfig::Graph(graph) => {
                let mut missing = Vec::new();
                if graph.tenant_id.is_empty() {
                    missing.push("tenant_id");
                }
                if graph.client_id.is_empty() {
                    missing.push("client_id");
                }
                if graph.client_secret.is_empty() {
                    missing.push("client_secret");
                }
                if !missing.is_empty() {
                    return Err(CredwatchError::config(format!(
                        "directory is missing: {}",
                        missing.join(", ")
                    )));
                }
            }
            DirectoryConfig::File { path } => {
                if path.is_empty() {
                    return Err(CredwatchError::config("directory file path is empty"));
                }
            }
        }

        self.validate_channels()?;

        if self.enabled_channels().is_empty() && !self.run.dry_run {
            return Err(CredwatchError::config(
                "no notification channel is enabled (enable one or set run.dry_run)",
            ));
        }

        Ok(())
    }

    fn validate_channels(&self) -> Result<()> {
        let channels = &self.channels;

        if let Some(email) = channels.email.as_ref().filter(|c| c.enabled) {
            if email.smtp_server.is_empty()
                || email.from_address.is_empty()
                || email.to_addresses.is_empty()
            {
                return Err(CredwatchError::config(
                    "email channel needs smtp_server, from_address and to_addresses",
                ));
            }
        }

        if let Some(graph_email) = channels.graph_email.as_ref().filter(|c| c.enabled) {
            if graph_email.from_address.is_empty() || graph_email.to_addresses.is_empty() {
                return Err(CredwatchError::config(
                    "graph_email channel needs from_address and to_addresses",
                ));
            }
            if self.graph_email_credentials().is_none() {
                return Err(CredwatchError::config(
                    "graph_email channel has no tenant/client credentials",
                ));
            }
        }

        if let Some(slack) = channels.slack.as_ref().filter(|c| c.enabled)
            && slack.webhook_url.is_empty()
        {
            return Err(CredwatchError::config("slack channel needs webhook_url"));
        }

        if let Some(teams) = channels.teams.as_ref().filter(|c| c.enabled)
            && teams.webhook_url.is_empty()
        {
            return Err(CredwatchError::config("teams channel needs webhook_url"));
        }

        if let Some(webhook) = channels.webhook.as_ref().filter(|c| c.enabled)
            && webhook.url.is_empty()
        {
            return Err(CredwatchError::config("webhook channel needs url"));
        }

        Ok(())
    }

    /// Tenant, client id and secret for Graph mail, falling back to the directory's
    pub fn graph_email_credentials(&self) -> Option<(String, String, String)> {
        let graph_email = self.channels.graph_email.as_ref()?;
        let directory = match &self.directory {
            DirectoryConfig::Graph(graph) => Some(graph),
            DirectoryConfig::File { .. } => None,
        };

        let pick = |own: &Option<String>, fallback: Option<&String>| {
            own.clone()
                .filter(|v| !v.is_empty())
                .or_else(|| fallback.filter(|v| !v.is_empty()).cloned())
        };

        Some((
            pick(&graph_email.tenant_id, directory.map(|d| &d.tenant_id))?,
            pick(&graph_email.client_id, directory.map(|d| &d.client_id))?,
            pick(&graph_email.client_secret, directory.map(|d| &d.client_secret))?,
        ))
    }

    /// Names of enabled channels, in dispatch order
    pub fn enabled_channels(&self) -> Vec<String> {
        let channels = &self.channels;
        let mut names = Vec::new();

        if channels.email.as_ref().is_some_and(|c| c.enabled) {
            names.push("email".to_string());
        }
        if channels.graph_email.as_ref().is_some_and(|c| c.enabled) {
            names.push("graph_email".to_string());
        }
        if channels.slack.as_ref().is_some_and(|c| c.enabled) {
            names.push("slack".to_string());
        }
        if channels.teams.as_ref().is_some_and(|c| c.enabled) {
            names.push("teams".to_string());
        }
        if channels.webhook.as_ref().is_some_and(|c| c.enabled) {
            names.push("webhook".to_string());
        }

        names
    }
}

fn fill_from<F>(slot: &mut String, lookup: &F, key: &str)
where
    F: Fn(&str) -> Option<String>,
{
    if slot.is_empty()
        && let Some(value) = lookup(key)
    {
        *slot = value;
    }
}
