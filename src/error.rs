// Error types for credwatch
//
// Typed failures raised by the domain, the directory adapters and the
// notification channels. The run orchestration converts them into run
// outcomes; the HTTP layer maps them onto status codes.

use std::io;
use thiserror::Error;

/// Main error type for credwatch operations
#[derive(Debug, Error)]
pub enum CredwatchError {
    /// Inventory retrieval failed (authentication, authorization, transport or payload)
    #[error("Directory access failed: {message}")]
    DirectoryAccess { message: String },

    /// A credential record lacks a field required for classification
    #[error("Credential {credential_id} of application {application_id} is malformed: {reason}")]
    DataIntegrity {
        credential_id: String,
        application_id: String,
        reason: String,
    },

    /// Invalid configuration, detected before any run starts
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// One notification channel failed to deliver
    #[error("Delivery via {channel} failed: {message}")]
    ChannelDelivery { channel: String, message: String },

    /// Reqwest HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Email building or SMTP errors
    #[error("Email error: {0}")]
    Email(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl CredwatchError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        CredwatchError::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for a directory access error
    pub fn directory(message: impl Into<String>) -> Self {
        CredwatchError::DirectoryAccess {
            message: message.into(),
        }
    }

    /// Shorthand for a channel delivery error
    pub fn delivery(channel: &str, message: impl Into<String>) -> Self {
        CredwatchError::ChannelDelivery {
            channel: channel.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error aborts a whole run
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            CredwatchError::DirectoryAccess { .. } | CredwatchError::Configuration { .. }
        )
    }
}

/// Conversion from anyhow::Error for top-level glue code
impl From<anyhow::Error> for CredwatchError {
    fn from(err: anyhow::Error) -> Self {
        CredwatchError::Other(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CredwatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        CredwatchError::Other(format!("Task join error: {}", err))
    }
}

impl From<lettre::address::AddressError> for CredwatchError {
    fn from(err: lettre::address::AddressError) -> Self {
        CredwatchError::Email(format!("Email address error: {}", err))
    }
}

impl From<lettre::error::Error> for CredwatchError {
    fn from(err: lettre::error::Error) -> Self {
        CredwatchError::Email(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for CredwatchError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        CredwatchError::Email(format!("SMTP error: {}", err))
    }
}
