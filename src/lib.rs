// credwatch - Expiry monitoring for directory application credentials
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

//! credwatch inventories the client secrets and certificates attached to
//! application registrations in an identity directory, classifies each by
//! its remaining validity window and fans a consolidated report out to the
//! configured notification channels.

pub mod api;
pub mod cli;
pub mod directory;
pub mod error;
pub mod graph;
pub mod monitor;

// Re-export commonly used types
pub use crate::cli::{Args, RunMode};
pub use crate::error::CredwatchError;
pub use crate::monitor::{
    CheckExpiringCredentials, ExpirationReport, ExpirationStatus, MonitorConfig, Thresholds,
};

/// Result type for credwatch operations
pub type Result<T> = std::result::Result<T, CredwatchError>;
