// CLI module - Command line interface and argument parsing
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use crate::monitor::MonitorConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How the process drives the credential check
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Run one check and exit with its outcome
    #[default]
    Once,
    /// Run on the configured cron schedule until interrupted
    Scheduled,
    /// Serve the REST API and run the schedule in the background
    Serve,
}

/// credwatch - Expiry monitoring for directory application credentials
///
/// Values given on the command line override the configuration file, which
/// in turn overrides the built-in defaults.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
#[command(name = "credwatch")]
pub struct Args {
    /// Configuration file (TOML format)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Execution mode
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = RunMode::Once)]
    pub mode: RunMode,

    /// Analyse and publish the report without delivering notifications
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Override the cron schedule used by scheduled and serve modes
    #[arg(long = "schedule", value_name = "CRON")]
    pub schedule: Option<String>,

    // ============ REST API Server ============
    /// API server host address
    #[arg(long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// API server port
    #[arg(long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    // ============ Output and Diagnostics ============
    /// Log level (trace, debug, info, warn, error); falls back to RUST_LOG
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print the full report as JSON after a single run
    #[arg(long = "json")]
    pub json: bool,

    /// Send a connectivity test through every enabled channel and exit
    #[arg(long = "test-channels")]
    pub test_channels: bool,

    /// Write an example configuration file and exit
    #[arg(long = "config-example", value_name = "FILE")]
    pub config_example: Option<PathBuf>,
}

impl Args {
    /// Fold command-line overrides into a loaded configuration
    pub fn apply_overrides(&self, config: &mut MonitorConfig) {
        if self.dry_run {
            config.run.dry_run = true;
        }

        if let Some(schedule) = &self.schedule {
            config.run.schedule = schedule.clone();
        }

        if let Some(host) = &self.host {
            config.api.host = host.clone();
        }

        if let Some(port) = self.port {
            config.api.port = port;
        }
    }

    /// Reject flag combinations that make no sense together
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.json && self.mode != RunMode::Once {
            anyhow::bail!("--json is only supported with --mode once");
        }

        if self.test_channels && self.config_example.is_some() {
            anyhow::bail!("Cannot use --test-channels and --config-example together.");
        }

        Ok(())
    }
}
