// credwatch - Expiry monitoring for directory application credentials
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use credwatch::api::{ApiServer, AppState};
use credwatch::monitor::daemon::shutdown_signal;
use credwatch::monitor::payload::DetailedReportPayload;
use credwatch::monitor::scheduler::parse_schedule;
use credwatch::monitor::{
    CheckExpiringCredentials, MonitorDaemon, NotificationDispatcher, NotificationLevel, RunOutcome,
};
use credwatch::{Args, MonitorConfig, RunMode, directory};
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging - --log-level wins over RUST_LOG
    let log_level = args
        .log_level
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    args.validate()?;

    // Handle --config-example (generate example config and exit)
    if let Some(config_path) = &args.config_example {
        MonitorConfig::example().save_to_file(config_path)?;
        println!(
            "✓ Example configuration saved to: {}",
            config_path.display()
        );
        return Ok(());
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Configuration error:".red().bold(), e);
            std::process::exit(2);
        }
    };

    let directory = directory::from_config(&config.directory)?;
    let dispatcher = NotificationDispatcher::from_config(&config)?;
    let use_case = Arc::new(
        CheckExpiringCredentials::new(directory, dispatcher, config.thresholds)
            .with_dry_run(config.run.dry_run),
    );

    // Handle --test-channels
    if args.test_channels {
        info!("Testing notification channels...");
        let results = use_case.dispatcher().test_channels().await;

        println!("\nNotification Channel Tests:");
        println!("{}", "=".repeat(80));

        if results.is_empty() {
            println!("No notification channels enabled");
        }

        let mut all_ok = true;
        for (channel_name, result) in &results {
            match result {
                Ok(()) => println!("  {} {} - Success", "✓".green(), channel_name),
                Err(e) => {
                    all_ok = false;
                    println!("  {} {} - Failed: {}", "✗".red(), channel_name, e);
                }
            }
        }
        println!();

        if !all_ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    let schedule = parse_schedule(&config.run.schedule)?;

    match args.mode {
        RunMode::Once => {
            let outcome = match use_case.execute().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Credential check failed: {}", e);
                    eprintln!("{} {}", "Credential check failed:".red().bold(), e);
                    std::process::exit(1);
                }
            };

            if args.json {
                let payload = DetailedReportPayload::from(outcome.report.as_ref());
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_outcome(&outcome);
            }

            if !outcome.success() {
                std::process::exit(1);
            }
        }
        RunMode::Scheduled => {
            let daemon = MonitorDaemon::new(use_case, schedule, config.run.run_on_startup);
            daemon.start().await?;
        }
        RunMode::Serve => {
            info!("Starting credwatch in API server mode");

            let daemon = Arc::new(MonitorDaemon::new(
                Arc::clone(&use_case),
                schedule,
                config.run.run_on_startup,
            ));
            let background = {
                let daemon = Arc::clone(&daemon);
                tokio::spawn(async move { daemon.run_loop().await })
            };

            let state = Arc::new(AppState::new(config.api.clone(), use_case));
            let server_result = ApiServer::new(state).run(shutdown_signal()).await;

            daemon.stop();
            match background.await {
                Ok(Err(e)) => error!("Monitoring daemon failed: {}", e),
                Err(e) => error!("Monitoring daemon task panicked: {}", e),
                Ok(Ok(())) => {}
            }

            server_result?;
        }
    }

    Ok(())
}

/// Defaults, then the file, then environment secrets, then CLI overrides
fn load_config(args: &Args) -> Result<MonitorConfig> {
    let mut config = match &args.config {
        Some(path) => MonitorConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => MonitorConfig::default(),
    };

    config.apply_env();
    args.apply_overrides(&mut config);
    config.validate()?;

    Ok(config)
}

fn print_outcome(outcome: &RunOutcome) {
    let report = &outcome.report;
    let stats = report.statistics();
    let level = report.notification_level();

    let level_label = match level {
        NotificationLevel::Expired => level.as_str().red().bold(),
        NotificationLevel::Critical => level.as_str().red(),
        NotificationLevel::Warning => level.as_str().yellow(),
        NotificationLevel::Info => level.as_str().cyan(),
        NotificationLevel::None => level.as_str().green(),
    };

    println!("\n{}", "Credential Expiry Report".cyan().bold());
    println!("{}", "=".repeat(80));
    println!("Run:          {}", outcome.run_id);
    println!(
        "Generated:    {}",
        report.generated_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Level:        {}", level_label);
    println!("Summary:      {}", report.summary());
    println!(
        "Applications: {}   Credentials: {}",
        stats.total_applications, stats.total_credentials
    );
    println!(
        "Expired: {}   Critical: {}   Warning: {}   Info: {}   Healthy: {}",
        stats.expired_count,
        stats.critical_count,
        stats.warning_count,
        stats.info_count,
        stats.healthy_count
    );

    if !outcome.skipped.is_empty() {
        println!("\n{}", "Skipped credentials:".yellow());
        for skipped in &outcome.skipped {
            println!(
                "  • {} ({}) - {}",
                skipped.credential_id, skipped.application_name, skipped.reason
            );
        }
    }

    if outcome.deliveries.is_empty() {
        println!("\nNo notification required");
    } else {
        println!("\nDeliveries:");
        for delivery in &outcome.deliveries {
            let marker = if delivery.outcome.is_failed() {
                "✗".red()
            } else if delivery.outcome.is_sent() {
                "✓".green()
            } else {
                "-".yellow()
            };
            println!("  {} {} - {}", marker, delivery.channel, delivery.outcome);
        }
    }
    println!();
}
