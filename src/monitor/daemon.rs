// Monitoring Daemon - scheduled runs until shutdown

use crate::Result;
use crate::monitor::check::{CheckExpiringCredentials, RunOutcome};
use crate::monitor::scheduler::next_run_after;
use chrono::Utc;
use cron::Schedule;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Scheduled runner
pub struct MonitorDaemon {
    use_case: Arc<CheckExpiringCredentials>,
    schedule: Schedule,
    run_on_startup: bool,
    running: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
}

impl MonitorDaemon {
    /// Create new monitoring daemon
    pub fn new(
        use_case: Arc<CheckExpiringCredentials>,
        schedule: Schedule,
        run_on_startup: bool,
    ) -> Self {
        Self {
            use_case,
            schedule,
            run_on_startup,
            running: Arc::new(AtomicBool::new(true)),
            stop_notify: Arc::new(Notify::new()),
        }
    }

    /// Start the daemon and stop on SIGINT/SIGTERM
    pub async fn start(&self) -> Result<()> {
        self.setup_signal_handlers();
        self.run_loop().await
    }

    /// Scheduling loop without signal handling
    pub async fn run_loop(&self) -> Result<()> {
        tracing::info!("Starting credential monitoring daemon");
        tracing::info!(
            "Notification channels: {}",
            self.use_case.dispatcher().channel_names().join(", ")
        );

        if self.run_on_startup && self.is_running() {
            self.run_once().await;
        }

        while self.is_running() {
            let now = Utc::now();
            let Some(next) = next_run_after(&self.schedule, now) else {
                tracing::warn!("Schedule has no future fire time, stopping");
                break;
            };

            tracing::info!("Next check at {}", next.format("%Y-%m-%d %H:%M:%S UTC"));
            let wait = (next - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if self.is_running() {
                        self.run_once().await;
                    }
                }
                _ = self.stop_notify.notified() => {}
            }
        }

        tracing::info!("Monitoring daemon stopped");
        Ok(())
    }

    /// Run one check, logging instead of propagating failures
    pub async fn run_once(&self) -> Option<RunOutcome> {
        match self.use_case.execute().await {
            Ok(outcome) => {
                for delivery in &outcome.deliveries {
                    tracing::info!("  {}: {}", delivery.channel, delivery.outcome);
                }
                Some(outcome)
            }
            Err(e) => {
                tracing::error!("Credential check failed: {}", e);
                None
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the daemon
    pub fn stop(&self) {
        tracing::info!("Stopping monitoring daemon...");
        self.running.store(false, Ordering::SeqCst);
        self.stop_notify.notify_one();
    }

    /// Setup signal handlers for graceful shutdown
    fn setup_signal_handlers(&self) {
        let running = Arc::clone(&self.running);
        let stop_notify = Arc::clone(&self.stop_notify);

        tokio::spawn(async move {
            shutdown_signal().await;
            running.store(false, Ordering::SeqCst);
            stop_notify.notify_one();
        });
    }
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to setup SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
