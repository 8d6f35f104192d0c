// Check Expiring Credentials - one complete run

use crate::Result;
use crate::directory::CredentialDirectory;
use crate::error::CredwatchError;
use crate::monitor::analyzer::{ClassifiedCredential, ExpirationAnalyzer};
use crate::monitor::dispatch::{ChannelDelivery, DRY_RUN_REASON, NotificationDispatcher};
use crate::monitor::latest::LatestReport;
use crate::monitor::report::ExpirationReport;
use crate::monitor::status::ExpirationStatus;
use crate::monitor::thresholds::Thresholds;
use crate::monitor::types::Credential;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::ToSchema;
use uuid::Uuid;

/// A credential left out of the report because it could not be classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkippedCredential {
    pub credential_id: String,
    pub application_id: String,
    pub application_name: String,
    pub reason: String,
}

/// What one run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub report: Arc<ExpirationReport>,
    /// Empty when the report required no notification
    pub deliveries: Vec<ChannelDelivery>,
    pub skipped: Vec<SkippedCredential>,
    pub dry_run: bool,
}

impl RunOutcome {
    /// True unless some channel failed
    pub fn success(&self) -> bool {
        !self.deliveries.iter().any(|d| d.outcome.is_failed())
    }

    pub fn failed_channels(&self) -> Vec<&str> {
        self.deliveries
            .iter()
            .filter(|d| d.outcome.is_failed())
            .map(|d| d.channel.as_str())
            .collect()
    }
}

/// Classify a full inventory at `now`.
///
/// Credentials that fail classification are returned separately and never
/// abort the batch.
pub fn classify_all(
    analyzer: &ExpirationAnalyzer,
    credentials: &[Credential],
    now: DateTime<Utc>,
) -> (Vec<ClassifiedCredential>, Vec<SkippedCredential>) {
    let mut classified = Vec::with_capacity(credentials.len());
    let mut skipped = Vec::new();

    for credential in credentials {
        match analyzer.classify(credential, now) {
            Ok(c) => classified.push(c),
            Err(e) => {
                let reason = match e {
                    CredwatchError::DataIntegrity { reason, .. } => reason,
                    other => other.to_string(),
                };
                tracing::warn!(
                    credential_id = %credential.id,
                    application = %credential.application_name,
                    "Skipping credential: {}",
                    reason
                );
                skipped.push(SkippedCredential {
                    credential_id: credential.id.clone(),
                    application_id: credential.application_id.clone(),
                    application_name: credential.application_name.clone(),
                    reason,
                });
            }
        }
    }

    (classified, skipped)
}

/// The check-expiring-credentials use case.
///
/// Runs are serialized: a trigger arriving while another run is in flight
/// waits for it to finish and then performs its own run.
pub struct CheckExpiringCredentials {
    directory: Arc<dyn CredentialDirectory>,
    dispatcher: NotificationDispatcher,
    analyzer: ExpirationAnalyzer,
    dry_run: bool,
    latest: LatestReport,
    run_lock: Mutex<()>,
}

impl CheckExpiringCredentials {
    pub fn new(
        directory: Arc<dyn CredentialDirectory>,
        dispatcher: NotificationDispatcher,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            directory,
            dispatcher,
            analyzer: ExpirationAnalyzer::new(thresholds),
            dry_run: false,
            latest: LatestReport::new(),
            run_lock: Mutex::new(()),
        }
    }

    /// Analyse and publish but never deliver
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Publish into an existing slot
    pub fn with_latest(mut self, latest: LatestReport) -> Self {
        self.latest = latest;
        self
    }

    pub fn latest(&self) -> &LatestReport {
        &self.latest
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn thresholds(&self) -> Thresholds {
        self.analyzer.thresholds()
    }

    /// Run once against the current time
    pub async fn execute(&self) -> Result<RunOutcome> {
        let _guard = self.run_lock.lock().await;
        self.run(Utc::now()).await
    }

    /// Run once with a fixed `now`
    pub async fn execute_at(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let _guard = self.run_lock.lock().await;
        self.run(now).await
    }

    async fn run(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, directory = self.directory.name(), "Starting credential check");

        let credentials = self.directory.list_credentials().await.map_err(|e| {
            tracing::error!(%run_id, "Directory access failed: {}", e);
            match e {
                CredwatchError::DirectoryAccess { .. } => e,
                other => CredwatchError::directory(other.to_string()),
            }
        })?;

        let (classified, skipped) = classify_all(&self.analyzer, &credentials, now);
        let report = Arc::new(ExpirationReport::new(
            classified,
            self.analyzer.thresholds(),
            now,
        ));
        let stats = report.statistics();

        tracing::info!(
            %run_id,
            total = stats.total_credentials,
            expired = stats.expired_count,
            critical = stats.critical_count,
            warning = stats.warning_count,
            info = stats.info_count,
            skipped = skipped.len(),
            "{}",
            stats.summary()
        );

        // Readers see the new report before any channel is contacted
        self.latest.publish(report.clone());

        let deliveries = if !report.requires_notification() {
            tracing::info!(%run_id, "No notification required");
            Vec::new()
        } else if self.dry_run {
            self.log_dry_run(&report);
            self.dispatcher.skip_all(DRY_RUN_REASON)
        } else {
            self.dispatcher.dispatch(&report).await
        };

        let outcome = RunOutcome {
            run_id,
            report,
            deliveries,
            skipped,
            dry_run: self.dry_run,
        };

        if outcome.success() {
            tracing::info!(%run_id, "Credential check finished");
        } else {
            tracing::warn!(
                %run_id,
                "Credential check finished with failed channels: {}",
                outcome.failed_channels().join(", ")
            );
        }

        Ok(outcome)
    }

    fn log_dry_run(&self, report: &ExpirationReport) {
        let stats = report.statistics();
        tracing::info!("DRY RUN - notifications suppressed");
        tracing::info!("  Level: {}", report.notification_level());
        tracing::info!("  Summary: {}", stats.summary());
        tracing::info!("  Applications affected: {}", report.affected_applications());
        for status in ExpirationStatus::ALL.iter().rev() {
            tracing::info!("  {}: {}", status, stats.count_for(*status));
        }
        tracing::info!(
            "  Would notify: {}",
            self.dispatcher.channel_names().join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::types::CredentialType;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    struct StaticDirectory(Vec<Credential>);

    #[async_trait]
    impl CredentialDirectory for StaticDirectory {
        async fn list_credentials(&self) -> Result<Vec<Credential>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    struct BrokenDirectory;

    #[async_trait]
    impl CredentialDirectory for BrokenDirectory {
        async fn list_credentials(&self) -> Result<Vec<Credential>> {
            Err(CredwatchError::directory("401 Unauthorized"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn cred(id: &str, days: i64) -> Credential {
        Credential::new(id, CredentialType::Password, "app-1", "Billing API", now() + Duration::days(days))
    }

    #[test]
    fn test_classify_all_skips_missing_expiry() {
        let mut broken = cred("k2", 3);
        broken.expires_at = None;

        let analyzer = ExpirationAnalyzer::new(Thresholds::default());
        let (classified, skipped) = classify_all(&analyzer, &[cred("k1", 3), broken], now());

        assert_eq!(classified.len(), 1);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].credential_id, "k2");
        assert_eq!(skipped[0].reason, "missing expiry timestamp");
    }

    #[tokio::test]
    async fn test_directory_failure_publishes_nothing() {
        let use_case = CheckExpiringCredentials::new(
            Arc::new(BrokenDirectory),
            NotificationDispatcher::new(),
            Thresholds::default(),
        );

        let err = use_case.execute_at(now()).await.unwrap_err();
        assert!(matches!(err, CredwatchError::DirectoryAccess { .. }));
        assert!(use_case.latest().current().is_none());
    }

    #[tokio::test]
    async fn test_report_published_with_run() {
        let use_case = CheckExpiringCredentials::new(
            Arc::new(StaticDirectory(vec![cred("k1", 7)])),
            NotificationDispatcher::new(),
            Thresholds::default(),
        );

        let outcome = use_case.execute_at(now()).await.unwrap();
        assert!(outcome.success());
        assert!(outcome.deliveries.is_empty());

        let latest = use_case.latest().current().unwrap();
        assert!(Arc::ptr_eq(&latest, &outcome.report));
        assert_eq!(latest.statistics().critical_count, 1);
    }

    #[tokio::test]
    async fn test_previous_report_survives_failed_run() {
        let latest = LatestReport::new();
        let good = CheckExpiringCredentials::new(
            Arc::new(StaticDirectory(vec![cred("k1", 40)])),
            NotificationDispatcher::new(),
            Thresholds::default(),
        )
        .with_latest(latest.clone());
        good.execute_at(now()).await.unwrap();

        let bad = CheckExpiringCredentials::new(
            Arc::new(BrokenDirectory),
            NotificationDispatcher::new(),
            Thresholds::default(),
        )
        .with_latest(latest.clone());
        assert!(bad.execute_at(now()).await.is_err());

        assert_eq!(latest.current().unwrap().statistics().info_count, 1);
    }
}
