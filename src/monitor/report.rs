// Expiration Report - aggregate of one run

use crate::monitor::analyzer::ClassifiedCredential;
use crate::monitor::status::{ExpirationStatus, NotificationLevel};
use crate::monitor::thresholds::Thresholds;
use crate::monitor::types::CredentialSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

/// Counts derived from a classified-credential sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportStatistics {
    /// Distinct owning applications across all credentials
    pub total_applications: usize,
    pub total_credentials: usize,
    pub expired_count: usize,
    pub critical_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub healthy_count: usize,
}

impl ReportStatistics {
    /// Fold a sequence of classified credentials into counts
    pub fn from_classified<'a, I>(credentials: I) -> Self
    where
        I: IntoIterator<Item = &'a ClassifiedCredential>,
    {
        let mut stats = ReportStatistics::default();
        let mut applications = HashSet::new();

        for classified in credentials {
            applications.insert(classified.credential.application_id.as_str());
            stats.total_credentials += 1;
            match classified.status {
                ExpirationStatus::Expired => stats.expired_count += 1,
                ExpirationStatus::Critical => stats.critical_count += 1,
                ExpirationStatus::Warning => stats.warning_count += 1,
                ExpirationStatus::Info => stats.info_count += 1,
                ExpirationStatus::Healthy => stats.healthy_count += 1,
            }
        }

        stats.total_applications = applications.len();
        stats
    }

    /// Credentials in any non-healthy band
    pub fn attention_count(&self) -> usize {
        self.expired_count + self.critical_count + self.warning_count + self.info_count
    }

    pub fn count_for(&self, status: ExpirationStatus) -> usize {
        match status {
            ExpirationStatus::Expired => self.expired_count,
            ExpirationStatus::Critical => self.critical_count,
            ExpirationStatus::Warning => self.warning_count,
            ExpirationStatus::Info => self.info_count,
            ExpirationStatus::Healthy => self.healthy_count,
        }
    }

    /// Fixed-template sentence over the non-healthy buckets
    pub fn summary(&self) -> String {
        let attention = self.attention_count();
        if attention == 0 {
            return "No action required: all credentials are healthy".to_string();
        }

        let parts: Vec<String> = [
            ExpirationStatus::Expired,
            ExpirationStatus::Critical,
            ExpirationStatus::Warning,
            ExpirationStatus::Info,
        ]
        .iter()
        .filter_map(|status| match self.count_for(*status) {
            0 => None,
            n => Some(format!("{} {}", n, status)),
        })
        .collect();

        let noun = if attention == 1 {
            "credential"
        } else {
            "credentials"
        };
        format!(
            "{} {} requiring attention: {}",
            attention,
            noun,
            parts.join(", ")
        )
    }
}

/// Immutable result of one run: every classified credential, healthy included.
///
/// Statistics, level and summary are always recomputed from the credential
/// sequence; nothing derived is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationReport {
    generated_at: DateTime<Utc>,
    thresholds: Thresholds,
    credentials: Vec<ClassifiedCredential>,
}

impl ExpirationReport {
    /// Build a report from a complete classified sequence
    pub fn new(
        credentials: Vec<ClassifiedCredential>,
        thresholds: Thresholds,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            generated_at,
            thresholds,
            credentials,
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// All classified credentials in input order
    pub fn credentials(&self) -> &[ClassifiedCredential] {
        &self.credentials
    }

    pub fn statistics(&self) -> ReportStatistics {
        ReportStatistics::from_classified(&self.credentials)
    }

    /// Worst non-healthy status present, or none
    pub fn notification_level(&self) -> NotificationLevel {
        let worst = self
            .credentials
            .iter()
            .map(|c| c.status)
            .filter(ExpirationStatus::requires_attention)
            .max();
        NotificationLevel::from_worst(worst)
    }

    pub fn requires_notification(&self) -> bool {
        self.notification_level() != NotificationLevel::None
    }

    pub fn summary(&self) -> String {
        self.statistics().summary()
    }

    /// Non-healthy credentials in input order
    pub fn requiring_attention(&self) -> impl Iterator<Item = &ClassifiedCredential> {
        self.credentials
            .iter()
            .filter(|c| c.status.requires_attention())
    }

    /// Distinct applications owning at least one non-healthy credential
    pub fn affected_applications(&self) -> usize {
        self.requiring_attention()
            .map(|c| c.credential.application_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Most urgent first; ties keep input order
    pub fn sorted_by_urgency(&self) -> Vec<&ClassifiedCredential> {
        let mut sorted: Vec<&ClassifiedCredential> = self.credentials.iter().collect();
        sorted.sort_by_key(|c| c.days_until_expiry);
        sorted
    }

    pub fn by_source(&self, source: CredentialSource) -> Vec<&ClassifiedCredential> {
        self.credentials
            .iter()
            .filter(|c| c.credential.source == source)
            .collect()
    }

    pub fn source_statistics(&self, source: CredentialSource) -> ReportStatistics {
        ReportStatistics::from_classified(self.by_source(source))
    }

    pub fn source_summary(&self, source: CredentialSource) -> String {
        let stats = self.source_statistics(source);
        if stats.total_credentials == 0 {
            format!("No {} credentials", source.display_name())
        } else {
            stats.summary()
        }
    }
}
