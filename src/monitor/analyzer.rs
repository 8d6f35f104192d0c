// Expiration Analyzer - classifies a credential against the thresholds

use crate::Result;
use crate::error::CredwatchError;
use crate::monitor::status::ExpirationStatus;
use crate::monitor::thresholds::Thresholds;
use crate::monitor::types::Credential;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// A credential together with its classification at a given instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedCredential {
    pub credential: Credential,
    pub status: ExpirationStatus,
    /// Whole days until expiry, floored; negative once expired
    pub days_until_expiry: i64,
    pub expires_at: DateTime<Utc>,
}

/// Pure classifier, holds nothing but the thresholds
#[derive(Debug, Clone, Copy)]
pub struct ExpirationAnalyzer {
    thresholds: Thresholds,
}

impl ExpirationAnalyzer {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Classify one credential at `now`.
    ///
    /// Fails with a data-integrity error when the credential has no expiry.
    pub fn classify(
        &self,
        credential: &Credential,
        now: DateTime<Utc>,
    ) -> Result<ClassifiedCredential> {
        let expires_at = credential
            .expires_at
            .ok_or_else(|| CredwatchError::DataIntegrity {
                credential_id: credential.id.clone(),
                application_id: credential.application_id.clone(),
                reason: "missing expiry timestamp".to_string(),
            })?;

        let days = days_until_expiry(expires_at, now);

        Ok(ClassifiedCredential {
            credential: credential.clone(),
            status: self.status_for_days(days),
            days_until_expiry: days,
            expires_at,
        })
    }

    /// Map a day count onto a band; each boundary belongs to the more severe band
    pub fn status_for_days(&self, days: i64) -> ExpirationStatus {
        let t = &self.thresholds;

        if days < 0 {
            ExpirationStatus::Expired
        } else if days <= i64::from(t.critical_days) {
            ExpirationStatus::Critical
        } else if days <= i64::from(t.warning_days) {
            ExpirationStatus::Warning
        } else if days <= i64::from(t.info_days) {
            ExpirationStatus::Info
        } else {
            ExpirationStatus::Healthy
        }
    }
}

/// `floor((expiry - now) / 1 day)`, so anything past expiry is at most -1
pub fn days_until_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}
