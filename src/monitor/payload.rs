// Report payloads exposed at the REST and webhook boundaries

use crate::monitor::analyzer::ClassifiedCredential;
use crate::monitor::report::{ExpirationReport, ReportStatistics};
use crate::monitor::status::{ExpirationStatus, NotificationLevel};
use crate::monitor::thresholds::Thresholds;
use crate::monitor::types::{CredentialSource, CredentialType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Summary-only view of a report. Never carries credential details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportPayload {
    pub generated_at: DateTime<Utc>,
    pub notification_level: NotificationLevel,
    pub summary: String,
    pub statistics: ReportStatistics,
    pub thresholds: Thresholds,
    pub requires_notification: bool,
}

impl From<&ExpirationReport> for ReportPayload {
    fn from(report: &ExpirationReport) -> Self {
        let statistics = report.statistics();
        let notification_level = report.notification_level();

        Self {
            generated_at: report.generated_at(),
            notification_level,
            summary: statistics.summary(),
            statistics,
            thresholds: report.thresholds(),
            requires_notification: notification_level != NotificationLevel::None,
        }
    }
}

/// One non-healthy credential as sent to webhook-style channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDetail {
    pub application_id: String,
    pub application_name: String,
    pub credential_id: String,
    pub credential_type: CredentialType,
    pub display_name: Option<String>,
    pub expiry_date: DateTime<Utc>,
    pub days_until_expiry: i64,
    pub status: ExpirationStatus,
    pub source: CredentialSource,
    pub portal_url: String,
}

impl From<&ClassifiedCredential> for CredentialDetail {
    fn from(classified: &ClassifiedCredential) -> Self {
        let cred = &classified.credential;
        Self {
            application_id: cred.application_id.clone(),
            application_name: cred.application_name.clone(),
            credential_id: cred.id.clone(),
            credential_type: cred.credential_type,
            display_name: cred.display_name.clone(),
            expiry_date: classified.expires_at,
            days_until_expiry: classified.days_until_expiry,
            status: classified.status,
            source: cred.source,
            portal_url: cred.portal_url(),
        }
    }
}

/// Summary plus the non-healthy credentials, most urgent first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedReportPayload {
    #[serde(flatten)]
    pub report: ReportPayload,
    pub credentials: Vec<CredentialDetail>,
}

impl From<&ExpirationReport> for DetailedReportPayload {
    fn from(report: &ExpirationReport) -> Self {
        let credentials = report
            .sorted_by_urgency()
            .into_iter()
            .filter(|c| c.status.requires_attention())
            .map(CredentialDetail::from)
            .collect();

        Self {
            report: ReportPayload::from(report),
            credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::analyzer::ExpirationAnalyzer;
    use crate::monitor::types::Credential;
    use chrono::{Duration, TimeZone};

    fn sample_report() -> ExpirationReport {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let analyzer = ExpirationAnalyzer::new(Thresholds::default());
        let classified = [(-5, "a"), (10, "b"), (120, "c")]
            .iter()
            .map(|(days, app)| {
                let cred = Credential::new(
                    format!("key-{}", app),
                    CredentialType::Password,
                    *app,
                    "App",
                    now + Duration::days(*days),
                );
                analyzer.classify(&cred, now).unwrap()
            })
            .collect();
        ExpirationReport::new(classified, Thresholds::default(), now)
    }

    #[test]
    fn test_summary_payload_shape() {
        let payload = ReportPayload::from(&sample_report());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["notification_level"], "expired");
        assert_eq!(json["requires_notification"], true);
        assert_eq!(json["statistics"]["total_credentials"], 3);
        assert_eq!(json["statistics"]["info_count"], 0);
        assert_eq!(json["thresholds"]["critical_days"], 7);
        assert!(json.get("credentials").is_none());
    }

    #[test]
    fn test_detailed_payload_lists_only_non_healthy() {
        let payload = DetailedReportPayload::from(&sample_report());
        assert_eq!(payload.credentials.len(), 2);
        assert_eq!(payload.credentials[0].status, ExpirationStatus::Expired);
        assert_eq!(payload.credentials[1].days_until_expiry, 10);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["summary"], payload.report.summary);
        assert_eq!(json["credentials"][0]["credential_id"], "key-a");
    }
}
