// API Response Models

use crate::monitor::check::{RunOutcome, SkippedCredential};
use crate::monitor::dispatch::{ChannelDelivery, DeliveryOutcome};
use crate::monitor::payload::ReportPayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// API version
    pub version: String,

    /// Uptime in seconds
    pub uptime_seconds: u64,

    /// Server time
    pub timestamp: DateTime<Utc>,

    /// Generation time of the latest report, if any run has completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Outcome of one channel within a triggered run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryResponse {
    pub channel: String,

    /// sent, failed or skipped
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&ChannelDelivery> for DeliveryResponse {
    fn from(delivery: &ChannelDelivery) -> Self {
        let (status, reason) = match &delivery.outcome {
            DeliveryOutcome::Sent => ("sent", None),
            DeliveryOutcome::Failed(reason) => ("failed", Some(reason.clone())),
            DeliveryOutcome::Skipped(reason) => ("skipped", Some(reason.clone())),
        };

        Self {
            channel: delivery.channel.clone(),
            status: status.to_string(),
            reason,
        }
    }
}

/// Result of an on-demand check
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckResponse {
    pub run_id: String,

    /// False when any channel failed
    pub success: bool,

    pub dry_run: bool,

    pub report: ReportPayload,

    /// Per-channel results in configuration order
    pub deliveries: Vec<DeliveryResponse>,

    /// Credentials left out of the report
    pub skipped: Vec<SkippedCredential>,
}

impl From<&RunOutcome> for CheckResponse {
    fn from(outcome: &RunOutcome) -> Self {
        Self {
            run_id: outcome.run_id.to_string(),
            success: outcome.success(),
            dry_run: outcome.dry_run,
            report: ReportPayload::from(outcome.report.as_ref()),
            deliveries: outcome.deliveries.iter().map(DeliveryResponse::from).collect(),
            skipped: outcome.skipped.clone(),
        }
    }
}
