// Credential expiry monitoring
//
// Classification engine, report aggregate, run orchestration and
// notification dispatch.

pub mod alerts;
pub mod analyzer;
pub mod check;
pub mod config;
pub mod daemon;
pub mod dispatch;
pub mod latest;
pub mod payload;
pub mod report;
pub mod scheduler;
pub mod status;
pub mod thresholds;
pub mod types;

pub use analyzer::{ClassifiedCredential, ExpirationAnalyzer};
pub use check::{CheckExpiringCredentials, RunOutcome, SkippedCredential};
pub use config::MonitorConfig;
pub use daemon::MonitorDaemon;
pub use dispatch::{ChannelDelivery, DeliveryOutcome, NotificationDispatcher};
pub use latest::LatestReport;
pub use report::{ExpirationReport, ReportStatistics};
pub use status::{ExpirationStatus, NotificationLevel};
pub use thresholds::Thresholds;
pub use types::{Credential, CredentialSource, CredentialType};
