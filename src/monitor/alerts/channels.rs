// Notification Channel Trait

use crate::Result;
use crate::monitor::report::ExpirationReport;
use async_trait::async_trait;

/// Notification channel trait - implement this for custom delivery targets.
///
/// A channel receives the whole report and renders it in its own format.
/// Returning an error marks only this channel as failed for the run.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver a report through this channel
    async fn send(&self, report: &ExpirationReport) -> Result<()>;

    /// Get the channel name for logging and delivery outcomes
    fn channel_name(&self) -> &str;

    /// Whether the channel should be used at all
    fn is_enabled(&self) -> bool {
        true
    }

    /// Test the channel connectivity (optional)
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }
}
