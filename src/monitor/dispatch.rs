// Notification Dispatch - fan a report out to every enabled channel

use crate::Result;
use crate::error::CredwatchError;
use crate::monitor::alerts::{self, NotificationChannel};
use crate::monitor::config::MonitorConfig;
use crate::monitor::report::ExpirationReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DRY_RUN_REASON: &str = "dry run";

/// Upper bound on one channel's delivery, on top of its own transport timeouts
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(120);

/// Result of one delivery attempt on one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Failed(String),
    Skipped(String),
}

impl DeliveryOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, DeliveryOutcome::Failed(_))
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent)
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Sent => write!(f, "sent"),
            DeliveryOutcome::Failed(reason) => write!(f, "failed ({})", reason),
            DeliveryOutcome::Skipped(reason) => write!(f, "skipped ({})", reason),
        }
    }
}

/// One entry of the ordered channel -> outcome mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDelivery {
    pub channel: String,
    pub outcome: DeliveryOutcome,
}

/// Dispatcher - coordinates multiple notification channels.
///
/// Every channel gets exactly one attempt per report. Channels run
/// concurrently, each on its own task, and the dispatcher waits for all of
/// them. An error, a timeout or a panic is recorded against its channel only.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Override the per-channel delivery bound
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Create from configuration
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        let mut dispatcher = Self::new();
        for channel in alerts::build_channels(config)? {
            dispatcher.add_channel(channel);
        }
        Ok(dispatcher)
    }

    /// Add a notification channel; disabled channels are ignored
    pub fn add_channel(&mut self, channel: Box<dyn NotificationChannel>) {
        if channel.is_enabled() {
            self.channels.push(Arc::from(channel));
        } else {
            tracing::debug!("Channel {} is disabled, not registering", channel.channel_name());
        }
    }

    /// Get channel count
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Registered channel names, in dispatch order
    pub fn channel_names(&self) -> Vec<String> {
        self.channels
            .iter()
            .map(|c| c.channel_name().to_string())
            .collect()
    }

    /// Send the report through all channels and collect every outcome
    pub async fn dispatch(&self, report: &ExpirationReport) -> Vec<ChannelDelivery> {
        let report = Arc::new(report.clone());
        let send_timeout = self.send_timeout;

        let tasks = self.channels.iter().map(|channel| {
            let name = channel.channel_name().to_string();
            let channel = Arc::clone(channel);
            let report = Arc::clone(&report);

            let handle = tokio::spawn(async move {
                tokio::time::timeout(send_timeout, channel.send(&report)).await
            });

            async move {
                let outcome = match handle.await {
                    Ok(Ok(Ok(()))) => {
                        tracing::info!(channel = %name, "Report delivered");
                        DeliveryOutcome::Sent
                    }
                    Ok(Ok(Err(e))) => {
                        tracing::error!(channel = %name, "Delivery failed: {}", e);
                        DeliveryOutcome::Failed(e.to_string())
                    }
                    Ok(Err(_)) => {
                        tracing::error!(
                            channel = %name,
                            "Delivery timed out after {:?}",
                            send_timeout
                        );
                        DeliveryOutcome::Failed(format!("timed out after {:?}", send_timeout))
                    }
                    Err(join_error) => {
                        let e = CredwatchError::from(join_error);
                        tracing::error!(channel = %name, "Delivery task failed: {}", e);
                        DeliveryOutcome::Failed(e.to_string())
                    }
                };

                ChannelDelivery {
                    channel: name,
                    outcome,
                }
            }
        });

        // join_all preserves input order
        futures::future::join_all(tasks).await
    }

    /// Outcome set for a run whose delivery is suppressed
    pub fn skip_all(&self, reason: &str) -> Vec<ChannelDelivery> {
        self.channels
            .iter()
            .map(|channel| ChannelDelivery {
                channel: channel.channel_name().to_string(),
                outcome: DeliveryOutcome::Skipped(reason.to_string()),
            })
            .collect()
    }

    /// Test all channels
    pub async fn test_channels(&self) -> Vec<(String, Result<()>)> {
        let send_timeout = self.send_timeout;
        let tasks = self.channels.iter().map(|channel| async move {
            let result = tokio::time::timeout(send_timeout, channel.test_connection())
                .await
                .unwrap_or_else(|_| {
                    Err(CredwatchError::delivery(
                        channel.channel_name(),
                        format!("timed out after {:?}", send_timeout),
                    ))
                });
            (channel.channel_name().to_string(), result)
        });

        futures::future::join_all(tasks).await
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::alerts::test_support::sample_report;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeChannel {
        name: &'static str,
        enabled: bool,
        fail: bool,
        delay_ms: u64,
        calls: Arc<AtomicUsize>,
    }

    impl FakeChannel {
        fn boxed(name: &'static str, fail: bool, calls: &Arc<AtomicUsize>) -> Box<Self> {
            Box::new(Self {
                name,
                enabled: true,
                fail,
                delay_ms: 0,
                calls: calls.clone(),
            })
        }
    }

    #[async_trait]
    impl NotificationChannel for FakeChannel {
        async fn send(&self, _report: &ExpirationReport) -> Result<()> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(CredwatchError::delivery(self.name, "connection refused"))
            } else {
                Ok(())
            }
        }

        fn channel_name(&self) -> &str {
            self.name
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_channel() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = NotificationDispatcher::new();
        dispatcher.add_channel(FakeChannel::boxed("a", true, &calls));
        dispatcher.add_channel(FakeChannel::boxed("b", false, &calls));

        let outcomes = dispatcher.dispatch(&sample_report()).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcomes[0].channel, "a");
        assert!(outcomes[0].outcome.is_failed());
        assert_eq!(outcomes[1].channel, "b");
        assert_eq!(outcomes[1].outcome, DeliveryOutcome::Sent);
    }

    struct StuckChannel;

    #[async_trait]
    impl NotificationChannel for StuckChannel {
        async fn send(&self, _report: &ExpirationReport) -> Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }

        fn channel_name(&self) -> &str {
            "stuck"
        }
    }

    struct PanickingChannel;

    #[async_trait]
    impl NotificationChannel for PanickingChannel {
        async fn send(&self, _report: &ExpirationReport) -> Result<()> {
            panic!("formatter bug");
        }

        fn channel_name(&self) -> &str {
            "panicky"
        }
    }

    #[tokio::test]
    async fn test_stuck_channel_times_out_without_blocking_others() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher =
            NotificationDispatcher::new().with_send_timeout(Duration::from_millis(100));
        dispatcher.add_channel(Box::new(StuckChannel));
        dispatcher.add_channel(FakeChannel::boxed("b", false, &calls));

        let outcomes = tokio::time::timeout(
            Duration::from_secs(5),
            dispatcher.dispatch(&sample_report()),
        )
        .await
        .expect("dispatch must finish");

        assert_eq!(outcomes[0].channel, "stuck");
        assert_eq!(
            outcomes[0].outcome,
            DeliveryOutcome::Failed("timed out after 100ms".to_string())
        );
        assert_eq!(outcomes[1].outcome, DeliveryOutcome::Sent);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_channel_is_recorded_as_failed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = NotificationDispatcher::new();
        dispatcher.add_channel(Box::new(PanickingChannel));
        dispatcher.add_channel(FakeChannel::boxed("b", false, &calls));

        let outcomes = dispatcher.dispatch(&sample_report()).await;

        assert_eq!(outcomes[0].channel, "panicky");
        assert!(outcomes[0].outcome.is_failed());
        assert_eq!(outcomes[1].outcome, DeliveryOutcome::Sent);
    }

    #[tokio::test]
    async fn test_outcomes_keep_registration_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = NotificationDispatcher::new();
        let mut slow = FakeChannel::boxed("slow", false, &calls);
        slow.delay_ms = 50;
        dispatcher.add_channel(slow);
        dispatcher.add_channel(FakeChannel::boxed("fast", false, &calls));

        let outcomes = dispatcher.dispatch(&sample_report()).await;
        let names: Vec<_> = outcomes.iter().map(|d| d.channel.as_str()).collect();
        assert_eq!(names, vec!["slow", "fast"]);
    }

    #[test]
    fn test_disabled_channel_not_registered() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = NotificationDispatcher::new();
        let mut disabled = FakeChannel::boxed("off", false, &calls);
        disabled.enabled = false;
        dispatcher.add_channel(disabled);

        assert_eq!(dispatcher.channel_count(), 0);
    }

    #[test]
    fn test_skip_all() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = NotificationDispatcher::new();
        dispatcher.add_channel(FakeChannel::boxed("a", false, &calls));
        dispatcher.add_channel(FakeChannel::boxed("b", false, &calls));

        let outcomes = dispatcher.skip_all(DRY_RUN_REASON);
        assert_eq!(outcomes.len(), 2);
        assert!(
            outcomes
                .iter()
                .all(|d| d.outcome == DeliveryOutcome::Skipped("dry run".to_string()))
        );
        assert_eq!(outcomes[0].outcome.to_string(), "skipped (dry run)");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(DeliveryOutcome::Failed("timeout".to_string())).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "timeout");

        let sent = serde_json::to_value(DeliveryOutcome::Sent).unwrap();
        assert_eq!(sent["status"], "sent");
    }

    #[test]
    fn test_from_config_without_channels() {
        let dispatcher = NotificationDispatcher::from_config(&MonitorConfig::default()).unwrap();
        assert_eq!(dispatcher.channel_count(), 0);
        assert!(dispatcher.channel_names().is_empty());
    }
}
