// Latest report - process-wide single slot

use crate::monitor::report::ExpirationReport;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

/// Most recently published report.
///
/// Empty until the first successful run, then replaced wholesale. Readers
/// clone the `Arc` and never observe a partially built report.
#[derive(Debug, Clone)]
pub struct LatestReport {
    slot: Arc<watch::Sender<Option<Arc<ExpirationReport>>>>,
}

impl LatestReport {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { slot: Arc::new(tx) }
    }

    /// Replace the current report
    pub fn publish(&self, report: Arc<ExpirationReport>) {
        self.slot.send_replace(Some(report));
    }

    /// Snapshot of the current report, if any run has completed
    pub fn current(&self) -> Option<Arc<ExpirationReport>> {
        self.slot.borrow().clone()
    }

    /// Generation time of the current report
    pub fn last_run_at(&self) -> Option<DateTime<Utc>> {
        self.slot.borrow().as_ref().map(|r| r.generated_at())
    }
}

impl Default for LatestReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::thresholds::Thresholds;
    use chrono::TimeZone;

    fn empty_report(hour: u32) -> Arc<ExpirationReport> {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap();
        Arc::new(ExpirationReport::new(Vec::new(), Thresholds::default(), at))
    }

    #[test]
    fn test_empty_before_first_publish() {
        let latest = LatestReport::new();
        assert!(latest.current().is_none());
        assert!(latest.last_run_at().is_none());
    }

    #[test]
    fn test_publish_replaces_wholesale() {
        let latest = LatestReport::new();
        let first = empty_report(8);
        latest.publish(first.clone());

        let snapshot = latest.current().unwrap();
        latest.publish(empty_report(9));

        // Earlier snapshots stay intact
        assert!(Arc::ptr_eq(&snapshot, &first));
        assert_eq!(latest.last_run_at().unwrap().format("%H").to_string(), "09");
    }

    #[test]
    fn test_clones_share_the_slot() {
        let latest = LatestReport::new();
        let reader = latest.clone();
        latest.publish(empty_report(11));
        assert!(reader.current().is_some());
    }
}
