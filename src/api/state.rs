// API State Management

use crate::api::config::ApiConfig;
use crate::monitor::check::CheckExpiringCredentials;
use crate::monitor::latest::LatestReport;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
pub struct AppState {
    /// API configuration
    pub config: Arc<ApiConfig>,

    /// Run orchestration, shared with the scheduler
    pub use_case: Arc<CheckExpiringCredentials>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ApiConfig, use_case: Arc<CheckExpiringCredentials>) -> Self {
        Self {
            config: Arc::new(config),
            use_case,
            start_time: Instant::now(),
        }
    }

    /// Latest published report slot
    pub fn latest(&self) -> &LatestReport {
        self.use_case.latest()
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
