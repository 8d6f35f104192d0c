// In-memory directory and channel doubles shared by the integration suites

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use credwatch::CredwatchError;
use credwatch::Result;
use credwatch::directory::CredentialDirectory;
use credwatch::monitor::alerts::NotificationChannel;
use credwatch::monitor::{Credential, CredentialType, ExpirationReport};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}

/// Password credential expiring `days` after [`fixed_now`]
pub fn expiring_in_days(app: &str, days: i64) -> Credential {
    Credential::new(
        format!("{}-{}", app, days),
        CredentialType::Password,
        app,
        format!("{} application", app),
        fixed_now() + Duration::days(days),
    )
}

/// Directory returning a fixed inventory
pub struct StaticDirectory {
    credentials: Vec<Credential>,
    delay: Option<std::time::Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl StaticDirectory {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self {
            credentials,
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Hold each listing for `delay` so overlapping runs become observable
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialDirectory for StaticDirectory {
    async fn list_credentials(&self) -> Result<Vec<Credential>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.credentials.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Directory that always fails
pub struct UnreachableDirectory;

#[async_trait]
impl CredentialDirectory for UnreachableDirectory {
    async fn list_credentials(&self) -> Result<Vec<Credential>> {
        Err(CredwatchError::directory("token request rejected"))
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

/// Channel recording every report it receives
#[derive(Clone)]
pub struct RecordingChannel {
    name: String,
    fail_with: Option<String>,
    received: Arc<Mutex<Vec<Arc<ExpirationReport>>>>,
}

impl RecordingChannel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail_with: None,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new(name)
        }
    }

    pub fn sends(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn last_report(&self) -> Option<Arc<ExpirationReport>> {
        self.received.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, report: &ExpirationReport) -> Result<()> {
        self.received
            .lock()
            .unwrap()
            .push(Arc::new(report.clone()));

        match &self.fail_with {
            Some(message) => Err(CredwatchError::delivery(&self.name, message.clone())),
            None => Ok(()),
        }
    }

    fn channel_name(&self) -> &str {
        &self.name
    }
}
