// Severity classification

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Classification of one credential, ordered by severity ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExpirationStatus {
    Healthy,
    Info,
    Warning,
    Critical,
    Expired,
}

impl ExpirationStatus {
    /// All statuses, least severe first
    pub const ALL: [ExpirationStatus; 5] = [
        ExpirationStatus::Healthy,
        ExpirationStatus::Info,
        ExpirationStatus::Warning,
        ExpirationStatus::Critical,
        ExpirationStatus::Expired,
    ];

    /// Severity rank, 0 for healthy up to 4 for expired
    pub fn rank(&self) -> u8 {
        match self {
            ExpirationStatus::Healthy => 0,
            ExpirationStatus::Info => 1,
            ExpirationStatus::Warning => 2,
            ExpirationStatus::Critical => 3,
            ExpirationStatus::Expired => 4,
        }
    }

    /// Whether this status is reported to channels at all
    pub fn requires_attention(&self) -> bool {
        !matches!(self, ExpirationStatus::Healthy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpirationStatus::Healthy => "healthy",
            ExpirationStatus::Info => "info",
            ExpirationStatus::Warning => "warning",
            ExpirationStatus::Critical => "critical",
            ExpirationStatus::Expired => "expired",
        }
    }
}

impl PartialOrd for ExpirationStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExpirationStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for ExpirationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall alert level of a report: the worst non-healthy status, or none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    None,
    Info,
    Warning,
    Critical,
    Expired,
}

impl NotificationLevel {
    /// Level for the most severe status present
    pub fn from_worst(status: Option<ExpirationStatus>) -> Self {
        match status {
            None | Some(ExpirationStatus::Healthy) => NotificationLevel::None,
            Some(ExpirationStatus::Info) => NotificationLevel::Info,
            Some(ExpirationStatus::Warning) => NotificationLevel::Warning,
            Some(ExpirationStatus::Critical) => NotificationLevel::Critical,
            Some(ExpirationStatus::Expired) => NotificationLevel::Expired,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::None => "none",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Critical => "critical",
            NotificationLevel::Expired => "expired",
        }
    }

    /// Hex color used by rich channels
    pub fn color_hex(&self) -> &'static str {
        match self {
            NotificationLevel::Expired => "#dc3545",
            NotificationLevel::Critical => "#fd7e14",
            NotificationLevel::Warning => "#ffc107",
            NotificationLevel::Info => "#17a2b8",
            NotificationLevel::None => "#28a745",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            NotificationLevel::Expired => "🔴",
            NotificationLevel::Critical => "🟠",
            NotificationLevel::Warning => "🟡",
            NotificationLevel::Info => "🔵",
            NotificationLevel::None => "🟢",
        }
    }
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering_follows_rank() {
        let mut shuffled = vec![
            ExpirationStatus::Critical,
            ExpirationStatus::Healthy,
            ExpirationStatus::Expired,
            ExpirationStatus::Info,
            ExpirationStatus::Warning,
        ];
        shuffled.sort();
        assert_eq!(shuffled, ExpirationStatus::ALL.to_vec());
    }

    #[test]
    fn test_level_from_worst() {
        assert_eq!(NotificationLevel::from_worst(None), NotificationLevel::None);
        assert_eq!(
            NotificationLevel::from_worst(Some(ExpirationStatus::Healthy)),
            NotificationLevel::None
        );
        assert_eq!(
            NotificationLevel::from_worst(Some(ExpirationStatus::Critical)),
            NotificationLevel::Critical
        );
    }

    #[test]
    fn test_serialization_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&ExpirationStatus::Warning).unwrap(),
            "\"warning\""
        );
        assert_eq!(
            serde_json::to_string(&NotificationLevel::None).unwrap(),
            "\"none\""
        );
    }
}
