// Expiry thresholds

use crate::Result;
use crate::error::CredwatchError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Day-count boundaries separating the severity bands.
///
/// Must satisfy `critical_days <= warning_days <= info_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Thresholds {
    pub critical_days: u32,
    pub warning_days: u32,
    pub info_days: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical_days: 7,
            warning_days: 30,
            info_days: 90,
        }
    }
}

impl Thresholds {
    /// Create validated thresholds
    pub fn new(critical_days: u32, warning_days: u32, info_days: u32) -> Result<Self> {
        let thresholds = Self {
            critical_days,
            warning_days,
            info_days,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Check the band ordering
    pub fn validate(&self) -> Result<()> {
        if self.critical_days <= self.warning_days && self.warning_days <= self.info_days {
            Ok(())
        } else {
            Err(CredwatchError::config(format!(
                "thresholds must satisfy critical({}) <= warning({}) <= info({})",
                self.critical_days, self.warning_days, self.info_days
            )))
        }
    }
}
