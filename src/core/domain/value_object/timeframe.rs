use crate::core::domain::error::{ProxmoxError, ValidationError};
use serde::Serialize;
use std::{fmt, str::FromStr};

/// Window of a historical (RRD) statistics query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Timeframe {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Hour => "hour",
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
        }
    }

    /// Bucket width in seconds, matching the RRD step Proxmox keeps per window.
    #[must_use]
    pub fn resolution_secs(&self) -> u64 {
        match self {
            Timeframe::Hour => 60,
            Timeframe::Day => 30 * 60,
            Timeframe::Week => 3 * 60 * 60,
            Timeframe::Month => 12 * 60 * 60,
            Timeframe::Year => 7 * 24 * 60 * 60,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ProxmoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(Timeframe::Hour),
            "day" => Ok(Timeframe::Day),
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            "year" => Ok(Timeframe::Year),
            other => Err(ProxmoxError::Validation(ValidationError::Field {
                field: "timeframe".to_string(),
                message: format!(
                    "Unknown timeframe '{}'. Use one of: hour, day, week, month, year",
                    other
                ),
            })),
        }
    }
}
