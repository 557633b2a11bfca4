//! Check period options.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often automatic version checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckPeriod {
    /// Manual checks only; the scheduler never fires.
    #[default]
    Manual,
    /// Every hour.
    Hourly,
    /// Every 24 hours.
    Daily,
    /// Every 7 days.
    Weekly,
    /// Every 30 days (fixed, not calendar-aware).
    Monthly,
}

impl CheckPeriod {
    /// Returns the period duration, or None for manual.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            CheckPeriod::Manual => None,
            CheckPeriod::Hourly => Some(Duration::from_secs(60 * 60)),
            CheckPeriod::Daily => Some(Duration::from_secs(24 * 60 * 60)),
            CheckPeriod::Weekly => Some(Duration::from_secs(7 * 24 * 60 * 60)),
            CheckPeriod::Monthly => Some(Duration::from_secs(30 * 24 * 60 * 60)),
        }
    }

    /// All available periods.
    pub fn all() -> &'static [CheckPeriod] {
        &[
            CheckPeriod::Manual,
            CheckPeriod::Hourly,
            CheckPeriod::Daily,
            CheckPeriod::Weekly,
            CheckPeriod::Monthly,
        ]
    }
}

impl std::fmt::Display for CheckPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckPeriod::Manual => write!(f, "manual"),
            CheckPeriod::Hourly => write!(f, "hourly"),
            CheckPeriod::Daily => write!(f, "daily"),
            CheckPeriod::Weekly => write!(f, "weekly"),
            CheckPeriod::Monthly => write!(f, "monthly"),
        }
    }
}
