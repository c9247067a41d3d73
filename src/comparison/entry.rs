use core::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::EntryId;

/// Provenance tag assigned by the aggregation procedure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogType {
    Manual,
    Automatic,
    Common,
    /// Any tag outside the known three. Kept verbatim, never deduplicated.
    Other(String),
}

impl LogType {
    /// Display priority: common first, unknown tags last.
    pub fn priority(&self) -> u8 {
        match self {
            LogType::Common => 0,
            LogType::Automatic => 1,
            LogType::Manual => 2,
            LogType::Other(_) => 3,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LogType::Manual => "manual",
            LogType::Automatic => "automatic",
            LogType::Common => "common",
            LogType::Other(tag) => tag,
        }
    }
}

impl From<String> for LogType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "manual" => LogType::Manual,
            "automatic" => LogType::Automatic,
            "common" => LogType::Common,
            _ => LogType::Other(value),
        }
    }
}

impl From<LogType> for String {
    fn from(value: LogType) -> Self {
        match value {
            LogType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rows a comparison view should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogTypeFilter {
    #[default]
    All,
    Common,
    Manual,
    Automatic,
}

impl LogTypeFilter {
    pub fn matches(&self, log_type: &LogType) -> bool {
        match self {
            LogTypeFilter::All => true,
            LogTypeFilter::Common => *log_type == LogType::Common,
            LogTypeFilter::Manual => *log_type == LogType::Manual,
            LogTypeFilter::Automatic => *log_type == LogType::Automatic,
        }
    }

    /// Whether rows passing this filter can include common entries.
    pub fn admits_common(&self) -> bool {
        matches!(self, LogTypeFilter::All | LogTypeFilter::Common)
    }
}

impl fmt::Display for LogTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogTypeFilter::All => write!(f, "all"),
            LogTypeFilter::Common => write!(f, "common"),
            LogTypeFilter::Manual => write!(f, "manual"),
            LogTypeFilter::Automatic => write!(f, "automatic"),
        }
    }
}

impl FromStr for LogTypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(LogTypeFilter::All),
            "common" => Ok(LogTypeFilter::Common),
            "manual" => Ok(LogTypeFilter::Manual),
            "automatic" => Ok(LogTypeFilter::Automatic),
            other => Err(format!("unknown log type filter: {other}")),
        }
    }
}

/// A single observation of a vehicle entering or leaving a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: EntryId,
    pub vehicle_number: String,
    pub entry_time: DateTime<Utc>,
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,
    pub log_type: LogType,
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// A visit without an exit time is still open.
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }
}
