use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notice::NoticeFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeLevel::Info => write!(f, "info"),
            NoticeLevel::Warning => write!(f, "warning"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}

/// A user-facing message, the equivalent of a dashboard toast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: usize,
    pub timestamp: DateTime<Utc>,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn filter(&self, filter: &NoticeFilter) -> bool {
        if let Some(level) = filter.level
            && self.level != level
        {
            return false;
        }
        if let Some(ref after) = filter.after
            && self.timestamp <= *after
        {
            return false;
        }
        if let Some(ref before) = filter.before
            && self.timestamp >= *before
        {
            return false;
        }

        if let Some(ref keyword) = filter.keyword {
            if let Ok(re) = regex::Regex::new(keyword) {
                if !re.is_match(&self.message) {
                    return false;
                }
            } else if !self.message.contains(keyword.as_str()) {
                // Invalid regex, treat as literal text
                return false;
            }
        }

        true
    }
}
