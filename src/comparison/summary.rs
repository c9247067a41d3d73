use serde::{Deserialize, Serialize};

use super::{LogEntry, LogType};

/// Counts over a reconciled view, for the audit header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub common: usize,
    pub automatic: usize,
    pub manual: usize,
    pub other: usize,
    /// Visits with no exit time yet
    pub open: usize,
    /// Common rows dropped as duplicates of a newer row for the same vehicle
    pub duplicates_collapsed: usize,
}

impl ComparisonSummary {
    pub fn from_entries(raw: &[LogEntry], reconciled: &[LogEntry]) -> Self {
        let mut summary = Self {
            total: reconciled.len(),
            ..Self::default()
        };

        for entry in reconciled {
            match entry.log_type {
                LogType::Common => summary.common += 1,
                LogType::Automatic => summary.automatic += 1,
                LogType::Manual => summary.manual += 1,
                LogType::Other(_) => summary.other += 1,
            }
            if entry.is_open() {
                summary.open += 1;
            }
        }

        // Only meaningful when common rows made it through the filter
        if summary.common > 0 {
            let raw_common = raw
                .iter()
                .filter(|e| e.log_type == LogType::Common)
                .count();
            summary.duplicates_collapsed = raw_common.saturating_sub(summary.common);
        }

        summary
    }
}
