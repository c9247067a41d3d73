use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use super::{ComparisonSource, SourceError};
use crate::comparison::LogEntry;
use crate::types::LocationId;

/// Serves rows from a JSON export of the aggregation procedure's output.
/// Each exported row carries the `location_id` it was produced for.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    location_id: LocationId,
    #[serde(flatten)]
    entry: LogEntry,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ComparisonSource for SnapshotSource {
    async fn get_comparison_data(
        &self,
        location: &LocationId,
        date: Option<NaiveDate>,
    ) -> Result<Vec<LogEntry>, SourceError> {
        // Re-read every call so edits to the export are picked up
        let content = tokio::fs::read_to_string(&self.path).await?;
        let rows: Vec<SnapshotRow> =
            serde_json::from_str(&content).map_err(|e| SourceError::Decode(e.to_string()))?;

        let total = rows.len();
        let entries: Vec<LogEntry> = rows
            .into_iter()
            .filter(|row| row.location_id == *location)
            .filter(|row| date.is_none_or(|day| row.entry.entry_time.date_naive() == day))
            .map(|row| row.entry)
            .collect();

        tracing::debug!(
            "Snapshot {} matched {} of {} rows",
            self.path.display(),
            entries.len(),
            total
        );

        Ok(entries)
    }
}
