//! I/O shell around the pure reconciliation transform: fetches rows from a
//! [`ComparisonSource`], reconciles them and keeps the latest committed view.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::comparison::{
    ComparisonSummary, LogEntry, LogTypeFilter, ReconcileOptions, reconcile_with,
};
use crate::source::{ComparisonSource, SourceError};
use crate::types::{LocationId, parse_filter_date};

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("no location selected")]
    NoLocation,

    #[error("invalid date filter '{input}': {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("failed to fetch comparison data: {0}")]
    Fetch(#[source] SourceError),

    #[error("unexpected error: {0}")]
    Unexpected(String),

    #[error("no comparison has been loaded yet")]
    NoQuery,
}

impl ComparisonError {
    /// Generic text safe to show an operator. Details stay in the logs.
    pub fn notice(&self) -> &'static str {
        match self {
            Self::NoLocation => "No location selected",
            Self::InvalidDate { .. } => "Invalid date, use YYYY-MM-DD",
            Self::Fetch(_) => "Failed to fetch comparison data",
            Self::Unexpected(_) => "An unexpected error occurred",
            Self::NoQuery => "Nothing to refresh yet",
        }
    }

    /// Caller-side mistakes, as opposed to failures of the fetch itself.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NoLocation | Self::InvalidDate { .. } | Self::NoQuery
        )
    }
}

impl From<SourceError> for ComparisonError {
    fn from(e: SourceError) -> Self {
        if e.is_decode() {
            Self::Unexpected(e.to_string())
        } else {
            Self::Fetch(e)
        }
    }
}

/// What the operator asked to see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonQuery {
    pub location_id: LocationId,
    /// `YYYY-MM-DD`, or empty for all dates
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub log_type: LogTypeFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonView {
    pub query: ComparisonQuery,
    pub entries: Vec<LogEntry>,
    pub summary: ComparisonSummary,
    pub fetched_at: DateTime<Utc>,
    pub epoch: u64,
}

/// Counts a load as in flight for as long as it is alive.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ComparisonService<S> {
    source: Arc<S>,
    options: ReconcileOptions,
    current: Arc<RwLock<Option<ComparisonView>>>,
    last_query: Arc<RwLock<Option<ComparisonQuery>>>,
    epoch: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
}

impl<S> Clone for ComparisonService<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            options: self.options,
            current: self.current.clone(),
            last_query: self.last_query.clone(),
            epoch: self.epoch.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<S: ComparisonSource> ComparisonService<S> {
    pub fn new(source: S, options: ReconcileOptions) -> Self {
        Self {
            source: Arc::new(source),
            options,
            current: Arc::new(RwLock::new(None)),
            last_query: Arc::new(RwLock::new(None)),
            epoch: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn check_query(
        location: &LocationId,
        date: &str,
    ) -> Result<Option<NaiveDate>, ComparisonError> {
        if location.is_blank() {
            return Err(ComparisonError::NoLocation);
        }
        parse_filter_date(date).map_err(|source| ComparisonError::InvalidDate {
            input: date.to_string(),
            source,
        })
    }

    async fn fetch_rows(
        &self,
        location: &LocationId,
        day: Option<NaiveDate>,
    ) -> Result<Vec<LogEntry>, ComparisonError> {
        match self.source.get_comparison_data(location, day).await {
            Ok(rows) => {
                tracing::info!(
                    "Fetched {} comparison rows for location {location} ({})",
                    rows.len(),
                    day.map(|d| d.to_string())
                        .unwrap_or_else(|| "all dates".to_string())
                );
                Ok(rows)
            }
            Err(e) => {
                tracing::error!("Comparison fetch failed for location {location}: {e}");
                Err(e.into())
            }
        }
    }

    /// Raw rows for a location and optional day, unreconciled.
    pub async fn fetch(
        &self,
        location: &LocationId,
        date: &str,
    ) -> Result<Vec<LogEntry>, ComparisonError> {
        let day = Self::check_query(location, date)?;
        self.fetch_rows(location, day).await
    }

    /// Fetch and reconcile. The result becomes the current view unless a
    /// newer load started in the meantime; on failure the current view is
    /// left as it was.
    pub async fn load(&self, query: ComparisonQuery) -> Result<ComparisonView, ComparisonError> {
        let day = Self::check_query(&query.location_id, &query.date)?;
        // Only accepted queries become the refresh target
        *self.last_query.write().await = Some(query.clone());

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = LoadingGuard::new(&self.in_flight);

        let raw = self.fetch_rows(&query.location_id, day).await?;
        let entries = reconcile_with(&raw, query.log_type, &self.options);
        let summary = ComparisonSummary::from_entries(&raw, &entries);

        let view = ComparisonView {
            query,
            entries,
            summary,
            fetched_at: Utc::now(),
            epoch,
        };

        let mut current = self.current.write().await;
        if self.epoch.load(Ordering::SeqCst) == epoch {
            *current = Some(view.clone());
        } else {
            tracing::debug!("Discarding superseded comparison load #{epoch}");
        }

        Ok(view)
    }

    /// Re-run the most recent query.
    pub async fn refresh(&self) -> Result<ComparisonView, ComparisonError> {
        let query = self
            .last_query
            .read()
            .await
            .clone()
            .ok_or(ComparisonError::NoQuery)?;
        tracing::info!("Refreshing comparison for location {}", query.location_id);
        self.load(query).await
    }

    pub async fn current(&self) -> Option<ComparisonView> {
        self.current.read().await.clone()
    }

    pub async fn last_query(&self) -> Option<ComparisonQuery> {
        self.last_query.read().await.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::LogType;
    use crate::types::EntryId;
    use chrono::TimeZone;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted source: fails when asked, sleeps for the "slow" location.
    struct MockSource {
        rows: Vec<LogEntry>,
        fail: Mutex<Option<SourceError>>,
        calls: AtomicUsize,
    }

    impl MockSource {
        fn new(rows: Vec<LogEntry>) -> Self {
            Self {
                rows,
                fail: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        fn fail_next(&self, e: SourceError) {
            *self.fail.lock().unwrap() = Some(e);
        }
    }

    impl ComparisonSource for MockSource {
        async fn get_comparison_data(
            &self,
            location: &LocationId,
            _date: Option<NaiveDate>,
        ) -> Result<Vec<LogEntry>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if location.as_str() == "slow" {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            let failure = self.fail.lock().unwrap().take();
            if let Some(e) = failure {
                return Err(e);
            }
            Ok(self.rows.clone())
        }
    }

    fn entry(id: &str, plate: &str, log_type: LogType, hour: u32) -> LogEntry {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
        LogEntry {
            id: EntryId::new(id),
            vehicle_number: plate.to_string(),
            entry_time: created_at,
            exit_time: None,
            log_type,
            created_at,
        }
    }

    fn rows() -> Vec<LogEntry> {
        vec![
            entry("c1", "KA01AB1234", LogType::Common, 10),
            entry("c2", "KA01AB1234", LogType::Common, 12),
            entry("m1", "KA01AB1234", LogType::Manual, 9),
            entry("a1", "KA01AB1234", LogType::Automatic, 11),
        ]
    }

    fn query(location: &str) -> ComparisonQuery {
        ComparisonQuery {
            location_id: LocationId::new(location),
            date: String::new(),
            log_type: LogTypeFilter::All,
        }
    }

    fn service() -> ComparisonService<MockSource> {
        ComparisonService::new(MockSource::new(rows()), ReconcileOptions::default())
    }

    #[tokio::test]
    async fn test_load_reconciles_and_commits() {
        let service = service();
        let view = service.load(query("loc-1")).await.unwrap();

        let ids: Vec<&str> = view.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "a1", "m1"]);
        assert_eq!(view.summary.duplicates_collapsed, 1);
        assert_eq!(service.current().await.unwrap().epoch, view.epoch);
        assert!(!service.is_loading());
    }

    #[tokio::test]
    async fn test_blank_location_skips_fetch() {
        let service = service();
        let err = service.load(query("")).await.unwrap_err();

        assert!(matches!(err, ComparisonError::NoLocation));
        assert_eq!(err.notice(), "No location selected");
        assert_eq!(service.source.calls.load(Ordering::SeqCst), 0);
        assert!(service.current().await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_date_skips_fetch() {
        let service = service();
        let err = service
            .fetch(&LocationId::new("loc-1"), "2024/01/01")
            .await
            .unwrap_err();

        assert!(matches!(err, ComparisonError::InvalidDate { .. }));
        assert_eq!(service.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_view() {
        let service = service();
        let first = service.load(query("loc-1")).await.unwrap();

        service
            .source
            .fail_next(SourceError::Transport("connection reset".to_string()));
        let err = service.load(query("loc-1")).await.unwrap_err();

        assert_eq!(err.notice(), "Failed to fetch comparison data");
        assert!(!err.is_precondition());
        let current = service.current().await.unwrap();
        assert_eq!(current.epoch, first.epoch);
        // Exactly one call per attempt, no retry
        assert_eq!(service.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_decode_failure_is_unexpected() {
        let service = service();
        service
            .source
            .fail_next(SourceError::Decode("missing field `log_type`".to_string()));

        let err = service.load(query("loc-1")).await.unwrap_err();
        assert!(matches!(err, ComparisonError::Unexpected(_)));
        assert_eq!(err.notice(), "An unexpected error occurred");
    }

    #[tokio::test]
    async fn test_refresh_reruns_last_query() {
        let service = service();
        assert!(matches!(
            service.refresh().await,
            Err(ComparisonError::NoQuery)
        ));

        let mut manual_only = query("loc-1");
        manual_only.log_type = LogTypeFilter::Manual;
        service.load(manual_only.clone()).await.unwrap();

        let refreshed = service.refresh().await.unwrap();
        assert_eq!(refreshed.query, manual_only);
        assert_eq!(refreshed.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_query_does_not_replace_refresh_target() {
        let service = service();
        assert!(matches!(
            service.load(query("")).await,
            Err(ComparisonError::NoLocation)
        ));
        assert!(service.last_query().await.is_none());
        assert!(matches!(
            service.refresh().await,
            Err(ComparisonError::NoQuery)
        ));

        let good = service.load(query("loc-1")).await.unwrap();
        service.load(query("")).await.unwrap_err();
        let mut bad_date = query("loc-1");
        bad_date.date = "01/02/2024".to_string();
        service.load(bad_date).await.unwrap_err();

        let refreshed = service.refresh().await.unwrap();
        assert_eq!(refreshed.query, query("loc-1"));
        assert_eq!(refreshed.entries, good.entries);
        assert!(refreshed.epoch > good.epoch);
    }

    #[tokio::test]
    async fn test_superseded_load_is_not_committed() {
        let service = service();

        let (slow, fast) = tokio::join!(service.load(query("slow")), async {
            assert!(service.is_loading());
            service.load(query("fast")).await
        });

        let slow = slow.unwrap();
        let fast = fast.unwrap();
        assert!(slow.epoch < fast.epoch);

        let current = service.current().await.unwrap();
        assert_eq!(current.query.location_id.as_str(), "fast");
        assert_eq!(service.last_query().await.unwrap(), query("fast"));
        assert!(!service.is_loading());
    }
}
