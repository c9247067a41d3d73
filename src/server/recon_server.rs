use crate::comparison::ReconcileOptions;
use crate::notice::{NoticeLevel, NoticeLog};
use crate::service::{ComparisonError, ComparisonQuery, ComparisonService};
use crate::source::AnySource;
use crate::tools::{
    ClearNoticesRequest, CompareLogsRequest, ComparisonSummaryRequest, RefreshComparisonRequest,
    ShowNoticesRequest, clear_notices, render_summary, render_view, show_notices,
};
use crate::types::LocationId;
use rmcp::{
    ErrorData as McpError,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::*,
    tool, tool_router,
};

#[derive(Clone)]
pub struct ReconServer {
    pub(crate) service: ComparisonService<AnySource>,
    pub(crate) notices: NoticeLog,
    default_location: Option<LocationId>,
    pub(crate) tool_router: ToolRouter<ReconServer>,
}

#[tool_router]
impl ReconServer {
    pub fn new(
        source: AnySource,
        options: ReconcileOptions,
        notices: NoticeLog,
        default_location: Option<LocationId>,
    ) -> Self {
        tracing::info!("Comparison source: {}", source.describe());
        if let Some(location) = &default_location {
            tracing::info!("Default location: {location}");
        }

        Self {
            service: ComparisonService::new(source, options),
            notices,
            default_location,
            tool_router: Self::tool_router(),
        }
    }

    pub fn service(&self) -> &ComparisonService<AnySource> {
        &self.service
    }

    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }

    /// Record the operator-facing notice for a failed cycle and turn it into
    /// a tool error result. Internal detail only reaches the logs.
    pub(crate) async fn report_failure(&self, e: ComparisonError) -> CallToolResult {
        let level = if e.is_precondition() {
            tracing::warn!("Comparison request rejected: {e}");
            NoticeLevel::Warning
        } else {
            tracing::error!("Comparison request failed: {e}");
            NoticeLevel::Error
        };
        self.notices.add(level, e.notice()).await;

        CallToolResult::error(vec![Content::text(e.notice())])
    }

    #[tool(
        description = "Fetch manual and automatic entry logs for a location and reconcile them: common entries deduplicated per vehicle, ordered common, automatic, manual, newest first"
    )]
    async fn compare_logs(
        &self,
        Parameters(req): Parameters<CompareLogsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            "compare_logs called with location: {:?}, date: {:?}, log_type: {}",
            req.location_id,
            req.date,
            req.log_type
        );

        let location_id = req
            .location_id
            .map(LocationId::from)
            .or_else(|| self.default_location.clone())
            .unwrap_or_else(|| LocationId::new(""));

        let query = ComparisonQuery {
            location_id,
            date: req.date.unwrap_or_default(),
            log_type: req.log_type,
        };

        match self.service.load(query).await {
            Ok(view) => Ok(CallToolResult::success(vec![render_view(
                &view,
                req.format.as_deref(),
                req.limit,
            )])),
            Err(e) => Ok(self.report_failure(e).await),
        }
    }

    #[tool(description = "Re-run the most recent comparison with fresh data")]
    async fn refresh_comparison(
        &self,
        Parameters(req): Parameters<RefreshComparisonRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.service.refresh().await {
            Ok(view) => Ok(CallToolResult::success(vec![render_view(
                &view,
                req.format.as_deref(),
                req.limit,
            )])),
            Err(e) => Ok(self.report_failure(e).await),
        }
    }

    #[tool(description = "Show counts and loading state for the current comparison")]
    async fn comparison_summary(
        &self,
        Parameters(_req): Parameters<ComparisonSummaryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let view = self.service.current().await;
        Ok(CallToolResult::success(vec![render_summary(
            view.as_ref(),
            self.service.is_loading(),
        )]))
    }

    #[tool(description = "Display notices raised by comparison requests")]
    async fn show_notices(
        &self,
        Parameters(req): Parameters<ShowNoticesRequest>,
    ) -> Result<CallToolResult, McpError> {
        show_notices(req, &self.notices).await
    }

    #[tool(description = "Clear all recorded notices")]
    async fn clear_notices(
        &self,
        Parameters(req): Parameters<ClearNoticesRequest>,
    ) -> Result<CallToolResult, McpError> {
        clear_notices(req, &self.notices).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::LogTypeFilter;
    use crate::source::SnapshotSource;
    use std::io::Write;

    fn snapshot() -> tempfile::NamedTempFile {
        let rows = serde_json::json!([
            {"id": "c1", "location_id": "loc-1", "vehicle_number": "KA01AB1234",
             "entry_time": "2024-01-01T09:00:00Z", "exit_time": null,
             "log_type": "common", "created_at": "2024-01-01T10:00:00Z"},
            {"id": "c2", "location_id": "loc-1", "vehicle_number": "KA01AB1234",
             "entry_time": "2024-01-01T09:00:00Z", "exit_time": "2024-01-01T11:00:00Z",
             "log_type": "common", "created_at": "2024-01-01T12:00:00Z"},
            {"id": "m1", "location_id": "loc-1", "vehicle_number": "KA01AB1234",
             "entry_time": "2024-01-01T09:00:00Z", "exit_time": null,
             "log_type": "manual", "created_at": "2024-01-01T09:01:00Z"}
        ]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{rows}").unwrap();
        file
    }

    fn server(file: &tempfile::NamedTempFile, default_location: Option<&str>) -> ReconServer {
        ReconServer::new(
            AnySource::Snapshot(SnapshotSource::new(file.path())),
            ReconcileOptions::default(),
            NoticeLog::new(50),
            default_location.map(LocationId::new),
        )
    }

    fn request(location_id: Option<&str>) -> CompareLogsRequest {
        CompareLogsRequest {
            location_id: location_id.map(str::to_string),
            date: None,
            log_type: LogTypeFilter::All,
            limit: None,
            format: None,
        }
    }

    #[tokio::test]
    async fn test_empty_location_records_notice() {
        let file = snapshot();
        let server = server(&file, None);

        let result = server
            .compare_logs(Parameters(request(Some(""))))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));

        let notices = server.notices.get_notices(None, None).await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "No location selected");
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert!(server.service.last_query().await.is_none());
        assert!(server.service.current().await.is_none());
    }

    #[tokio::test]
    async fn test_missing_location_uses_default() {
        let file = snapshot();
        let server = server(&file, Some("loc-1"));

        let result = server.compare_logs(Parameters(request(None))).await.unwrap();
        assert_ne!(result.is_error, Some(true));

        let view = server.service.current().await.unwrap();
        let ids: Vec<&str> = view.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "m1"]);
        assert_eq!(server.notices.count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_location_without_default() {
        let file = snapshot();
        let server = server(&file, None);

        let result = server.compare_logs(Parameters(request(None))).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(server.notices.count().await, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_records_error_notice() {
        let server = ReconServer::new(
            AnySource::Snapshot(SnapshotSource::new("/nonexistent/rows.json")),
            ReconcileOptions::default(),
            NoticeLog::new(50),
            None,
        );

        let result = server
            .compare_logs(Parameters(request(Some("loc-1"))))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));

        let notices = server.notices.get_notices(None, None).await;
        assert_eq!(notices[0].message, "Failed to fetch comparison data");
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_refresh_before_any_query() {
        let file = snapshot();
        let server = server(&file, None);

        let result = server
            .refresh_comparison(Parameters(RefreshComparisonRequest {
                limit: None,
                format: None,
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_refresh_after_rejected_request_reruns_last_good_query() {
        let file = snapshot();
        let server = server(&file, None);

        server
            .compare_logs(Parameters(request(Some("loc-1"))))
            .await
            .unwrap();
        let rejected = server
            .compare_logs(Parameters(request(Some(""))))
            .await
            .unwrap();
        assert_eq!(rejected.is_error, Some(true));

        let result = server
            .refresh_comparison(Parameters(RefreshComparisonRequest {
                limit: None,
                format: None,
            }))
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));

        let query = server.service.last_query().await.unwrap();
        assert_eq!(query.location_id.as_str(), "loc-1");
        // Only the rejected compare left a notice
        assert_eq!(server.notices.count().await, 1);
    }
}
