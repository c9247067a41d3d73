use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::notice::{Notice, NoticeFilter, NoticeLevel, NoticeLog};

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ShowNoticesRequest {
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// info, warning or error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ClearNoticesRequest {}

fn default_limit() -> usize {
    20
}

fn parse_level(level: &str) -> Option<NoticeLevel> {
    match level.trim().to_lowercase().as_str() {
        "info" => Some(NoticeLevel::Info),
        "warning" | "warn" => Some(NoticeLevel::Warning),
        "error" => Some(NoticeLevel::Error),
        _ => None,
    }
}

fn format_ai_output(notices: &[Notice]) -> String {
    if notices.is_empty() {
        return "No notices.\n".to_string();
    }

    notices
        .iter()
        .map(|n| {
            format!(
                "[{} #{}] {}\n",
                n.level.to_string().to_uppercase(),
                n.id,
                n.message
            )
        })
        .collect()
}

fn format_text_output(notices: &[Notice]) -> String {
    let mut output = String::new();

    for notice in notices {
        output.push_str(&format!(
            "[#{}] {} | {}\n",
            notice.id,
            notice.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            notice.level,
        ));
        output.push_str(&notice.message);
        output.push('\n');
        output.push_str("-".repeat(60).as_str());
        output.push('\n');
    }

    output
}

pub async fn show_notices(
    req: ShowNoticesRequest,
    notices: &NoticeLog,
) -> Result<CallToolResult, McpError> {
    tracing::debug!(
        "show_notices called with limit: {}, level: {:?}",
        req.limit,
        req.level
    );

    let level = match req.level.as_deref() {
        Some(raw) => Some(parse_level(raw).ok_or_else(|| {
            McpError::invalid_params(format!("unknown notice level: {raw}"), None)
        })?),
        None => None,
    };

    let filter = NoticeFilter {
        level,
        after: None,
        before: None,
        keyword: req.keyword,
    };

    let found = notices.get_notices(Some(req.limit), Some(filter)).await;

    let content = match req.format.as_deref().unwrap_or("ai").trim() {
        "json" => serde_json::to_string_pretty(&found)
            .unwrap_or_else(|e| format!("Failed to serialize notices: {e}")),
        "text" => format_text_output(&found),
        _ => format_ai_output(&found),
    };

    Ok(CallToolResult::success(vec![Content::text(content)]))
}

pub async fn clear_notices(
    _req: ClearNoticesRequest,
    notices: &NoticeLog,
) -> Result<CallToolResult, McpError> {
    tracing::debug!("clear_notices called");

    let count = notices.count().await;
    notices.clear().await;

    Ok(CallToolResult::success(vec![Content::text(format!(
        "Cleared {count} notices"
    ))]))
}
