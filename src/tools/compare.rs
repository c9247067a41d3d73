use rmcp::model::Content;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::comparison::{ComparisonSummary, LogEntry, LogTypeFilter};
use crate::service::{ComparisonQuery, ComparisonView};

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CompareLogsRequest {
    /// Location to compare; falls back to the server's default location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,

    /// Day in YYYY-MM-DD form; omit or leave empty for all dates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default)]
    pub log_type: LogTypeFilter,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct RefreshComparisonRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ComparisonSummaryRequest {}

fn describe_query(query: &ComparisonQuery) -> String {
    let date = if query.date.trim().is_empty() {
        "all dates"
    } else {
        query.date.as_str()
    };
    format!(
        "location {} | {} | filter: {}",
        query.location_id, date, query.log_type
    )
}

fn describe_summary(summary: &ComparisonSummary) -> String {
    format!(
        "{} entries (common {}, automatic {}, manual {}, other {}) | open {} | duplicates collapsed {}",
        summary.total,
        summary.common,
        summary.automatic,
        summary.manual,
        summary.other,
        summary.open,
        summary.duplicates_collapsed
    )
}

fn format_entry_line(entry: &LogEntry) -> String {
    let exit = entry
        .exit_time
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "[{}] {} in {} out {} (#{}, created {})\n",
        entry.log_type.as_str().to_uppercase(),
        entry.vehicle_number,
        entry.entry_time.format("%Y-%m-%d %H:%M"),
        exit,
        entry.id,
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

fn shown<'a>(view: &'a ComparisonView, limit: Option<usize>) -> &'a [LogEntry] {
    let end = limit.map_or(view.entries.len(), |l| l.min(view.entries.len()));
    &view.entries[..end]
}

pub fn format_ai_output(view: &ComparisonView, limit: Option<usize>) -> String {
    let mut output = String::new();
    output.push_str(&format!("Comparison: {}\n", describe_query(&view.query)));
    output.push_str(&format!("Summary: {}\n\n", describe_summary(&view.summary)));

    let entries = shown(view, limit);
    if entries.is_empty() {
        output.push_str("No log entries found.\n");
    } else {
        for entry in entries {
            output.push_str(&format_entry_line(entry));
        }
        if entries.len() < view.entries.len() {
            output.push_str(&format!(
                "... {} more not shown\n",
                view.entries.len() - entries.len()
            ));
        }
    }

    output
}

pub fn format_text_output(view: &ComparisonView, limit: Option<usize>) -> String {
    let mut output = String::new();

    for entry in shown(view, limit) {
        output.push_str(&format!(
            "[#{}] {} | {}\n",
            entry.id,
            entry.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            entry.log_type,
        ));
        output.push_str(&format!("Vehicle: {}\n", entry.vehicle_number));
        output.push_str(&format!(
            "Entry: {}\n",
            entry.entry_time.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        match entry.exit_time {
            Some(exit) => {
                output.push_str(&format!("Exit: {}\n", exit.format("%Y-%m-%d %H:%M:%S UTC")))
            }
            None => output.push_str("Exit: open\n"),
        }
        output.push_str("-".repeat(60).as_str());
        output.push('\n');
    }

    output
}

/// Render a view in the requested format (ai by default).
pub fn render_view(view: &ComparisonView, format: Option<&str>, limit: Option<usize>) -> Content {
    let format = format.unwrap_or("ai").trim();
    match format {
        "json" => Content::text(
            serde_json::to_string_pretty(view)
                .unwrap_or_else(|e| format!("Failed to serialize comparison: {e}")),
        ),
        "text" => Content::text(format_text_output(view, limit)),
        _ => Content::text(format_ai_output(view, limit)),
    }
}

pub fn render_summary(view: Option<&ComparisonView>, loading: bool) -> Content {
    match view {
        Some(view) => Content::text(
            serde_json::to_string_pretty(&serde_json::json!({
                "query": view.query,
                "summary": view.summary,
                "fetched_at": view.fetched_at,
                "loading": loading,
            }))
            .unwrap_or_else(|e| format!("Failed to serialize summary: {e}")),
        ),
        None if loading => Content::text("Comparison is loading.".to_string()),
        None => Content::text("No comparison loaded yet.".to_string()),
    }
}
