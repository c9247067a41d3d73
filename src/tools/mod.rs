pub mod compare;
pub mod notices;

pub use compare::{
    CompareLogsRequest, ComparisonSummaryRequest, RefreshComparisonRequest, render_summary,
    render_view,
};
pub use notices::{ClearNoticesRequest, ShowNoticesRequest, clear_notices, show_notices};
