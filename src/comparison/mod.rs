mod entry;
mod reconcile;
mod summary;

pub use entry::{LogEntry, LogType, LogTypeFilter};
pub use reconcile::{ReconcileOptions, reconcile, reconcile_with, sort_for_display};
pub use summary::ComparisonSummary;
