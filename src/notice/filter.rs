use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::notice::NoticeLevel;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoticeFilter {
    pub level: Option<NoticeLevel>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub keyword: Option<String>,
}
