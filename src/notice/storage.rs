use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notice::{Notice, NoticeFilter, NoticeLevel};

/// Bounded, newest-last ring of user notices.
#[derive(Debug, Clone)]
pub struct NoticeLog {
    entries: Arc<RwLock<VecDeque<Notice>>>,
    next_id: Arc<RwLock<usize>>,
    max_entries: usize,
}

impl NoticeLog {
    pub fn new(max_entries: usize) -> Self {
        tracing::info!("Notice log initialized with max entries: {}", max_entries);

        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            next_id: Arc::new(RwLock::new(1)),
            max_entries,
        }
    }

    fn trim_entries(&self, entries: &mut VecDeque<Notice>) {
        if entries.len() > self.max_entries {
            let remove_count = entries.len() - self.max_entries;
            entries.drain(..remove_count);
            tracing::debug!("Trimmed {} old notices", remove_count);
        }
    }

    pub async fn add(&self, level: NoticeLevel, message: impl Into<String>) -> usize {
        let mut next_id = self.next_id.write().await;
        let id = *next_id;
        *next_id += 1;

        let notice = Notice {
            id,
            timestamp: Utc::now(),
            level,
            message: message.into(),
        };

        tracing::debug!("Recorded {} notice #{}: {}", notice.level, id, notice.message);

        let mut entries = self.entries.write().await;
        entries.push_back(notice);
        self.trim_entries(&mut entries);

        id
    }

    /// Newest first, optionally filtered and truncated.
    pub async fn get_notices(
        &self,
        limit: Option<usize>,
        filter: Option<NoticeFilter>,
    ) -> Vec<Notice> {
        let entries = self.entries.read().await;
        let mut result: Vec<Notice> = match filter {
            Some(filter) => entries.iter().filter(|n| n.filter(&filter)).cloned().collect(),
            None => entries.iter().cloned().collect(),
        };

        // Ids are monotonic, so they order ties in timestamp too
        result.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        if let Some(limit) = limit {
            result.truncate(limit);
        }

        result
    }

    pub async fn clear(&self) {
        // Same lock order as `add`: next_id, then entries
        let mut next_id = self.next_id.write().await;
        let mut entries = self.entries.write().await;
        entries.clear();
        *next_id = 1;

        tracing::info!("Cleared all notices");
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_list_newest_first() {
        let log = NoticeLog::new(10);
        log.add(NoticeLevel::Warning, "No location selected").await;
        log.add(NoticeLevel::Error, "Failed to fetch comparison data")
            .await;

        let notices = log.get_notices(None, None).await;
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].message, "Failed to fetch comparison data");
        assert_eq!(notices[1].id, 1);

        let errors = log
            .get_notices(
                None,
                Some(NoticeFilter {
                    level: Some(NoticeLevel::Error),
                    ..Default::default()
                }),
            )
            .await;
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_limit() {
        let log = NoticeLog::new(5);
        for i in 0..10 {
            log.add(NoticeLevel::Info, format!("notice {i}")).await;
        }

        assert_eq!(log.count().await, 5);
        let notices = log.get_notices(Some(1), None).await;
        assert_eq!(notices[0].message, "notice 9");
    }

    #[tokio::test]
    async fn test_clear_resets_ids() {
        let log = NoticeLog::new(5);
        log.add(NoticeLevel::Info, "one").await;
        log.clear().await;
        assert_eq!(log.count().await, 0);

        let id = log.add(NoticeLevel::Info, "two").await;
        assert_eq!(id, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_and_clear_complete() {
        let log = NoticeLog::new(100);

        let mut handles = Vec::new();
        for worker in 0..8 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..2_000 {
                    if worker % 2 == 0 {
                        log.add(NoticeLevel::Info, format!("notice {i}")).await;
                    } else {
                        log.clear().await;
                    }
                }
            }));
        }

        let all_done = async {
            for handle in handles {
                handle.await.unwrap();
            }
        };
        tokio::time::timeout(std::time::Duration::from_secs(30), all_done)
            .await
            .expect("add and clear should not block each other");

        assert!(log.count().await <= 100);
    }
}
