use super::recon_server::ReconServer;
use crate::notice::NoticeLevel;
use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

const DEBOUNCE: Duration = Duration::from_millis(500);

impl ReconServer {
    /// Refresh the current comparison whenever the snapshot file changes.
    pub fn start_snapshot_watching(&self, snapshot: &Path) -> Result<()> {
        let snapshot = snapshot.to_path_buf();
        let file_name = snapshot
            .file_name()
            .map(|n| n.to_os_string())
            .context("Snapshot path has no file name")?;

        // Watch the directory so replace-by-rename edits are seen too
        let watch_dir = match snapshot.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, mut rx) = mpsc::channel::<()>(100);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let Ok(event) = res else { return };
                let relevant = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                    && event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                if relevant {
                    // A full channel already has a refresh pending
                    let _ = tx.try_send(());
                }
            },
            Config::default(),
        )
        .context("Failed to create snapshot watcher")?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", watch_dir.display()))?;

        tracing::info!("Watching snapshot for changes: {}", snapshot.display());

        let server = self.clone();
        tokio::spawn(async move {
            // Dropping the watcher stops events, so it lives with the task
            let _watcher = watcher;
            let mut last_event = Instant::now();
            let mut pending_refresh = false;

            loop {
                tokio::select! {
                    event = rx.recv() => {
                        if event.is_none() {
                            tracing::debug!("Snapshot watcher channel closed");
                            break;
                        }
                        last_event = Instant::now();
                        pending_refresh = true;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)), if pending_refresh => {
                        if last_event.elapsed() >= DEBOUNCE {
                            pending_refresh = false;
                            server.refresh_after_snapshot_change().await;
                        }
                    }
                }
            }
        });

        Ok(())
    }

    async fn refresh_after_snapshot_change(&self) {
        if self.service.last_query().await.is_none() {
            tracing::debug!("Snapshot changed before any comparison was requested");
            return;
        }

        tracing::info!("Snapshot changed, refreshing comparison");
        match self.service.refresh().await {
            Ok(view) => {
                self.notices
                    .add(
                        NoticeLevel::Info,
                        format!(
                            "Comparison data changed, refreshed {} entries",
                            view.entries.len()
                        ),
                    )
                    .await;
            }
            Err(e) => {
                self.report_failure(e).await;
            }
        }
    }
}
