//! Server-side holder of the single shared snapshot

use std::{path::PathBuf, time::Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{error::PersistError, state::AppSnapshot};

/// The shared snapshot, optionally mirrored to a JSON file. Last write wins.
#[derive(Debug)]
pub struct StateStore {
    snapshot: Mutex<AppSnapshot>,
    path: Option<PathBuf>,
    last_write: Mutex<Option<DateTime<Utc>>>,
    start_time: Instant,
}

impl StateStore {
    pub fn in_memory() -> Self {
        Self::with_snapshot(AppSnapshot::default(), None)
    }

    /// Open a file-backed store. A missing or unreadable file starts empty.
    pub async fn open(path: PathBuf) -> Self {
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(snapshot) => {
                    info!("Loaded state from {}", path.display());
                    snapshot
                }
                Err(e) => {
                    warn!("Ignoring unreadable state file {}: {}", path.display(), e);
                    AppSnapshot::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No state file at {}, starting empty", path.display());
                AppSnapshot::default()
            }
            Err(e) => {
                warn!("Failed to read state file {}: {}", path.display(), e);
                AppSnapshot::default()
            }
        };
        Self::with_snapshot(snapshot, Some(path))
    }

    fn with_snapshot(snapshot: AppSnapshot, path: Option<PathBuf>) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            path,
            last_write: Mutex::new(None),
            start_time: Instant::now(),
        }
    }

    pub async fn get(&self) -> AppSnapshot {
        self.snapshot.lock().await.clone()
    }

    /// Replace the stored snapshot and persist it.
    ///
    /// The in-memory copy is replaced even when persisting fails.
    pub async fn replace(&self, snapshot: AppSnapshot) -> Result<(), PersistError> {
        let mut current = self.snapshot.lock().await;
        *current = snapshot;
        *self.last_write.lock().await = Some(Utc::now());
        // Holding the lock keeps file writes in the same order as replacements.
        self.persist(&current).await
    }

    /// Freeze every running timer at `now_ms` and persist the result.
    pub async fn pause_running(&self, now_ms: i64) -> Result<AppSnapshot, PersistError> {
        let mut current = self.snapshot.lock().await;
        let frozen = current.freeze(now_ms);
        info!("Paused {} running timers in stored state", frozen);
        *self.last_write.lock().await = Some(Utc::now());
        self.persist(&current).await?;
        Ok(current.clone())
    }

    pub async fn last_write(&self) -> Option<DateTime<Utc>> {
        *self.last_write.lock().await
    }

    /// Calculate server uptime as a formatted string
    pub fn uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    async fn persist(&self, snapshot: &AppSnapshot) -> Result<(), PersistError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let body = serde_json::to_vec_pretty(snapshot)?;
        tokio::fs::write(path, body).await?;
        debug!("Persisted state to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{TimerEntry, TimerState};

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!(
            "cooldown-board-store-{}-{}.json",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    fn sample() -> AppSnapshot {
        let mut snapshot = AppSnapshot::default();
        snapshot.timers.insert("A".into(), TimerEntry::cooldown(10_000));
        snapshot
            .timers
            .insert("B".into(), TimerEntry::with_state(TimerState::Ready));
        snapshot
    }

    #[tokio::test]
    async fn starts_empty_and_replaces() {
        let store = StateStore::in_memory();
        assert_eq!(store.get().await, AppSnapshot::default());
        assert!(store.last_write().await.is_none());

        store.replace(sample()).await.unwrap();
        assert_eq!(store.get().await, sample());
        assert!(store.last_write().await.is_some());
    }

    #[tokio::test]
    async fn file_backed_store_survives_reopen() {
        let path = scratch_path();
        let store = StateStore::open(path.clone()).await;
        assert_eq!(store.get().await, AppSnapshot::default());
        store.replace(sample()).await.unwrap();

        let reopened = StateStore::open(path.clone()).await;
        assert_eq!(reopened.get().await, sample());
        tokio::fs::remove_file(path).await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let path = scratch_path();
        tokio::fs::write(&path, b"{ nope").await.unwrap();
        let store = StateStore::open(path.clone()).await;
        assert_eq!(store.get().await, AppSnapshot::default());
        tokio::fs::remove_file(path).await.unwrap();
    }

    #[tokio::test]
    async fn pause_running_freezes_and_persists() {
        let path = scratch_path();
        let store = StateStore::open(path.clone()).await;
        store.replace(sample()).await.unwrap();

        let paused = store.pause_running(4_000).await.unwrap();
        assert!(paused.is_paused);
        assert_eq!(paused.entry("A"), Some(&TimerEntry::paused(6_000)));
        assert_eq!(StateStore::open(path.clone()).await.get().await, paused);
        tokio::fs::remove_file(path).await.unwrap();
    }

    #[test]
    fn uptime_starts_in_seconds() {
        assert!(StateStore::in_memory().uptime().ends_with('s'));
    }
}
