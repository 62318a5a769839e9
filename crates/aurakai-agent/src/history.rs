//! Append-only interaction history with caller-supplied persistence hooks

use aurakai_core::{HistoryEntry, Result};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Ordered log of history entries. Never reordered or deduplicated.
#[derive(Default)]
pub struct HistoryLog {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, entry: HistoryEntry) {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        debug!(len = entries.len(), "Appended history entry");
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
        info!("Cleared history");
    }

    /// Snapshot of every entry in arrival order.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.clone()
    }

    pub async fn last(&self) -> Option<HistoryEntry> {
        self.entries.read().await.last().cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Hand the current log to `persist`.
    pub async fn save<F>(&self, persist: F) -> Result<()>
    where
        F: FnOnce(&[HistoryEntry]) -> Result<()>,
    {
        let entries = self.entries.read().await;
        persist(entries.as_slice())?;
        info!(len = entries.len(), "Saved history");
        Ok(())
    }

    /// Replace the whole log with what `loader` returns. On loader failure the
    /// log is left untouched.
    pub async fn load<F>(&self, loader: F) -> Result<Vec<HistoryEntry>>
    where
        F: FnOnce() -> Result<Vec<HistoryEntry>>,
    {
        let loaded = match loader() {
            Ok(l) => l,
            Err(e) => {
                warn!("History load failed, keeping current log: {}", e);
                return Err(e);
            }
        };
        let mut entries = self.entries.write().await;
        *entries = loaded.clone();
        info!(len = entries.len(), "Loaded history");
        Ok(loaded)
    }
}
