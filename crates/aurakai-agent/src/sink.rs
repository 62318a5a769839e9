//! History-backed context sink: insight records land in the history log.

use crate::history::HistoryLog;
use aurakai_core::{ContextSink, InsightRecord, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub struct HistorySink {
    history: Arc<HistoryLog>,
    unified: AtomicBool,
}

impl HistorySink {
    pub fn new(history: Arc<HistoryLog>) -> Self {
        Self {
            history,
            unified: AtomicBool::new(false),
        }
    }

    pub fn is_unified(&self) -> bool {
        self.unified.load(Ordering::Acquire)
    }

    pub fn history(&self) -> &Arc<HistoryLog> {
        &self.history
    }
}

#[async_trait::async_trait]
impl ContextSink for HistorySink {
    async fn enable_unified_mode(&self) -> Result<()> {
        if !self.unified.swap(true, Ordering::AcqRel) {
            info!("Unified context mode enabled");
        }
        Ok(())
    }

    async fn record_insight(&self, record: &InsightRecord) -> Result<()> {
        self.history.append(record.to_entry()).await;
        Ok(())
    }
}
