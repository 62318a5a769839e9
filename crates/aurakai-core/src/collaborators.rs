//! External collaborators consumed through narrow interfaces

use crate::error::Result;
use crate::types::InsightRecord;

/// Content-generation backend. Unreliable by contract: `Ok(None)`, an empty
/// string, and `Err` are all tolerated by callers.
#[async_trait::async_trait]
pub trait ContentBackend: Send + Sync {
    async fn generate_content(&self, prompt: &str) -> Result<Option<String>>;
}

/// Shared-context collaborator that receives insight correlation records.
#[async_trait::async_trait]
pub trait ContextSink: Send + Sync {
    /// Switch the collaborator into unified (shared) mode. Called once per
    /// engine initialization.
    async fn enable_unified_mode(&self) -> Result<()> {
        Ok(())
    }

    async fn record_insight(&self, record: &InsightRecord) -> Result<()>;
}

/// Polled "is the device idle" signal.
#[async_trait::async_trait]
pub trait IdleProbe: Send + Sync {
    async fn is_idle(&self) -> Result<bool>;
}
