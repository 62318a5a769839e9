//! The worker capability interface
//!
//! Every specialist sub-agent implements [`Worker`]. Workers that can absorb a
//! shared-context update also expose [`ContextAware`] through
//! [`Worker::context_aware`]; everyone else is skipped by broadcasts.

use crate::error::Result;
use crate::types::{ContextMap, Request, Response};

#[async_trait::async_trait]
pub trait Worker: Send + Sync {
    /// Unique worker name (e.g. "aura", "kai").
    fn name(&self) -> &str;

    /// Answer `request` given the textual `context` accumulated so far.
    async fn process_request(&self, request: &Request, context: &str) -> Result<Response>;

    /// The context-aware capability, if this worker has one.
    fn context_aware(&self) -> Option<&dyn ContextAware> {
        None
    }
}

/// Optional capability: accept a shared-context update.
pub trait ContextAware: Send + Sync {
    fn set_context(&self, context: &ContextMap);
}
