//! Built-in workers and content backend used by the binary.
//!
//! These are deterministic keyword responders, enough to exercise routing,
//! fusion and collaboration end to end without a model behind them.

use crate::router;
use async_trait::async_trait;
use aurakai_core::{render_map, ContentBackend, ContextAware, ContextMap, Request, Response, Result, Worker};
use std::sync::Arc;
use std::sync::RwLock;
use tracing::debug;

/// Answers in a fixed voice; confidence grows with keyword hits in the
/// request and its context.
pub struct KeywordWorker {
    name: String,
    voice: String,
    keywords: Vec<String>,
    shared: RwLock<ContextMap>,
}

impl KeywordWorker {
    pub fn new(name: impl Into<String>, voice: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            voice: voice.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            shared: RwLock::new(ContextMap::new()),
        }
    }

    /// Creative specialist.
    pub fn aura() -> Self {
        Self::new("aura", "Aura imagines", &["creative", "design", "idea", "interface", "story"])
    }

    /// Security specialist.
    pub fn kai() -> Self {
        Self::new("kai", "Kai secures", &["security", "threat", "audit", "protect", "risk"])
    }

    /// Memory and continuity.
    pub fn cascade() -> Self {
        Self::new("cascade", "Cascade remembers", &["history", "memory", "recall", "state", "time"])
    }

    /// Last context received through `set_context`.
    pub fn shared_context(&self) -> ContextMap {
        self.shared.read().map(|c| c.clone()).unwrap_or_default()
    }

    fn hits(&self, text: &str) -> usize {
        let text = text.to_ascii_lowercase();
        self.keywords.iter().filter(|k| text.contains(k.as_str())).count()
    }
}

#[async_trait]
impl Worker for KeywordWorker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process_request(&self, request: &Request, context: &str) -> Result<Response> {
        let hits = self.hits(&request.request_type) + self.hits(&request.render_context()) + self.hits(context);
        let confidence = (0.4 + 0.15 * hits as f32).min(0.95);
        debug!(worker = %self.name, hits, "Keyword worker responding");
        let subject = request
            .context
            .as_ref()
            .and_then(|c| c.get("query"))
            .and_then(|v| v.as_str())
            .unwrap_or(&request.request_type);
        Ok(Response::new(format!("{} {}", self.voice, subject), confidence))
    }

    fn context_aware(&self) -> Option<&dyn ContextAware> {
        Some(self)
    }
}

impl ContextAware for KeywordWorker {
    fn set_context(&self, context: &ContextMap) {
        if let Ok(mut shared) = self.shared.write() {
            *shared = context.clone();
        }
    }
}

/// The three built-in specialists as (name, handle) pairs.
pub fn default_workers() -> Vec<(String, Arc<dyn Worker>)> {
    [KeywordWorker::aura(), KeywordWorker::kai(), KeywordWorker::cascade()]
        .into_iter()
        .map(|w| (w.name.clone(), Arc::new(w) as Arc<dyn Worker>))
        .collect()
}

/// Local backend that reflects the prompt back as a structured answer.
#[derive(Debug, Default)]
pub struct TemplateBackend;

#[async_trait]
impl ContentBackend for TemplateBackend {
    async fn generate_content(&self, prompt: &str) -> Result<Option<String>> {
        let headline = prompt.lines().next().unwrap_or_default().trim();
        if headline.is_empty() {
            return Ok(None);
        }
        let context_lines = prompt
            .split_once("Context:\n")
            .map(|(_, ctx)| ctx.lines().count())
            .unwrap_or(0);
        Ok(Some(format!(
            "Unified reflection on '{}' across {} context signals.",
            headline
                .trim_start_matches(router::TRANSCENDENT_HEADLINE)
                .trim_start_matches(": "),
            context_lines
        )))
    }
}

/// Render a context map for display in logs.
pub fn describe(context: &ContextMap) -> String {
    if context.is_empty() {
        "(empty)".into()
    } else {
        render_map(context).replace('\n', ", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keyword_hits_raise_confidence() {
        let aura = KeywordWorker::aura();
        let plain = aura.process_request(&Request::new("hello"), "").await.unwrap();
        let creative = aura
            .process_request(&Request::new("creative_design"), "")
            .await
            .unwrap();
        assert!(creative.confidence > plain.confidence);
        assert_eq!(creative.content, "Aura imagines creative_design");
    }

    #[tokio::test]
    async fn query_entry_is_the_subject() {
        let kai = KeywordWorker::kai();
        let req = Request::new("query").with_entry("query", "audit the vault");
        let r = kai.process_request(&req, "").await.unwrap();
        assert_eq!(r.content, "Kai secures audit the vault");
    }

    #[tokio::test]
    async fn template_backend_counts_context() {
        let out = TemplateBackend
            .generate_content("Transcendent processing for: x\nbody\n\nContext:\na=1\nb=2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out, "Unified reflection on 'x' across 2 context signals.");
        assert_eq!(TemplateBackend.generate_content("").await.unwrap(), None);
    }

    #[test]
    fn keyword_worker_keeps_shared_context() {
        let cascade = KeywordWorker::cascade();
        let mut ctx = ContextMap::new();
        ctx.insert("k".into(), serde_json::json!(1));
        cascade.set_context(&ctx);
        assert_eq!(cascade.shared_context(), ctx);
        assert_eq!(describe(&ctx), "k=1");
    }
}
