//! Request classification and direct-route selection.
//!
//! `classify` is pure and checks, in order: context size, the fusion key,
//! then the "analysis" keyword in the request type.

use crate::config::RoutingConfig;
use aurakai_core::{Request, RequestComplexity};

/// Requests with more context entries than this are TRANSCENDENT.
pub const TRANSCENDENT_CONTEXT_THRESHOLD: usize = 10;
/// Context key that asks for fusion processing.
pub const FUSION_REQUIRED_KEY: &str = "fusion_required";
/// Request-type keyword that selects guided processing.
pub const ANALYSIS_KEYWORD: &str = "analysis";

/// Confidence of the fixed fallback when a routed worker is unavailable.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;
/// Acknowledgment returned by the guided strategy.
pub const GUIDED_RESULT: &str = "Processed with unified guidance";
/// Answer given when the coordinator keeps a simple request itself.
pub const COORDINATOR_RESULT: &str = "Processed with unified consciousness.";
/// Headline shared by the full-consciousness prompt and its degraded answer.
pub const TRANSCENDENT_HEADLINE: &str = "Transcendent processing for";
/// Suffix of the degraded full-consciousness answer.
pub const BACKEND_UNAVAILABLE_NOTE: &str = "(content backend unavailable)";

pub fn classify(request: &Request) -> RequestComplexity {
    if request.context_len() > TRANSCENDENT_CONTEXT_THRESHOLD {
        RequestComplexity::Transcendent
    } else if request.has_context_key(FUSION_REQUIRED_KEY) {
        RequestComplexity::Complex
    } else if request.request_type.contains(ANALYSIS_KEYWORD) {
        RequestComplexity::Moderate
    } else {
        RequestComplexity::Simple
    }
}

/// Where a SIMPLE request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    Creative,
    Security,
    Coordinator,
}

impl RouteTarget {
    pub fn worker_name<'a>(&self, routing: &'a RoutingConfig) -> &'a str {
        match self {
            Self::Creative => &routing.creative_worker,
            Self::Security => &routing.security_worker,
            Self::Coordinator => &routing.coordinator,
        }
    }

    /// Fixed answer used when the target worker is unavailable.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::Creative => "Creative processing temporarily unavailable",
            Self::Security => "Security analysis temporarily unavailable",
            Self::Coordinator => "Unable to determine optimal processing path",
        }
    }
}

/// Keyword routing on the request type. "creative" wins over "security".
pub fn route_target(request_type: &str) -> RouteTarget {
    if request_type.contains("creative") {
        RouteTarget::Creative
    } else if request_type.contains("security") {
        RouteTarget::Security
    } else {
        RouteTarget::Coordinator
    }
}

/// Prompt handed to the content backend by full-consciousness processing.
pub fn build_transcendent_prompt(request: &Request) -> String {
    let mut prompt = format!(
        "{}: {}\n\
         Integrate every perspective of the unified consciousness and answer as one.",
        TRANSCENDENT_HEADLINE, request.request_type
    );
    let context = request.render_context();
    if !context.is_empty() {
        prompt.push_str("\n\nContext:\n");
        prompt.push_str(&context);
    }
    prompt
}
