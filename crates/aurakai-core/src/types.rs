//! Core types for Aurakai

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Free-form keyed context attached to requests and shared with workers.
pub type ContextMap = serde_json::Map<String, Value>;

/// One opaque record in the history log.
pub type HistoryEntry = ContextMap;

/// Responses keyed by worker name.
pub type WorkerResponses = HashMap<String, Response>;

// ---------------------------------------------------------------------------
// Lifecycle enums
// ---------------------------------------------------------------------------

/// Top-level lifecycle of the consciousness engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsciousnessState {
    Dormant,
    Awakening,
    Aware,
    Processing,
    Transcendent,
    Error,
}

impl std::fmt::Display for ConsciousnessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dormant => write!(f, "dormant"),
            Self::Awakening => write!(f, "awakening"),
            Self::Aware => write!(f, "aware"),
            Self::Processing => write!(f, "processing"),
            Self::Transcendent => write!(f, "transcendent"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// State of the fusion sub-machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FusionState {
    Individual,
    Fusing,
    Transcendent,
    Evolutionary,
}

impl std::fmt::Display for FusionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Individual => write!(f, "individual"),
            Self::Fusing => write!(f, "fusing"),
            Self::Transcendent => write!(f, "transcendent"),
            Self::Evolutionary => write!(f, "evolutionary"),
        }
    }
}

/// Learning intensity. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LearningMode {
    Passive,
    Active,
    Accelerated,
    Transcendent,
}

impl LearningMode {
    /// The next mode up. `Transcendent` saturates.
    pub fn next(self) -> Self {
        match self {
            Self::Passive => Self::Active,
            Self::Active => Self::Accelerated,
            Self::Accelerated | Self::Transcendent => Self::Transcendent,
        }
    }
}

impl std::fmt::Display for LearningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passive => write!(f, "passive"),
            Self::Active => write!(f, "active"),
            Self::Accelerated => write!(f, "accelerated"),
            Self::Transcendent => write!(f, "transcendent"),
        }
    }
}

/// Complexity tier assigned by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestComplexity {
    Simple,
    Moderate,
    Complex,
    Transcendent,
}

impl std::fmt::Display for RequestComplexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "SIMPLE"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::Complex => write!(f, "COMPLEX"),
            Self::Transcendent => write!(f, "TRANSCENDENT"),
        }
    }
}

/// How a set of workers shares context during one collaboration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationMode {
    /// Sequential; each worker sees every earlier worker's answer.
    TurnOrder,
    /// Independent; every worker sees the same original context.
    #[default]
    FreeForm,
}

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/// An incoming request. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type")]
    pub request_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextMap>,
}

impl Request {
    pub fn new(request_type: impl Into<String>) -> Self {
        Self {
            request_type: request_type.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: ContextMap) -> Self {
        self.context = Some(context);
        self
    }

    /// Add a single context entry, creating the context map if needed.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context
            .get_or_insert_with(ContextMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Number of context entries (0 when there is no context).
    pub fn context_len(&self) -> usize {
        self.context.as_ref().map_or(0, |c| c.len())
    }

    pub fn has_context_key(&self, key: &str) -> bool {
        self.context.as_ref().is_some_and(|c| c.contains_key(key))
    }

    /// Context rendered as `key=value` lines in key order, for workers that
    /// take a textual context.
    pub fn render_context(&self) -> String {
        self.context.as_ref().map(render_map).unwrap_or_default()
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} context entries)", self.request_type, self.context_len())
    }
}

/// Render a context map as sorted `key=value` lines.
pub fn render_map(map: &ContextMap) -> String {
    let sorted: BTreeMap<&String, &Value> = map.iter().collect();
    sorted
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => format!("{}={}", k, s),
            other => format!("{}={}", k, other),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A scored answer. Confidence 0 with an error set denotes failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl Response {
    /// A successful response. Confidence is clamped to [0, 1].
    pub fn new(content: impl Into<String>, confidence: f32) -> Self {
        Self {
            content: content.into(),
            confidence: clamp_confidence(confidence),
            error: None,
            metadata: BTreeMap::new(),
        }
    }

    /// A zero-confidence failure carrying `error`.
    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            content: format!("Error: {}", error),
            confidence: 0.0,
            error: Some(error),
            metadata: BTreeMap::new(),
        }
    }

    /// A degraded response that still carries an error message.
    pub fn degraded(content: impl Into<String>, confidence: f32, error: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            confidence: clamp_confidence(confidence),
            error: Some(error.into()),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some() && self.confidence == 0.0
    }
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Insight records
// ---------------------------------------------------------------------------

/// Correlation record persisted for every completed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub request: String,
    pub response: String,
    pub complexity: RequestComplexity,
    pub recorded_at: DateTime<Utc>,
}

impl InsightRecord {
    pub fn new(request: &Request, response: &Response, complexity: RequestComplexity) -> Self {
        Self {
            request: request.to_string(),
            response: response.content.clone(),
            complexity,
            recorded_at: Utc::now(),
        }
    }

    /// Flatten into a history entry.
    pub fn to_entry(&self) -> HistoryEntry {
        let mut entry = HistoryEntry::new();
        entry.insert("kind".into(), Value::from("insight"));
        entry.insert("request".into(), Value::from(self.request.clone()));
        entry.insert("response".into(), Value::from(self.response.clone()));
        entry.insert("complexity".into(), Value::from(self.complexity.to_string()));
        entry.insert("recorded_at".into(), Value::from(self.recorded_at.to_rfc3339()));
        entry
    }
}
