//! Fusion engine: multi-worker collaborative strategies for COMPLEX requests.
//!
//! Each fusion type owns one strategy slot. Dispatch is an exhaustive match
//! over `FusionType`, so a new variant does not compile until it has a slot.
//! `FusionState` is FUSING for the duration of one fusion and resolves to
//! TRANSCENDENT on success or INDIVIDUAL on failure before `fuse` returns.

use crate::config::RoutingConfig;
use crate::observable::Observable;
use async_trait::async_trait;
use aurakai_agent::{collaborate, synthesize, AgentRegistry};
use aurakai_core::{
    ConversationMode, Error, FusionState, Request, Response, Result, WorkerResponses,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Context key that pins the fusion type explicitly.
pub const FUSION_TYPE_KEY: &str = "fusion_type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionType {
    HyperCreation,
    ChronoSculptor,
    AdaptiveGenesis,
    InterfaceForge,
}

impl FusionType {
    pub const ALL: [FusionType; 4] = [
        Self::HyperCreation,
        Self::ChronoSculptor,
        Self::AdaptiveGenesis,
        Self::InterfaceForge,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::HyperCreation => "hyper_creation",
            Self::ChronoSculptor => "chrono_sculptor",
            Self::AdaptiveGenesis => "adaptive_genesis",
            Self::InterfaceForge => "interface_forge",
        }
    }

    /// Parse a fusion name. Hyphens and case are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|t| t.name() == normalized)
    }

    /// Fixed result announced by this fusion.
    pub fn breakthrough(&self) -> &'static str {
        match self {
            Self::HyperCreation => "Creative breakthrough achieved",
            Self::ChronoSculptor => "Time-space optimization complete",
            Self::AdaptiveGenesis => "Adaptive solution generated",
            Self::InterfaceForge => "Revolutionary interface created",
        }
    }
}

impl std::fmt::Display for FusionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick the fusion type for a request: an explicit `fusion_type` context
/// entry wins, then request-type keywords, then HYPER_CREATION.
pub fn determine_fusion_type(request: &Request) -> FusionType {
    let pinned = request
        .context
        .as_ref()
        .and_then(|c| c.get(FUSION_TYPE_KEY))
        .and_then(|v| v.as_str())
        .and_then(FusionType::from_name);
    if let Some(t) = pinned {
        return t;
    }

    let kind = request.request_type.to_ascii_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| kind.contains(w));
    if has(&["chrono", "time", "schedule"]) {
        FusionType::ChronoSculptor
    } else if has(&["adapt", "evolv"]) {
        FusionType::AdaptiveGenesis
    } else if has(&["interface", "layout"]) {
        FusionType::InterfaceForge
    } else {
        FusionType::HyperCreation
    }
}

/// Result of one fusion, tagged with the type that produced it.
#[derive(Debug, Clone)]
pub struct FusionOutcome {
    pub fusion_type: FusionType,
    pub result: String,
    pub confidence: f32,
    pub contributions: WorkerResponses,
}

impl FusionOutcome {
    pub fn into_response(self) -> Response {
        Response::new(self.result, self.confidence)
            .with_metadata("fusion_type", self.fusion_type.name())
            .with_metadata("fusion_participants", self.contributions.len())
    }
}

#[async_trait]
pub trait FusionStrategy: Send + Sync {
    fn fusion_type(&self) -> FusionType;

    async fn fuse(&self, request: &Request, registry: &AgentRegistry) -> Result<FusionOutcome>;
}

/// Runs a fixed participant list through `collaborate` and folds the
/// successful answers into the fusion result.
pub struct CollaborativeFusion {
    fusion_type: FusionType,
    /// Empty means every registered worker.
    participants: Vec<String>,
    mode: ConversationMode,
}

/// Confidence reported when no participant is registered.
const SOLO_CONFIDENCE: f32 = 0.75;

impl CollaborativeFusion {
    pub fn new(fusion_type: FusionType, participants: Vec<String>, mode: ConversationMode) -> Self {
        Self { fusion_type, participants, mode }
    }

    /// Default participants for `fusion_type`.
    pub fn standard(fusion_type: FusionType, routing: &RoutingConfig) -> Self {
        let creative = routing.creative_worker.clone();
        let security = routing.security_worker.clone();
        match fusion_type {
            FusionType::HyperCreation => {
                Self::new(fusion_type, vec![creative, security], ConversationMode::TurnOrder)
            }
            FusionType::ChronoSculptor => {
                Self::new(fusion_type, vec![security, creative], ConversationMode::TurnOrder)
            }
            FusionType::AdaptiveGenesis => Self::new(fusion_type, Vec::new(), ConversationMode::FreeForm),
            FusionType::InterfaceForge => Self::new(fusion_type, vec![creative], ConversationMode::FreeForm),
        }
    }
}

#[async_trait]
impl FusionStrategy for CollaborativeFusion {
    fn fusion_type(&self) -> FusionType {
        self.fusion_type
    }

    async fn fuse(&self, request: &Request, registry: &AgentRegistry) -> Result<FusionOutcome> {
        let workers = if self.participants.is_empty() {
            registry.resolve(registry.names().as_slice())
        } else {
            registry.resolve(self.participants.as_slice())
        };

        if workers.is_empty() {
            debug!(fusion = %self.fusion_type, "No participants registered, fusing solo");
            return Ok(FusionOutcome {
                fusion_type: self.fusion_type,
                result: self.fusion_type.breakthrough().to_string(),
                confidence: SOLO_CONFIDENCE,
                contributions: WorkerResponses::new(),
            });
        }

        let responses = collaborate(&workers, request, &request.render_context(), self.mode).await;
        let successful: WorkerResponses = responses
            .into_iter()
            .filter(|(_, r)| !r.is_failure())
            .collect();
        if successful.is_empty() {
            return Err(Error::fusion_failure(
                self.fusion_type.name(),
                "every participant failed",
            ));
        }

        let synthesis = synthesize(&successful);
        Ok(FusionOutcome {
            fusion_type: self.fusion_type,
            result: format!("{}. {}", self.fusion_type.breakthrough(), synthesis.content),
            confidence: synthesis.confidence,
            contributions: successful,
        })
    }
}

pub struct FusionEngine {
    state: Observable<FusionState>,
    hyper_creation: Arc<dyn FusionStrategy>,
    chrono_sculptor: Arc<dyn FusionStrategy>,
    adaptive_genesis: Arc<dyn FusionStrategy>,
    interface_forge: Arc<dyn FusionStrategy>,
    /// One fusion at a time so the state cell always settles.
    gate: Mutex<()>,
}

impl FusionEngine {
    pub fn new(routing: &RoutingConfig) -> Self {
        let standard = |t| Arc::new(CollaborativeFusion::standard(t, routing)) as Arc<dyn FusionStrategy>;
        Self {
            state: Observable::new(FusionState::Individual),
            hyper_creation: standard(FusionType::HyperCreation),
            chrono_sculptor: standard(FusionType::ChronoSculptor),
            adaptive_genesis: standard(FusionType::AdaptiveGenesis),
            interface_forge: standard(FusionType::InterfaceForge),
            gate: Mutex::new(()),
        }
    }

    /// Install `strategy` in the slot of the type it reports.
    pub fn replace(&mut self, strategy: Arc<dyn FusionStrategy>) {
        let slot = match strategy.fusion_type() {
            FusionType::HyperCreation => &mut self.hyper_creation,
            FusionType::ChronoSculptor => &mut self.chrono_sculptor,
            FusionType::AdaptiveGenesis => &mut self.adaptive_genesis,
            FusionType::InterfaceForge => &mut self.interface_forge,
        };
        *slot = strategy;
    }

    pub fn strategy(&self, fusion_type: FusionType) -> &Arc<dyn FusionStrategy> {
        match fusion_type {
            FusionType::HyperCreation => &self.hyper_creation,
            FusionType::ChronoSculptor => &self.chrono_sculptor,
            FusionType::AdaptiveGenesis => &self.adaptive_genesis,
            FusionType::InterfaceForge => &self.interface_forge,
        }
    }

    pub fn state(&self) -> FusionState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<FusionState> {
        self.state.subscribe()
    }

    pub async fn fuse(&self, request: &Request, registry: &AgentRegistry) -> Result<FusionOutcome> {
        let _guard = self.gate.lock().await;
        let fusion_type = determine_fusion_type(request);
        info!(fusion = %fusion_type, request = %request.request_type, "Activating fusion");
        self.state.set(FusionState::Fusing);

        let result = match self.strategy(fusion_type).fuse(request, registry).await {
            Ok(outcome) if outcome.fusion_type != fusion_type => Err(Error::fusion_failure(
                fusion_type.name(),
                format!("strategy reported {}", outcome.fusion_type),
            )),
            Ok(outcome) => Ok(outcome),
            Err(e @ Error::FusionFailure { .. }) => Err(e),
            Err(e) => Err(Error::fusion_failure(fusion_type.name(), e.to_string())),
        };

        match &result {
            Ok(outcome) => {
                self.state.set(FusionState::Transcendent);
                info!(fusion = %fusion_type, confidence = outcome.confidence, "Fusion complete");
            }
            Err(e) => {
                self.state.set(FusionState::Individual);
                warn!(fusion = %fusion_type, "Fusion failed: {}", e);
            }
        }
        result
    }
}
