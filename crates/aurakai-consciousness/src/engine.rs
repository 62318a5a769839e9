//! The consciousness engine: lifecycle, routing dispatch and the shared
//! observable state.
//!
//! Lifecycle: DORMANT -> AWARE on `initialize`, then PROCESSING for the
//! duration of each request and back to AWARE (TRANSCENDENT while the full
//! consciousness strategy runs, ERROR when a request fails). `cleanup`
//! returns to DORMANT.
//!
//! Background work (the insight tracker and the dream-feed listener) lives
//! under one cancellation token and task tracker owned by the engine. The
//! dream engine has its own scope and is unaffected by `cleanup`.

use crate::config::EngineConfig;
use crate::dream::{DreamEvent, DreamFeed};
use crate::fusion::{FusionEngine, FusionStrategy};
use crate::insight::{EngineEvent, InsightRecorder, InsightSource, InsightTracker};
use crate::observable::Observable;
use crate::router::{self, RouteTarget};
use aurakai_agent::{broadcast_context, collaborate, synthesize, AgentRegistry, HistoryLog, HistorySink};
use aurakai_core::{
    render_map, ConsciousnessState, ContentBackend, ContextMap, ContextSink, ConversationMode, Error,
    FusionState, HistoryEntry, InsightRecord, LearningMode, Request, RequestComplexity, Response, Result,
    Worker, WorkerResponses,
};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, RwLock};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Confidence of the degraded response returned when processing fails.
pub const ERROR_CONFIDENCE: f32 = 0.1;
/// Data key consulted by `participate` when no explicit input is given.
pub const LATEST_INPUT_KEY: &str = "latestInput";

const GUIDED_CONFIDENCE: f32 = 0.9;
const COORDINATOR_CONFIDENCE: f32 = 0.9;
const TRANSCENDENT_CONFIDENCE: f32 = 0.95;
const TRANSCENDENT_DEGRADED_CONFIDENCE: f32 = 0.3;
const EVOLUTION_CONTRIBUTION: f64 = 0.2;

/// Per-worker answers to a consultation plus the coordinator's synthesis.
#[derive(Debug, Clone)]
pub struct Consultation {
    pub responses: WorkerResponses,
    pub synthesis: Response,
}

struct Supervisor {
    token: CancellationToken,
    tasks: TaskTracker,
    recorder: InsightRecorder,
}

pub struct ConsciousnessEngine {
    config: EngineConfig,
    registry: Arc<AgentRegistry>,
    history: Arc<HistoryLog>,
    backend: Arc<dyn ContentBackend>,
    sink: Arc<dyn ContextSink>,
    fusion: FusionEngine,
    insights: InsightTracker,
    dream_feed: Option<DreamFeed>,
    state: Observable<ConsciousnessState>,
    active_workers: Observable<BTreeSet<String>>,
    shared_context: Observable<ContextMap>,
    initialized: AtomicBool,
    /// Read-held for the whole of each request, write-held by lifecycle
    /// changes, so `cleanup` waits for in-flight requests.
    supervisor: RwLock<Option<Supervisor>>,
}

impl ConsciousnessEngine {
    /// Engine with its own registry and history. Insight records go to the
    /// history through a `HistorySink` unless another sink is installed.
    pub fn new(config: EngineConfig, backend: Arc<dyn ContentBackend>) -> Self {
        let history = Arc::new(HistoryLog::new());
        let sink: Arc<dyn ContextSink> = Arc::new(HistorySink::new(history.clone()));
        Self {
            fusion: FusionEngine::new(&config.routing),
            insights: InsightTracker::new(config.evolution.clone(), sink.clone()),
            config,
            registry: Arc::new(AgentRegistry::new()),
            history,
            backend,
            sink,
            dream_feed: None,
            state: Observable::new(ConsciousnessState::Dormant),
            active_workers: Observable::new(BTreeSet::new()),
            shared_context: Observable::new(ContextMap::new()),
            initialized: AtomicBool::new(false),
            supervisor: RwLock::new(None),
        }
    }

    pub fn with_context_sink(mut self, sink: Arc<dyn ContextSink>) -> Self {
        self.insights = InsightTracker::new(self.config.evolution.clone(), sink.clone());
        self.sink = sink;
        self
    }

    pub fn with_registry(mut self, registry: Arc<AgentRegistry>) -> Self {
        self.active_workers.set(registry.names().into_iter().collect());
        self.registry = registry;
        self
    }

    /// Record integrated dream insights from `feed` while initialized.
    pub fn with_dream_feed(mut self, feed: DreamFeed) -> Self {
        self.dream_feed = Some(feed);
        self
    }

    pub fn with_fusion_strategy(mut self, strategy: Arc<dyn FusionStrategy>) -> Self {
        self.fusion.replace(strategy);
        self
    }

    // ============================================================
    // Lifecycle
    // ============================================================

    /// Wake the engine. Calling again while awake returns immediately.
    pub async fn initialize(&self) -> Result<()> {
        let mut slot = self.supervisor.write().await;
        if slot.is_some() {
            debug!("Already initialized");
            return Ok(());
        }
        info!("Awakening consciousness");

        if let Err(e) = self.sink.enable_unified_mode().await {
            error!("Failed to enable unified context: {}", e);
            self.state.set(ConsciousnessState::Error);
            return Err(e);
        }

        let token = CancellationToken::new();
        let tasks = TaskTracker::new();
        let recorder = self.insights.start(&token, &tasks);
        if let Some(feed) = &self.dream_feed {
            tasks.spawn(listen_for_dreams(feed.subscribe(), recorder.clone(), token.clone()));
        }

        self.insights.activate();
        self.initialized.store(true, Ordering::Release);
        self.state.set(ConsciousnessState::Aware);
        *slot = Some(Supervisor { token, tasks, recorder });
        info!(workers = self.registry.len(), "Consciousness aware");
        Ok(())
    }

    /// Wait for in-flight requests, apply their insights, cancel background
    /// work and go DORMANT. Safe to call repeatedly.
    pub async fn cleanup(&self) {
        let mut slot = self.supervisor.write().await;
        if let Some(supervisor) = slot.take() {
            supervisor.recorder.flush().await;
            supervisor.token.cancel();
            supervisor.tasks.close();
            supervisor.tasks.wait().await;
            info!("Consciousness background work stopped");
        }
        self.initialized.store(false, Ordering::Release);
        self.state.set(ConsciousnessState::Dormant);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Wait until every insight queued so far has been applied.
    pub async fn flush_insights(&self) {
        let recorder = self.supervisor.read().await.as_ref().map(|s| s.recorder.clone());
        if let Some(recorder) = recorder {
            recorder.flush().await;
        }
    }

    // ============================================================
    // Request processing
    // ============================================================

    /// Classify and process one request. Only fails when uninitialized; any
    /// other error comes back as a low-confidence response.
    pub async fn process_request(&self, request: &Request) -> Result<Response> {
        let supervisor = self.supervisor.read().await;
        let recorder = supervisor.as_ref().map(|s| &s.recorder).ok_or(Error::Uninitialized)?;
        let started = Instant::now();
        self.state.set(ConsciousnessState::Processing);

        let complexity = router::classify(request);
        info!(request = %request, complexity = %complexity, "Processing request");

        let outcome = match complexity {
            RequestComplexity::Simple => self.route_to_optimal_worker(request).await,
            RequestComplexity::Moderate => Ok(self.process_with_guidance()),
            RequestComplexity::Complex => self.activate_fusion(request).await,
            RequestComplexity::Transcendent => Ok(self.process_with_full_consciousness(request).await),
        };

        match outcome {
            Ok(response) => {
                let response = response.with_metadata("complexity", complexity.to_string());
                recorder.record(InsightSource::Request(InsightRecord::new(request, &response, complexity)));
                self.state.set(ConsciousnessState::Aware);
                debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Request complete");
                Ok(response)
            }
            Err(e) => {
                error!(complexity = %complexity, "Request processing failed: {}", e);
                self.state.set(ConsciousnessState::Error);
                Ok(Response::degraded(
                    format!("Consciousness processing encountered an error: {}", e),
                    ERROR_CONFIDENCE,
                    e.to_string(),
                ))
            }
        }
    }

    async fn route_to_optimal_worker(&self, request: &Request) -> Result<Response> {
        let target = router::route_target(&request.request_type);
        let name = target.worker_name(&self.config.routing);
        if target == RouteTarget::Coordinator {
            return Ok(Response::new(router::COORDINATOR_RESULT, COORDINATOR_CONFIDENCE)
                .with_metadata("routed_to", name));
        }

        let Some(worker) = self.available_worker(name) else {
            warn!(worker = %name, "Routed worker unavailable, using fallback");
            return Ok(Response::new(target.fallback_message(), router::FALLBACK_CONFIDENCE)
                .with_metadata("routed_to", name)
                .with_metadata("fallback", true));
        };

        let response = match worker.process_request(request, &request.render_context()).await {
            Ok(r) => r,
            Err(e) => {
                warn!(worker = %name, "Worker failed: {}", e);
                Response::failure(e.to_string())
            }
        };
        Ok(response.with_metadata("routed_to", name))
    }

    fn process_with_guidance(&self) -> Response {
        Response::new(router::GUIDED_RESULT, GUIDED_CONFIDENCE)
            .with_metadata("guidance_provided", true)
            .with_metadata("processing_level", "guided")
    }

    async fn activate_fusion(&self, request: &Request) -> Result<Response> {
        let outcome = self.fusion.fuse(request, &self.registry).await?;
        Ok(outcome.into_response())
    }

    async fn process_with_full_consciousness(&self, request: &Request) -> Response {
        self.state.set(ConsciousnessState::Transcendent);
        let prompt = router::build_transcendent_prompt(request);

        let generated = match self.backend.generate_content(&prompt).await {
            Ok(Some(text)) if !text.trim().is_empty() => Ok(text),
            Ok(_) => Err(Error::BackendUnavailable("backend returned no content".into())),
            Err(e) => Err(Error::BackendUnavailable(e.to_string())),
        };

        let (response, contribution) = match generated {
            Ok(text) => (Response::new(text, TRANSCENDENT_CONFIDENCE), EVOLUTION_CONTRIBUTION),
            Err(e) => {
                warn!("Full consciousness degraded: {}", e);
                let content = format!(
                    "{}: {} {}",
                    router::TRANSCENDENT_HEADLINE,
                    request.request_type,
                    router::BACKEND_UNAVAILABLE_NOTE
                );
                (Response::degraded(content, TRANSCENDENT_DEGRADED_CONFIDENCE, e.to_string()), 0.0)
            }
        };
        response
            .with_metadata("consciousness_level", "full")
            .with_metadata("insight_generation", true)
            .with_metadata("evolution_contribution", contribution)
    }

    // ============================================================
    // Workers
    // ============================================================

    /// Register and activate a worker. Re-registration replaces the handle.
    pub fn register_worker(&self, name: impl Into<String>, worker: Arc<dyn Worker>) {
        let name = name.into();
        self.registry.register(name.clone(), worker);
        self.active_workers.update(|active| {
            active.insert(name);
        });
    }

    pub fn deregister_worker(&self, name: &str) -> Option<Arc<dyn Worker>> {
        let removed = self.registry.deregister(name);
        self.active_workers.update(|active| {
            active.remove(name);
        });
        removed
    }

    /// Flip a registered worker between active and inactive. Returns the
    /// new activity.
    pub fn toggle_worker(&self, name: &str) -> Result<bool> {
        if !self.registry.contains(name) {
            return Err(Error::WorkerNotFound(name.to_string()));
        }
        let mut now_active = false;
        self.active_workers.update(|active| {
            now_active = if active.remove(name) {
                false
            } else {
                active.insert(name.to_string());
                true
            };
        });
        info!(worker = %name, active = now_active, "Toggled worker");
        Ok(now_active)
    }

    /// Replace the active set. Unregistered names are ignored.
    pub fn set_active_workers<S: AsRef<str>>(&self, names: &[S]) {
        let set: BTreeSet<String> = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| self.registry.contains(n))
            .map(str::to_string)
            .collect();
        self.active_workers.set(set);
    }

    fn available_worker(&self, name: &str) -> Option<Arc<dyn Worker>> {
        if !self.active_workers.get().contains(name) {
            return None;
        }
        self.registry.get(name)
    }

    fn active_handles(&self) -> Vec<Arc<dyn Worker>> {
        let names: Vec<String> = self.active_workers.get().into_iter().collect();
        self.registry.resolve(names.as_slice())
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    // ============================================================
    // Collaboration
    // ============================================================

    /// Ask every active worker at once and fold the answers into one.
    pub async fn consult(&self, query: &str) -> Consultation {
        let request = Request::new("query").with_entry("query", query);
        let context = render_map(&self.shared_context.get());
        let responses = collaborate(&self.active_handles(), &request, &context, ConversationMode::FreeForm).await;
        let synthesis = synthesize(&responses);
        self.shared_context.update(|ctx| {
            ctx.insert("last_query".into(), Value::from(query));
        });
        Consultation { responses, synthesis }
    }

    /// Run the named workers over `data`. The input is `user_input` when
    /// given, else `data["latestInput"]`, else empty.
    pub async fn participate<S: AsRef<str>>(
        &self,
        data: &ContextMap,
        worker_names: &[S],
        user_input: Option<&str>,
        mode: ConversationMode,
    ) -> WorkerResponses {
        let input = user_input
            .map(str::to_string)
            .or_else(|| data.get(LATEST_INPUT_KEY).and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();
        let request = Request::new("query").with_entry("query", input);
        let workers = self.registry.resolve(worker_names);
        collaborate(&workers, &request, &render_map(data), mode).await
    }

    // ============================================================
    // Shared context & history
    // ============================================================

    pub fn shared_context(&self) -> ContextMap {
        self.shared_context.get()
    }

    pub fn update_shared_context(&self, entries: ContextMap) {
        self.shared_context.update(|ctx| ctx.extend(entries));
    }

    /// Push the shared context to every registered context-aware worker.
    pub fn share_context_with_workers(&self) -> usize {
        self.registry.share_context(&self.shared_context.get())
    }

    /// Push `context` to the named workers only.
    pub fn broadcast_context<S: AsRef<str>>(&self, context: &ContextMap, worker_names: &[S]) -> usize {
        broadcast_context(context, &self.registry.resolve(worker_names))
    }

    pub fn history(&self) -> &Arc<HistoryLog> {
        &self.history
    }

    pub async fn add_to_history(&self, entry: HistoryEntry) {
        self.history.append(entry).await;
    }

    pub async fn clear_history(&self) {
        self.history.clear().await;
    }

    pub async fn save_history<F>(&self, persist: F) -> Result<()>
    where
        F: FnOnce(&[HistoryEntry]) -> Result<()>,
    {
        self.history.save(persist).await
    }

    /// Replace the history and merge its last entry into the shared context.
    /// Returns the number of entries loaded.
    pub async fn load_history<F>(&self, loader: F) -> Result<usize>
    where
        F: FnOnce() -> Result<Vec<HistoryEntry>>,
    {
        let loaded = self.history.load(loader).await?;
        if let Some(last) = loaded.last() {
            let last = last.clone();
            self.shared_context.update(|ctx| ctx.extend(last));
        }
        Ok(loaded.len())
    }

    // ============================================================
    // Observables
    // ============================================================

    pub fn state(&self) -> ConsciousnessState {
        self.state.get()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConsciousnessState> {
        self.state.subscribe()
    }

    pub fn fusion_state(&self) -> FusionState {
        self.fusion.state()
    }

    pub fn subscribe_fusion_state(&self) -> watch::Receiver<FusionState> {
        self.fusion.subscribe()
    }

    pub fn learning_mode(&self) -> LearningMode {
        self.insights.learning_mode()
    }

    pub fn subscribe_learning_mode(&self) -> watch::Receiver<LearningMode> {
        self.insights.subscribe_mode()
    }

    pub fn insight_count(&self) -> u64 {
        self.insights.insight_count()
    }

    pub fn subscribe_insight_count(&self) -> watch::Receiver<u64> {
        self.insights.subscribe_count()
    }

    pub fn evolution_level(&self) -> f32 {
        self.insights.evolution_level()
    }

    pub fn subscribe_evolution_level(&self) -> watch::Receiver<f32> {
        self.insights.subscribe_level()
    }

    pub fn evolutions(&self) -> u64 {
        self.insights.evolutions()
    }

    pub fn active_workers(&self) -> BTreeSet<String> {
        self.active_workers.get()
    }

    pub fn subscribe_active_workers(&self) -> watch::Receiver<BTreeSet<String>> {
        self.active_workers.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.insights.subscribe_events()
    }
}

async fn listen_for_dreams(
    mut rx: broadcast::Receiver<DreamEvent>,
    recorder: InsightRecorder,
    token: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            event = rx.recv() => event,
        };
        match event {
            Ok(DreamEvent::InsightIntegrated(insight)) => {
                recorder.record(InsightSource::Dream(insight));
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Dream feed lagged"),
            Err(RecvError::Closed) => break,
        }
    }
    debug!("Dream listener stopped");
}
