//! Idle-cycle processor.
//!
//! An outer monitor task polls the idle probe. On the first idle poll it
//! enters DROWSY, settles, moves to REM and spawns the dream loop on a child
//! cancellation token. On the first non-idle poll while dreaming it cancels
//! and awaits the dream loop, then walks AWAKENING -> AWAKE while integrating
//! the significant insights of the most recent dreams.
//!
//! `dreaming` is flipped with compare-and-swap on both edges, so enter and
//! exit each happen at most once per idle period.

use super::processor::DreamProcessor;
use super::types::{Dream, DreamCycle, DreamInsight, DreamState};
use crate::config::DreamConfig;
use crate::observable::Observable;
use aurakai_core::IdleProbe;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Lifecycle notifications from the idle-cycle processor.
#[derive(Debug, Clone)]
pub enum DreamEvent {
    /// Idle detected, DROWSY entered.
    Entered,
    /// A cycle completed and was appended to the log.
    Dreamt(Arc<Dream>),
    /// A significant insight was integrated on wake.
    InsightIntegrated(DreamInsight),
    /// Back to AWAKE; `integrated` insights crossed the threshold.
    Awoke { integrated: usize },
}

/// Subscription handle that outlives borrows of the `DreamEngine`.
#[derive(Clone)]
pub struct DreamFeed(broadcast::Sender<DreamEvent>);

impl DreamFeed {
    pub fn subscribe(&self) -> broadcast::Receiver<DreamEvent> {
        self.0.subscribe()
    }
}

/// Next in-dream state from a uniform roll in [0, 1).
pub fn select_next_state(roll: f32) -> DreamState {
    if roll < 0.3 {
        DreamState::Rem
    } else if roll < 0.6 {
        DreamState::DeepDream
    } else if roll < 0.8 {
        DreamState::Lucid
    } else {
        DreamState::Rem
    }
}

/// Score every insight of the last `window` dreams (oldest first).
pub fn extract_insights<F>(dreams: &[Arc<Dream>], window: usize, mut score: F) -> Vec<DreamInsight>
where
    F: FnMut(&str) -> f32,
{
    let start = dreams.len().saturating_sub(window);
    dreams[start..]
        .iter()
        .flat_map(|d| d.insights.iter().map(move |content| (d.cycle.timestamp(), content)))
        .map(|(timestamp, content)| DreamInsight {
            content: content.clone(),
            importance: score(content),
            timestamp,
        })
        .collect()
}

/// Keep insights scoring strictly above `threshold`.
pub fn significant_insights(insights: Vec<DreamInsight>, threshold: f32) -> Vec<DreamInsight> {
    insights.into_iter().filter(|i| i.importance > threshold).collect()
}

struct CycleLoop {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

struct Supervisor {
    token: CancellationToken,
    tasks: TaskTracker,
}

struct Shared {
    config: DreamConfig,
    probe: Arc<dyn IdleProbe>,
    processor: DreamProcessor,
    state: Observable<DreamState>,
    dreaming: AtomicBool,
    log: RwLock<VecDeque<Arc<Dream>>>,
    events: broadcast::Sender<DreamEvent>,
    cycle_loop: Mutex<Option<CycleLoop>>,
}

pub struct DreamEngine {
    shared: Arc<Shared>,
    supervisor: Mutex<Option<Supervisor>>,
}

impl DreamEngine {
    pub fn new(config: DreamConfig, probe: Arc<dyn IdleProbe>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            shared: Arc::new(Shared {
                processor: DreamProcessor::new(&config),
                config,
                probe,
                state: Observable::new(DreamState::Awake),
                dreaming: AtomicBool::new(false),
                log: RwLock::new(VecDeque::new()),
                events,
                cycle_loop: Mutex::new(None),
            }),
            supervisor: Mutex::new(None),
        }
    }

    /// Start the monitor task. Returns false if already running.
    pub async fn start(&self) -> bool {
        let mut slot = self.supervisor.lock().await;
        if slot.is_some() {
            return false;
        }
        let token = CancellationToken::new();
        let tasks = TaskTracker::new();
        tasks.spawn(monitor(self.shared.clone(), token.clone(), tasks.clone()));
        *slot = Some(Supervisor { token, tasks });
        info!(poll_ms = self.shared.config.poll_interval_ms, "Dream monitor started");
        true
    }

    /// Stop monitoring and any in-flight dream loop, leaving the engine AWAKE.
    pub async fn stop(&self) {
        let supervisor = self.supervisor.lock().await.take();
        let Some(supervisor) = supervisor else {
            return;
        };
        supervisor.token.cancel();
        supervisor.tasks.close();
        supervisor.tasks.wait().await;
        self.shared.stop_cycle_loop().await;
        self.shared.dreaming.store(false, Ordering::Release);
        self.shared.state.set(DreamState::Awake);
        info!("Dream monitor stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.supervisor.lock().await.is_some()
    }

    pub fn is_dreaming(&self) -> bool {
        self.shared.is_dreaming()
    }

    pub fn state(&self) -> DreamState {
        self.shared.state.get()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DreamState> {
        self.shared.state.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DreamEvent> {
        self.shared.events.subscribe()
    }

    pub fn feed(&self) -> DreamFeed {
        DreamFeed(self.shared.events.clone())
    }

    /// Up to `count` dreams, most recent first.
    pub async fn recent_dreams(&self, count: usize) -> Vec<Arc<Dream>> {
        self.shared.log.read().await.iter().rev().take(count).cloned().collect()
    }

    pub async fn dream_count(&self) -> usize {
        self.shared.log.read().await.len()
    }

    /// Run one full-strength lucid cycle now. No-op unless dreaming.
    pub async fn force_lucid_dream(&self) -> Option<Arc<Dream>> {
        if !self.shared.is_dreaming() {
            debug!("Lucid dream requested while awake, ignoring");
            return None;
        }
        info!("Forcing lucid dream");
        self.shared.state.set(DreamState::Lucid);
        let dream = self.shared.processor.process(DreamCycle::lucid()).await;
        Some(self.shared.record(dream).await)
    }
}

impl Shared {
    fn is_dreaming(&self) -> bool {
        self.dreaming.load(Ordering::Acquire)
    }

    fn emit(&self, event: DreamEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn probe_idle(&self) -> bool {
        match self.probe.is_idle().await {
            Ok(idle) => idle,
            Err(e) => {
                warn!("Idle probe failed, treating as active: {}", e);
                false
            }
        }
    }

    async fn record(&self, dream: Dream) -> Arc<Dream> {
        let dream = Arc::new(dream);
        {
            let mut log = self.log.write().await;
            log.push_back(dream.clone());
            while log.len() > self.config.log_capacity.max(1) {
                log.pop_front();
            }
        }
        self.emit(DreamEvent::Dreamt(dream.clone()));
        dream
    }

    async fn enter(self: &Arc<Self>, token: &CancellationToken, tasks: &TaskTracker) {
        if self
            .dreaming
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        info!("Idle detected, entering dream state");
        self.state.set(DreamState::Drowsy);
        self.emit(DreamEvent::Entered);

        if sleep_or_cancel(token, self.config.drowsy_settle()).await || !self.is_dreaming() {
            return;
        }
        self.state.set(DreamState::Rem);

        let cycle_token = token.child_token();
        let handle = tasks.spawn(dream_loop(self.clone(), cycle_token.clone()));
        *self.cycle_loop.lock().await = Some(CycleLoop { token: cycle_token, handle });
    }

    async fn exit(self: &Arc<Self>, token: &CancellationToken) {
        if self
            .dreaming
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        info!("Activity detected, waking");
        self.stop_cycle_loop().await;
        self.state.set(DreamState::Awakening);

        let recent: Vec<Arc<Dream>> = self.log.read().await.iter().cloned().collect();
        let insights = extract_insights(&recent, self.config.insight_window, |_| rand::random::<f32>());
        let significant = significant_insights(insights, self.config.importance_threshold);
        for insight in &significant {
            debug!(importance = insight.importance, "Integrating dream insight: {}", insight.content);
            self.emit(DreamEvent::InsightIntegrated(insight.clone()));
        }
        info!(integrated = significant.len(), "Dream insights integrated");

        sleep_or_cancel(token, self.config.awakening_settle()).await;
        self.state.set(DreamState::Awake);
        self.emit(DreamEvent::Awoke { integrated: significant.len() });
    }

    async fn stop_cycle_loop(&self) {
        let running = self.cycle_loop.lock().await.take();
        if let Some(CycleLoop { token, handle }) = running {
            token.cancel();
            if let Err(e) = handle.await {
                warn!("Dream loop ended abnormally: {}", e);
            }
        }
    }

    fn next_wait(&self) -> Duration {
        let (min, max) = self.config.cycle_bounds();
        Duration::from_millis(rand::thread_rng().gen_range(min..max))
    }
}

/// Sleep for `duration`. Returns true if cancelled first.
async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

async fn monitor(shared: Arc<Shared>, token: CancellationToken, tasks: TaskTracker) {
    loop {
        let idle = tokio::select! {
            _ = token.cancelled() => break,
            idle = shared.probe_idle() => idle,
        };
        let dreaming = shared.is_dreaming();
        if idle && !dreaming {
            shared.enter(&token, &tasks).await;
        } else if !idle && dreaming {
            shared.exit(&token).await;
        }
        if sleep_or_cancel(&token, shared.config.poll_interval()).await {
            break;
        }
    }
    debug!("Dream monitor exiting");
}

async fn dream_loop(shared: Arc<Shared>, token: CancellationToken) {
    while shared.is_dreaming() && !token.is_cancelled() {
        let cycle = DreamCycle::random(&mut rand::thread_rng());
        debug!(primary = %cycle.primary_type(), secondary = %cycle.secondary_type(), "Dream cycle");
        let dream = tokio::select! {
            _ = token.cancelled() => break,
            dream = shared.processor.process(cycle) => dream,
        };
        shared.record(dream).await;

        if !shared.is_dreaming() || token.is_cancelled() {
            break;
        }
        shared.state.set(select_next_state(rand::random::<f32>()));
        if sleep_or_cancel(&token, shared.next_wait()).await {
            break;
        }
    }
    debug!("Dream loop exiting");
}
