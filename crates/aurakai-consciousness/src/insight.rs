//! Insight counting and evolution.
//!
//! Every completed request (and every integrated dream insight) becomes one
//! command on an unbounded queue. A single consumer task applies them in
//! order: bump the count, persist the record, then evolve when the new count
//! is a positive multiple of the threshold. Being the only writer means
//! each threshold crossing triggers exactly one evolution, whatever the
//! number of concurrent producers.

use crate::config::EvolutionConfig;
use crate::dream::DreamInsight;
use crate::observable::Observable;
use aurakai_core::{ContextSink, InsightRecord, LearningMode};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Engine-level notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    InsightRecorded { count: u64 },
    Evolved { count: u64, level: f32, mode: LearningMode },
    /// The context sink rejected a record. Processing continued.
    InsightPersistFailed { count: u64, error: String },
}

#[derive(Debug, Clone)]
pub enum InsightSource {
    Request(InsightRecord),
    Dream(DreamInsight),
}

enum Command {
    Record(InsightSource),
    Flush(oneshot::Sender<()>),
}

struct Ledger {
    config: EvolutionConfig,
    sink: Arc<dyn ContextSink>,
    count: Observable<u64>,
    level: Observable<f32>,
    mode: Observable<LearningMode>,
    evolutions: Observable<u64>,
    events: broadcast::Sender<EngineEvent>,
}

pub struct InsightTracker {
    ledger: Arc<Ledger>,
}

/// Producer handle onto a running tracker.
#[derive(Clone)]
pub struct InsightRecorder {
    tx: mpsc::UnboundedSender<Command>,
}

impl InsightTracker {
    pub fn new(config: EvolutionConfig, sink: Arc<dyn ContextSink>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            ledger: Arc::new(Ledger {
                level: Observable::new(config.initial_level),
                config,
                sink,
                count: Observable::new(0),
                mode: Observable::new(LearningMode::Passive),
                evolutions: Observable::new(0),
                events,
            }),
        }
    }

    /// Spawn the consumer task on `tasks`; it stops when `token` is cancelled.
    pub fn start(&self, token: &CancellationToken, tasks: &TaskTracker) -> InsightRecorder {
        let (tx, rx) = mpsc::unbounded_channel();
        tasks.spawn(consume(self.ledger.clone(), rx, token.clone()));
        InsightRecorder { tx }
    }

    /// Raise the learning mode to at least ACTIVE.
    pub fn activate(&self) {
        self.ledger.mode.update(|mode| {
            if *mode < LearningMode::Active {
                *mode = LearningMode::Active;
            }
        });
    }

    pub fn insight_count(&self) -> u64 {
        self.ledger.count.get()
    }

    pub fn evolution_level(&self) -> f32 {
        self.ledger.level.get()
    }

    pub fn learning_mode(&self) -> LearningMode {
        self.ledger.mode.get()
    }

    pub fn evolutions(&self) -> u64 {
        self.ledger.evolutions.get()
    }

    pub fn subscribe_count(&self) -> watch::Receiver<u64> {
        self.ledger.count.subscribe()
    }

    pub fn subscribe_level(&self) -> watch::Receiver<f32> {
        self.ledger.level.subscribe()
    }

    pub fn subscribe_mode(&self) -> watch::Receiver<LearningMode> {
        self.ledger.mode.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.ledger.events.subscribe()
    }
}

impl InsightRecorder {
    /// Queue one insight. Never blocks. Returns false once the tracker has
    /// stopped.
    pub fn record(&self, source: InsightSource) -> bool {
        if self.tx.send(Command::Record(source)).is_err() {
            warn!("Insight tracker stopped, dropping insight");
            return false;
        }
        true
    }

    /// Wait until everything queued before this call has been applied.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn consume(ledger: Arc<Ledger>, mut rx: mpsc::UnboundedReceiver<Command>, token: CancellationToken) {
    debug!("Insight tracker started");
    loop {
        let command = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            command = rx.recv() => command,
        };
        match command {
            Some(Command::Record(source)) => ledger.apply(source).await,
            Some(Command::Flush(ack)) => {
                let _ = ack.send(());
            }
            None => break,
        }
    }
    debug!(count = ledger.count.get(), "Insight tracker stopped");
}

impl Ledger {
    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    async fn apply(&self, source: InsightSource) {
        let count = self.count.get() + 1;
        self.count.set(count);
        self.emit(EngineEvent::InsightRecorded { count });

        match &source {
            InsightSource::Request(record) => {
                if let Err(e) = self.sink.record_insight(record).await {
                    warn!(count, "Failed to persist insight: {}", e);
                    self.emit(EngineEvent::InsightPersistFailed { count, error: e.to_string() });
                }
            }
            InsightSource::Dream(insight) => {
                debug!(count, importance = insight.importance, "Dream insight counted: {}", insight.content);
            }
        }

        let threshold = self.config.insight_threshold;
        if threshold > 0 && count % threshold == 0 {
            self.evolve(count);
        }
    }

    fn evolve(&self, count: u64) {
        let step = self.config.level_step;
        self.level.update(|level| *level += step);
        self.mode.update(|mode| *mode = mode.next());
        self.evolutions.update(|n| *n += 1);
        let (level, mode) = (self.level.get(), self.mode.get());
        info!(count, level, mode = %mode, "Consciousness evolved");
        self.emit(EngineEvent::Evolved { count, level, mode });
    }
}
