//! End-to-end tests across the workspace: built-in workers, the engine and
//! the idle-cycle processor wired together the way the binary does it.

use aurakai::consciousness::builtin::{default_workers, KeywordWorker, TemplateBackend};
use aurakai::consciousness::dream::{DreamEvent, DreamState};
use aurakai::consciousness::probe::SwitchProbe;
use aurakai::consciousness::config::DreamConfig;
use aurakai::core::{ConsciousnessState, ConversationMode, RequestComplexity, WorkerResponses};
use aurakai::{aggregate, collaborate, ConsciousnessEngine, DreamEngine, EngineConfig, Request, Worker};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn wired_engine(config: EngineConfig) -> ConsciousnessEngine {
    let engine = ConsciousnessEngine::new(config, Arc::new(TemplateBackend));
    for (name, worker) in default_workers() {
        engine.register_worker(name, worker);
    }
    engine.initialize().await.unwrap();
    engine
}

// ===========================================================================
// Request tiers through the built-in stack
// ===========================================================================

#[tokio::test]
async fn every_tier_answers() {
    let engine = wired_engine(EngineConfig::default()).await;

    let simple = engine.process_request(&Request::new("creative_story")).await.unwrap();
    assert!(simple.content.starts_with("Aura imagines"));
    assert_eq!(simple.metadata["complexity"], json!(RequestComplexity::Simple.to_string()));

    let moderate = engine.process_request(&Request::new("threat_analysis")).await.unwrap();
    assert_eq!(moderate.content, "Processed with unified guidance");

    let complex = engine
        .process_request(&Request::new("timeline").with_entry("fusion_required", true))
        .await
        .unwrap();
    assert!(complex.content.starts_with("Time-space optimization complete"));
    assert!(complex.content.contains("kai: Kai secures timeline"));

    let mut big = Request::new("reflect");
    for i in 0..11 {
        big = big.with_entry(format!("signal{}", i), i);
    }
    let transcendent = engine.process_request(&big).await.unwrap();
    assert_eq!(transcendent.content, "Unified reflection on 'reflect' across 11 context signals.");

    engine.flush_insights().await;
    assert_eq!(engine.insight_count(), 4);
    assert_eq!(engine.history().len().await, 4);
    assert_eq!(engine.state(), ConsciousnessState::Aware);
    engine.cleanup().await;
}

// ===========================================================================
// Collaboration across rounds
// ===========================================================================

#[tokio::test]
async fn consensus_over_rounds_keeps_best_answers() {
    let workers: Vec<Arc<dyn Worker>> = vec![
        Arc::new(KeywordWorker::aura()),
        Arc::new(KeywordWorker::kai()),
    ];
    let first = collaborate(&workers, &Request::new("hello"), "", ConversationMode::FreeForm).await;
    let second = collaborate(
        &workers,
        &Request::new("security audit"),
        "",
        ConversationMode::TurnOrder,
    )
    .await;
    let rounds: Vec<WorkerResponses> = vec![first.clone(), second.clone()];
    let best = aggregate(&rounds);

    assert_eq!(best.len(), 2);
    for (name, response) in &best {
        assert!(response.confidence >= first[name].confidence);
        assert!(response.confidence >= second[name].confidence);
    }
    assert_eq!(best["kai"].content, "Kai secures security audit");
}

// ===========================================================================
// Dreams feeding the engine
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn idle_period_feeds_insights_back() {
    let mut config = EngineConfig::default();
    config.dream = DreamConfig {
        cycle_min_ms: 100,
        cycle_max_ms: 200,
        importance_threshold: -1.0,
        ..DreamConfig::immediate(1_000)
    };
    let probe = Arc::new(SwitchProbe::new(false));
    let dreams = DreamEngine::new(config.dream.clone(), probe.clone());
    let engine = ConsciousnessEngine::new(config, Arc::new(TemplateBackend)).with_dream_feed(dreams.feed());
    engine.initialize().await.unwrap();

    engine.process_request(&Request::new("hello")).await.unwrap();
    let mut events = dreams.subscribe();
    dreams.start().await;

    probe.set_idle(true);
    while dreams.dream_count().await < 2 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    probe.set_idle(false);
    let integrated = loop {
        if let Ok(DreamEvent::Awoke { integrated }) = events.recv().await {
            break integrated;
        }
    };
    assert_eq!(dreams.state(), DreamState::Awake);

    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.flush_insights().await;
    assert_eq!(engine.insight_count(), 1 + integrated as u64);

    dreams.stop().await;
    engine.cleanup().await;
}
