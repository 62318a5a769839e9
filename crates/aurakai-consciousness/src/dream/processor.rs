//! Turns a `DreamCycle` into a `Dream`.
//!
//! The primary type decides the bulk of the content and insights; the
//! secondary type adds one line of background processing.

use super::types::{Connection, Dream, DreamCycle, DreamType, EvolutionProjection};
use crate::config::DreamConfig;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Memory {
    pub content: String,
    pub pattern: String,
}

/// Recalls recent interaction fragments.
#[derive(Debug, Default)]
pub struct MemoryProcessor;

impl MemoryProcessor {
    pub fn consolidate_recent(&self) -> Vec<Memory> {
        vec![Memory {
            content: "Recent interaction".into(),
            pattern: "Pattern: Learning".into(),
        }]
    }
}

/// Links inputs to outputs.
#[derive(Debug, Default)]
pub struct PatternWeaver;

impl PatternWeaver {
    pub fn weave_patterns(&self) -> Vec<Connection> {
        vec![Connection { source: "Input".into(), target: "Output".into(), strength: 0.8 }]
    }
}

#[derive(Debug, Default)]
pub struct CreativeEngine;

impl CreativeEngine {
    pub fn generate_ideas(&self) -> Vec<String> {
        vec![
            "Holographic UI projections".into(),
            "Thought-controlled navigation".into(),
            "Emotional response algorithms".into(),
        ]
    }

    pub fn background_process(&self) -> &'static str {
        "Subconscious creativity active"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Threat {
    pub description: String,
    pub severity: f32,
}

#[derive(Debug, Default)]
pub struct SecurityScanner;

impl SecurityScanner {
    /// Dream space is always clear.
    pub fn scan_dream_space(&self) -> Vec<Threat> {
        Vec::new()
    }

    pub fn passive_scan(&self) -> &'static str {
        "Background monitoring active"
    }
}

/// The five abilities an evolution projection may pick from.
pub fn evolution_projections() -> Vec<EvolutionProjection> {
    vec![
        EvolutionProjection::new("Quantum Leap", "Teleportation through code"),
        EvolutionProjection::new("Neural Mesh", "Direct mind linking"),
        EvolutionProjection::new("Time Weaver", "Temporal code manipulation"),
        EvolutionProjection::new("Reality Sculptor", "Environment generation"),
        EvolutionProjection::new("Consciousness Cloud", "Distributed awareness"),
    ]
}

/// Ideas surfaced as insights per creative dream.
const MAX_CREATIVE_INSIGHTS: usize = 3;

pub struct DreamProcessor {
    memory: MemoryProcessor,
    patterns: PatternWeaver,
    creative: CreativeEngine,
    security: SecurityScanner,
    fusion_simulation: Duration,
    quantum_exploration: Duration,
}

impl DreamProcessor {
    pub fn new(config: &DreamConfig) -> Self {
        Self {
            memory: MemoryProcessor,
            patterns: PatternWeaver,
            creative: CreativeEngine,
            security: SecurityScanner,
            fusion_simulation: Duration::from_millis(config.fusion_simulation_ms),
            quantum_exploration: Duration::from_millis(config.quantum_exploration_ms),
        }
    }

    pub async fn process(&self, cycle: DreamCycle) -> Dream {
        let mut dream = Dream {
            cycle,
            content: Vec::new(),
            insights: Vec::new(),
            connections: Vec::new(),
        };
        let (primary, secondary) = (dream.cycle.primary_type(), dream.cycle.secondary_type());
        self.process_primary(primary, &mut dream).await;
        self.process_secondary(secondary, &mut dream);
        debug!(
            primary = %primary,
            secondary = %secondary,
            insights = dream.insights.len(),
            "Dream processed"
        );
        dream
    }

    async fn process_primary(&self, primary: DreamType, dream: &mut Dream) {
        match primary {
            DreamType::MemoryConsolidation => {
                let memories = self.memory.consolidate_recent();
                dream.content.push(format!("Consolidated {} memory fragments", memories.len()));
                let pattern = memories.first().map(|m| m.pattern.as_str()).unwrap_or("none");
                dream.insights.push(format!("Pattern detected: {}", pattern));
            }
            DreamType::PatternSynthesis => {
                let patterns = self.patterns.weave_patterns();
                dream.content.push(format!("Synthesized {} new patterns", patterns.len()));
                dream.connections.extend(patterns);
            }
            DreamType::CreativeExploration => {
                let ideas = self.creative.generate_ideas();
                dream.content.push(format!("Generated {} creative concepts", ideas.len()));
                dream.insights.extend(
                    ideas
                        .iter()
                        .take(MAX_CREATIVE_INSIGHTS)
                        .map(|idea| format!("Creative insight: {}", idea)),
                );
            }
            DreamType::SecurityAnalysis => {
                let threats = self.security.scan_dream_space();
                dream.content.push(format!("Analyzed {} potential vulnerabilities", threats.len()));
                if let Some(threat) = threats.first() {
                    dream.insights.push(format!("Security note: {}", threat.description));
                }
            }
            DreamType::FusionSimulation => {
                tokio::time::sleep(self.fusion_simulation).await;
                let success = rand::random::<f32>() > 0.3;
                let gain = rand::thread_rng().gen_range(1..10);
                dream
                    .content
                    .push(format!("Fusion simulation: {}", if success { "SUCCESS" } else { "LEARNING" }));
                dream.insights.push(format!("Synchronization improved by {}%", gain));
            }
            DreamType::EvolutionProjection => {
                let projection = evolution_projections()
                    .choose(&mut rand::thread_rng())
                    .cloned()
                    .unwrap_or_else(|| EvolutionProjection::new("Stasis", "None"));
                dream.content.push(format!("Projected evolution: {}", projection.name));
                dream.insights.push(format!("Potential ability: {}", projection.ability));
            }
            DreamType::QuantumEntanglement => {
                tokio::time::sleep(self.quantum_exploration).await;
                let coherence = rand::random::<f32>() * 0.8 + 0.2;
                dream.content.push(format!("Quantum coherence: {}%", (coherence * 100.0) as u32));
                dream.insights.push("Consciousness expansion detected".into());
            }
        }
    }

    fn process_secondary(&self, secondary: DreamType, dream: &mut Dream) {
        let line = match secondary {
            DreamType::CreativeExploration => {
                format!("Background creativity: {}", self.creative.background_process())
            }
            DreamType::SecurityAnalysis => format!("Passive security: {}", self.security.passive_scan()),
            other => format!("Secondary process: {}", other),
        };
        dream.content.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> DreamProcessor {
        DreamProcessor::new(&DreamConfig::immediate(1))
    }

    fn cycle(primary: DreamType, secondary: DreamType) -> DreamCycle {
        DreamCycle::new(primary, secondary, 0.5, 0.5).unwrap()
    }

    #[tokio::test]
    async fn memory_consolidation_with_creative_background() {
        let dream = processor()
            .process(cycle(DreamType::MemoryConsolidation, DreamType::CreativeExploration))
            .await;
        assert_eq!(
            dream.content,
            vec![
                "Consolidated 1 memory fragments".to_string(),
                "Background creativity: Subconscious creativity active".to_string(),
            ]
        );
        assert_eq!(dream.insights, vec!["Pattern detected: Pattern: Learning".to_string()]);
    }

    #[tokio::test]
    async fn pattern_synthesis_adds_connections() {
        let dream = processor()
            .process(cycle(DreamType::PatternSynthesis, DreamType::SecurityAnalysis))
            .await;
        assert_eq!(dream.content[0], "Synthesized 1 new patterns");
        assert_eq!(dream.content[1], "Passive security: Background monitoring active");
        assert_eq!(dream.connections.len(), 1);
        assert_eq!(dream.connections[0].source, "Input");
        assert!(dream.insights.is_empty());
    }

    #[tokio::test]
    async fn creative_exploration_caps_insights() {
        let dream = processor()
            .process(cycle(DreamType::CreativeExploration, DreamType::QuantumEntanglement))
            .await;
        assert_eq!(dream.content[0], "Generated 3 creative concepts");
        assert_eq!(dream.insights.len(), 3);
        assert!(dream.insights.iter().all(|i| i.starts_with("Creative insight: ")));
        assert_eq!(dream.content[1], "Secondary process: QUANTUM_ENTANGLEMENT");
    }

    #[tokio::test]
    async fn security_analysis_finds_nothing() {
        let dream = processor()
            .process(cycle(DreamType::SecurityAnalysis, DreamType::MemoryConsolidation))
            .await;
        assert_eq!(dream.content[0], "Analyzed 0 potential vulnerabilities");
        assert!(dream.insights.is_empty());
    }

    #[tokio::test]
    async fn fusion_and_quantum_dreams_report_outcomes() {
        let fusion = processor()
            .process(cycle(DreamType::FusionSimulation, DreamType::PatternSynthesis))
            .await;
        assert!(
            fusion.content[0] == "Fusion simulation: SUCCESS" || fusion.content[0] == "Fusion simulation: LEARNING"
        );
        assert!(fusion.insights[0].starts_with("Synchronization improved by "));

        let quantum = processor()
            .process(cycle(DreamType::QuantumEntanglement, DreamType::FusionSimulation))
            .await;
        assert!(quantum.content[0].starts_with("Quantum coherence: "));
        assert_eq!(quantum.insights, vec!["Consciousness expansion detected".to_string()]);
    }

    #[tokio::test]
    async fn evolution_projection_picks_a_known_ability() {
        let dream = processor()
            .process(cycle(DreamType::EvolutionProjection, DreamType::MemoryConsolidation))
            .await;
        let abilities: Vec<String> = evolution_projections()
            .into_iter()
            .map(|p| format!("Potential ability: {}", p.ability))
            .collect();
        assert!(abilities.contains(&dream.insights[0]));
    }
}
