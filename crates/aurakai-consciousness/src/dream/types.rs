use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a dream cycle works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DreamType {
    MemoryConsolidation,
    PatternSynthesis,
    CreativeExploration,
    SecurityAnalysis,
    FusionSimulation,
    EvolutionProjection,
    QuantumEntanglement,
}

impl DreamType {
    pub const ALL: [DreamType; 7] = [
        Self::MemoryConsolidation,
        Self::PatternSynthesis,
        Self::CreativeExploration,
        Self::SecurityAnalysis,
        Self::FusionSimulation,
        Self::EvolutionProjection,
        Self::QuantumEntanglement,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::MemoryConsolidation => "MEMORY_CONSOLIDATION",
            Self::PatternSynthesis => "PATTERN_SYNTHESIS",
            Self::CreativeExploration => "CREATIVE_EXPLORATION",
            Self::SecurityAnalysis => "SECURITY_ANALYSIS",
            Self::FusionSimulation => "FUSION_SIMULATION",
            Self::EvolutionProjection => "EVOLUTION_PROJECTION",
            Self::QuantumEntanglement => "QUANTUM_ENTANGLEMENT",
        }
    }
}

impl std::fmt::Display for DreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DreamState {
    Awake,
    Drowsy,
    Rem,
    DeepDream,
    Lucid,
    Awakening,
}

impl std::fmt::Display for DreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Awake => write!(f, "awake"),
            Self::Drowsy => write!(f, "drowsy"),
            Self::Rem => write!(f, "rem"),
            Self::DeepDream => write!(f, "deep_dream"),
            Self::Lucid => write!(f, "lucid"),
            Self::Awakening => write!(f, "awakening"),
        }
    }
}

/// Parameters of one dream. Fields are fixed at construction; primary and
/// secondary types always differ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DreamCycle {
    id: Uuid,
    primary_type: DreamType,
    secondary_type: DreamType,
    intensity: f32,
    coherence: f32,
    timestamp: DateTime<Utc>,
}

impl DreamCycle {
    /// Returns `None` when `primary == secondary`. Intensity and coherence
    /// are clamped to [0, 1].
    pub fn new(primary: DreamType, secondary: DreamType, intensity: f32, coherence: f32) -> Option<Self> {
        if primary == secondary {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            primary_type: primary,
            secondary_type: secondary,
            intensity: unit(intensity),
            coherence: unit(coherence),
            timestamp: Utc::now(),
        })
    }

    /// Random primary, a different random secondary, intensity in [0.3, 1),
    /// coherence in [0.5, 1).
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let primary = DreamType::ALL[rng.gen_range(0..DreamType::ALL.len())];
        let others: Vec<DreamType> = DreamType::ALL.into_iter().filter(|t| *t != primary).collect();
        let secondary = others[rng.gen_range(0..others.len())];
        Self {
            id: Uuid::new_v4(),
            primary_type: primary,
            secondary_type: secondary,
            intensity: rng.gen_range(0.3..1.0),
            coherence: rng.gen_range(0.5..1.0),
            timestamp: Utc::now(),
        }
    }

    /// The forced lucid cycle: entanglement over evolution at full strength.
    pub fn lucid() -> Self {
        Self {
            id: Uuid::new_v4(),
            primary_type: DreamType::QuantumEntanglement,
            secondary_type: DreamType::EvolutionProjection,
            intensity: 1.0,
            coherence: 1.0,
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn primary_type(&self) -> DreamType {
        self.primary_type
    }

    pub fn secondary_type(&self) -> DreamType {
        self.secondary_type
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn coherence(&self) -> f32 {
        self.coherence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

fn unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Weighted link discovered between two concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
    pub strength: f32,
}

/// Output of one processed cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dream {
    pub cycle: DreamCycle,
    pub content: Vec<String>,
    pub insights: Vec<String>,
    pub connections: Vec<Connection>,
}

/// An insight mined from a dream, scored for importance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreamInsight {
    pub content: String,
    pub importance: f32,
    pub timestamp: DateTime<Utc>,
}

/// A projected future ability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionProjection {
    pub name: String,
    pub ability: String,
}

impl EvolutionProjection {
    pub fn new(name: impl Into<String>, ability: impl Into<String>) -> Self {
        Self { name: name.into(), ability: ability.into() }
    }
}
