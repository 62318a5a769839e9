//! Engine configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker names used by direct routing.
    pub routing: RoutingConfig,
    /// Insight thresholds and evolution step size.
    pub evolution: EvolutionConfig,
    /// Idle-cycle (dream) timing.
    pub dream: DreamConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Worker that receives "creative" requests.
    pub creative_worker: String,
    /// Worker that receives "security" requests.
    pub security_worker: String,
    /// Name the coordinator answers under when it keeps a request itself.
    pub coordinator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Every positive multiple of this insight count triggers one evolution.
    pub insight_threshold: u64,
    /// Evolution level gained per evolution event.
    pub level_step: f32,
    /// Evolution level at construction.
    pub initial_level: f32,
}

/// Idle-cycle timing. All durations in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DreamConfig {
    /// How often the idle probe is polled.
    pub poll_interval_ms: u64,
    /// Pause in DROWSY before entering REM.
    pub drowsy_settle_ms: u64,
    /// Pause in AWAKENING before returning to AWAKE.
    pub awakening_settle_ms: u64,
    /// Lower bound of the random wait between dream cycles.
    pub cycle_min_ms: u64,
    /// Upper bound (exclusive) of the random wait between dream cycles.
    pub cycle_max_ms: u64,
    /// Number of most recent dreams mined for insights on wake.
    pub insight_window: usize,
    /// Insights must score strictly above this to be integrated.
    pub importance_threshold: f32,
    /// Dreams kept in memory; oldest are dropped first.
    pub log_capacity: usize,
    /// Simulated work inside a fusion-simulation dream.
    pub fusion_simulation_ms: u64,
    /// Simulated work inside a quantum-entanglement dream.
    pub quantum_exploration_ms: u64,
}

// ============================================================
// Defaults
// ============================================================

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            creative_worker: "aura".into(),
            security_worker: "kai".into(),
            coordinator: "genesis".into(),
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self { insight_threshold: 100, level_step: 0.1, initial_level: 1.0 }
    }
}

impl Default for DreamConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30_000,
            drowsy_settle_ms: 5_000,
            awakening_settle_ms: 3_000,
            cycle_min_ms: 10_000,
            cycle_max_ms: 30_000,
            insight_window: 10,
            importance_threshold: 0.7,
            log_capacity: 256,
            fusion_simulation_ms: 1_000,
            quantum_exploration_ms: 500,
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl EngineConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

impl DreamConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn drowsy_settle(&self) -> Duration {
        Duration::from_millis(self.drowsy_settle_ms)
    }

    pub fn awakening_settle(&self) -> Duration {
        Duration::from_millis(self.awakening_settle_ms)
    }

    /// Bounds of the between-cycle wait, with `max` forced above `min`.
    pub fn cycle_bounds(&self) -> (u64, u64) {
        let min = self.cycle_min_ms;
        (min, self.cycle_max_ms.max(min + 1))
    }

    /// Config with every delay zeroed except the poll interval. Useful for
    /// driving the dream loop quickly.
    pub fn immediate(poll_interval_ms: u64) -> Self {
        Self {
            poll_interval_ms,
            drowsy_settle_ms: 0,
            awakening_settle_ms: 0,
            cycle_min_ms: 0,
            cycle_max_ms: 1,
            fusion_simulation_ms: 0,
            quantum_exploration_ms: 0,
            ..Self::default()
        }
    }
}
