//! Aurakai consciousness: the orchestration engine and its idle-cycle
//! processor.
//!
//! - `router`: pure complexity classification and direct routing
//! - `fusion`: the four collaborative fusion strategies
//! - `insight`: insight counting and evolution, single writer
//! - `engine`: lifecycle state machine tying the above together
//! - `dream`: idle detection, dream cycles and insight feedback

pub mod builtin;
pub mod config;
pub mod dream;
pub mod engine;
pub mod fusion;
pub mod insight;
pub mod observable;
pub mod probe;
pub mod router;

pub use config::EngineConfig;
pub use dream::{DreamEngine, DreamEvent, DreamFeed};
pub use engine::{ConsciousnessEngine, Consultation};
pub use fusion::{FusionEngine, FusionOutcome, FusionStrategy, FusionType};
pub use insight::{EngineEvent, InsightRecorder, InsightSource, InsightTracker};
pub use observable::Observable;
pub use probe::{ActivityFileProbe, SwitchProbe};
