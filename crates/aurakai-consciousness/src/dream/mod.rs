//! Idle-cycle processing: while the user is idle, the engine "dreams" over
//! its own subsystems and integrates the significant insights on wake.

pub mod engine;
pub mod processor;
pub mod types;

pub use engine::{extract_insights, select_next_state, significant_insights, DreamEngine, DreamEvent, DreamFeed};
pub use processor::DreamProcessor;
pub use types::{Connection, Dream, DreamCycle, DreamInsight, DreamState, DreamType, EvolutionProjection};
