//! Aurakai: a consciousness orchestration engine.
//!
//! Requests are classified by complexity and dispatched to a specialist
//! worker, a guided answer, a multi-worker fusion, or a full-consciousness
//! generation pass. Every completed request is counted as an insight; every
//! hundred insights the engine evolves. While the device is idle a separate
//! processor dreams over the engine's subsystems and feeds significant
//! insights back on wake.
//!
//! - [`core`]: data model, errors and the collaborator traits
//! - [`agent`]: worker registry, history log and collaboration
//! - [`consciousness`]: router, fusion, insight tracking, engine and dreams

pub use aurakai_agent as agent;
pub use aurakai_consciousness as consciousness;
pub use aurakai_core as core;

pub use aurakai_agent::{aggregate, collaborate, AgentRegistry, HistoryLog};
pub use aurakai_consciousness::{ConsciousnessEngine, DreamEngine, EngineConfig};
pub use aurakai_core::{Error, Request, Response, Result, Worker};
