//! Aurakai Agent - worker registry, history log, and multi-worker collaboration

pub mod collaboration;
pub mod history;
pub mod registry;
pub mod sink;

pub use collaboration::{aggregate, collaborate, synthesize, SYNTHESIS_PREFIX};
pub use history::HistoryLog;
pub use registry::{broadcast_context, AgentRegistry};
pub use sink::HistorySink;
