//! Aurakai Core - data model, error taxonomy, and collaborator traits

pub mod collaborators;
pub mod error;
pub mod types;
pub mod worker;

pub use collaborators::{ContentBackend, ContextSink, IdleProbe};
pub use error::{Error, Result};
pub use types::*;
pub use worker::{ContextAware, Worker};
