//! Agent registry: named worker handles with shared-context broadcast.
//!
//! Names are unique keys. Re-registering a name replaces the previous handle
//! (last write wins). Insertion order carries no meaning.

use aurakai_core::{ContextMap, Worker};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of all workers. Thread-safe, concurrent access.
#[derive(Default)]
pub struct AgentRegistry {
    workers: DashMap<String, Arc<dyn Worker>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            workers: DashMap::new(),
        }
    }

    /// Register a worker under `name`. Returns the handle it replaced, if any.
    pub fn register(&self, name: impl Into<String>, worker: Arc<dyn Worker>) -> Option<Arc<dyn Worker>> {
        let name = name.into();
        let previous = self.workers.insert(name.clone(), worker);
        if previous.is_some() {
            info!(worker = %name, "Worker re-registered (replaced previous handle)");
        } else {
            info!(worker = %name, "Worker registered");
        }
        previous
    }

    /// Remove a worker. Returns the removed handle, if it was registered.
    pub fn deregister(&self, name: &str) -> Option<Arc<dyn Worker>> {
        let removed = self.workers.remove(name).map(|(_, w)| w);
        if removed.is_some() {
            info!(worker = %name, "Worker deregistered");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Worker>> {
        self.workers.get(name).map(|w| w.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.workers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.workers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Look up handles for `names` in the given order, skipping unknown names.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Vec<Arc<dyn Worker>> {
        names
            .iter()
            .filter_map(|n| {
                let found = self.get(n.as_ref());
                if found.is_none() {
                    debug!(worker = %n.as_ref(), "Skipping unregistered worker");
                }
                found
            })
            .collect()
    }

    /// Deliver `context` to every registered context-aware worker.
    pub fn share_context(&self, context: &ContextMap) -> usize {
        let targets: Vec<Arc<dyn Worker>> = self.workers.iter().map(|e| e.value().clone()).collect();
        broadcast_context(context, &targets)
    }
}

/// Deliver `context` to each target that supports the context-aware
/// capability; others are silently skipped. Returns the number delivered.
pub fn broadcast_context(context: &ContextMap, targets: &[Arc<dyn Worker>]) -> usize {
    let mut delivered = 0;
    for worker in targets {
        if let Some(aware) = worker.context_aware() {
            aware.set_context(context);
            delivered += 1;
        }
    }
    debug!(delivered, targets = targets.len(), "Context broadcast");
    delivered
}
