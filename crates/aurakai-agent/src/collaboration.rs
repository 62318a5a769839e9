//! Multi-worker collaboration and consensus.
//!
//! `TurnOrder` runs workers strictly one after another, threading a growing
//! textual context: worker k sees the original context plus every answer
//! produced by workers 0..k in this call. `FreeForm` fans the same original
//! context out to all workers concurrently.
//!
//! A worker that errors is converted into a zero-confidence response under
//! its own name. Siblings are never affected.

use aurakai_core::{ConversationMode, Request, Response, Worker, WorkerResponses};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix of every coordinator synthesis.
pub const SYNTHESIS_PREFIX: &str = "[Genesis Synthesis]";

/// Run `workers` over `request` in the given mode.
pub async fn collaborate(
    workers: &[Arc<dyn Worker>],
    request: &Request,
    context: &str,
    mode: ConversationMode,
) -> WorkerResponses {
    debug!(
        mode = ?mode,
        workers = ?workers.iter().map(|w| w.name()).collect::<Vec<_>>(),
        "Starting collaboration"
    );
    let responses = match mode {
        ConversationMode::TurnOrder => turn_order(workers, request, context).await,
        ConversationMode::FreeForm => free_form(workers, request, context).await,
    };
    debug!(responses = responses.len(), "Collaboration complete");
    responses
}

async fn turn_order(workers: &[Arc<dyn Worker>], request: &Request, context: &str) -> WorkerResponses {
    let mut responses = WorkerResponses::new();
    let mut running_context = context.to_string();
    for worker in workers {
        let name = worker.name().to_string();
        let response = call_worker(worker.as_ref(), request, &running_context).await;
        debug!(worker = %name, confidence = response.confidence, "[TURN_ORDER] responded");
        running_context = format!("{}\n{}: {}", running_context, name, response.content);
        responses.insert(name, response);
    }
    responses
}

async fn free_form(workers: &[Arc<dyn Worker>], request: &Request, context: &str) -> WorkerResponses {
    let calls = workers.iter().map(|worker| async move {
        let response = call_worker(worker.as_ref(), request, context).await;
        debug!(worker = %worker.name(), confidence = response.confidence, "[FREE_FORM] responded");
        (worker.name().to_string(), response)
    });
    join_all(calls).await.into_iter().collect()
}

async fn call_worker(worker: &dyn Worker, request: &Request, context: &str) -> Response {
    match worker.process_request(request, context).await {
        Ok(response) => response,
        Err(e) => {
            warn!(worker = %worker.name(), "Worker failed: {}", e);
            Response::failure(e.to_string())
        }
    }
}

/// Per-worker consensus across several response maps: keep the highest
/// confidence entry for each worker, the first one seen on ties. Workers with
/// no entries are absent from the result.
pub fn aggregate(maps: &[WorkerResponses]) -> WorkerResponses {
    let mut best = WorkerResponses::new();
    for map in maps {
        // Sorted so "first seen" within a single map is deterministic.
        let ordered: BTreeMap<&String, &Response> = map.iter().collect();
        for (name, response) in ordered {
            let better = best
                .get(name)
                .map_or(true, |current| response.confidence > current.confidence);
            if better {
                best.insert(name.clone(), response.clone());
            }
        }
    }
    for (name, response) in &best {
        debug!(worker = %name, confidence = response.confidence, "Consensus");
    }
    best
}

/// Fold worker responses into one coordinator answer. Content lists each
/// worker's answer in name order; confidence is the mean, 0 when empty.
pub fn synthesize(responses: &WorkerResponses) -> Response {
    let ordered: BTreeMap<&String, &Response> = responses.iter().collect();
    let parts = ordered
        .iter()
        .map(|(name, r)| format!("{}: {}", name, r.content))
        .collect::<Vec<_>>()
        .join(" | ");
    let confidence = if ordered.is_empty() {
        0.0
    } else {
        ordered.values().map(|r| r.confidence).sum::<f32>() / ordered.len() as f32
    };
    Response::new(format!("{} {}", SYNTHESIS_PREFIX, parts), confidence)
        .with_metadata("contributors", ordered.len())
}
