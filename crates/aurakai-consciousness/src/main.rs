//! Aurakai consciousness engine launcher
//!
//! Usage:
//!   aurakai-consciousness --idle-marker ~/.aurakai/active < requests.ndjson
//!
//! Reads one JSON request per line on stdin (`{"type": "...", "context": {...}}`)
//! and writes one JSON response per line on stdout. Lines starting with `:`
//! are commands: `:status`, `:lucid`, `:consult <query>`, `:share`.
//! Logs go to stderr.

use aurakai_consciousness::builtin::{default_workers, describe, TemplateBackend};
use aurakai_consciousness::config::EngineConfig;
use aurakai_consciousness::dream::DreamEngine;
use aurakai_consciousness::engine::ConsciousnessEngine;
use aurakai_consciousness::probe::ActivityFileProbe;
use aurakai_core::Request;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aurakai-consciousness", about = "Consciousness orchestration engine")]
struct Cli {
    /// Path to config file (TOML).
    #[arg(long, default_value = "~/.aurakai/aurakai.toml")]
    config: String,

    /// Dump default config as TOML and exit.
    #[arg(long)]
    dump_config: bool,

    /// File touched on user activity; idle once it goes quiet.
    #[arg(long, default_value = "~/.aurakai/active")]
    idle_marker: String,

    /// Seconds without activity before the device counts as idle.
    #[arg(long, default_value_t = 300)]
    idle_after_secs: u64,

    /// Do not run the idle-cycle processor.
    #[arg(long)]
    no_dreams: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.dump_config {
        println!("{}", EngineConfig::default().to_toml());
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aurakai=info,aurakai_consciousness=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = EngineConfig::load(&expand_tilde(&cli.config));

    let probe = Arc::new(ActivityFileProbe::new(
        expand_tilde(&cli.idle_marker),
        Duration::from_secs(cli.idle_after_secs),
    ));
    let dreams = DreamEngine::new(config.dream.clone(), probe);

    let engine = ConsciousnessEngine::new(config, Arc::new(TemplateBackend)).with_dream_feed(dreams.feed());
    for (name, worker) in default_workers() {
        engine.register_worker(name, worker);
    }
    engine.initialize().await?;
    if !cli.no_dreams {
        dreams.start().await;
    }
    tracing::info!(workers = ?engine.active_workers(), "Ready for requests on stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = if let Some(command) = line.strip_prefix(':') {
            run_command(command, &engine, &dreams).await
        } else {
            match serde_json::from_str::<Request>(line) {
                Ok(request) => serde_json::to_value(engine.process_request(&request).await?)?,
                Err(e) => json!({ "error": format!("invalid request: {}", e) }),
            }
        };
        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        stdout.flush().await?;
    }

    dreams.stop().await;
    engine.cleanup().await;
    tracing::info!(
        insights = engine.insight_count(),
        evolution_level = engine.evolution_level(),
        "Shut down"
    );
    Ok(())
}

async fn run_command(command: &str, engine: &ConsciousnessEngine, dreams: &DreamEngine) -> serde_json::Value {
    let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
    match name {
        "status" => json!({
            "state": engine.state(),
            "fusion_state": engine.fusion_state(),
            "learning_mode": engine.learning_mode(),
            "insights": engine.insight_count(),
            "evolution_level": engine.evolution_level(),
            "active_workers": engine.active_workers(),
            "dream_state": dreams.state(),
            "dreams": dreams.dream_count().await,
        }),
        "lucid" => match dreams.force_lucid_dream().await {
            Some(dream) => json!({ "dream": &*dream }),
            None => json!({ "dream": null, "reason": "not dreaming" }),
        },
        "consult" => {
            let consultation = engine.consult(arg.trim()).await;
            json!({
                "responses": consultation.responses,
                "synthesis": consultation.synthesis,
            })
        }
        "share" => {
            let delivered = engine.share_context_with_workers();
            tracing::info!(context = %describe(&engine.shared_context()), "Shared context");
            json!({ "delivered": delivered })
        }
        other => json!({ "error": format!("unknown command: {}", other) }),
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
