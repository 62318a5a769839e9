//! Idle probes.
//!
//! `ActivityFileProbe` polls the modification time of a marker file that some
//! other process touches on user activity. `SwitchProbe` is flipped by hand.

use async_trait::async_trait;
use aurakai_core::{Error, IdleProbe, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Idle once the marker file has not been modified for `idle_after`.
pub struct ActivityFileProbe {
    path: PathBuf,
    idle_after: Duration,
}

impl ActivityFileProbe {
    pub fn new(path: PathBuf, idle_after: Duration) -> Self {
        Self { path, idle_after }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl IdleProbe for ActivityFileProbe {
    async fn is_idle(&self) -> Result<bool> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| Error::IdleProbe(format!("{}: {}", self.path.display(), e)))?;
        let modified = meta
            .modified()
            .map_err(|e| Error::IdleProbe(format!("{}: {}", self.path.display(), e)))?;
        // A modification time in the future counts as fresh activity.
        let quiet_for = SystemTime::now().duration_since(modified).unwrap_or(Duration::ZERO);
        debug!(path = %self.path.display(), quiet_secs = quiet_for.as_secs(), "Polled activity marker");
        Ok(quiet_for >= self.idle_after)
    }
}

/// Manually switched probe.
#[derive(Debug, Default)]
pub struct SwitchProbe {
    idle: AtomicBool,
    failing: AtomicBool,
}

impl SwitchProbe {
    pub fn new(idle: bool) -> Self {
        Self { idle: AtomicBool::new(idle), failing: AtomicBool::new(false) }
    }

    pub fn set_idle(&self, idle: bool) {
        self.idle.store(idle, Ordering::Release);
    }

    /// While failing, every poll returns an error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }
}

#[async_trait]
impl IdleProbe for SwitchProbe {
    async fn is_idle(&self) -> Result<bool> {
        if self.failing.load(Ordering::Acquire) {
            return Err(Error::IdleProbe("switch probe set to fail".into()));
        }
        Ok(self.idle.load(Ordering::Acquire))
    }
}
