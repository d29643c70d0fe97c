//! Polls `config.ron` so quality edits apply without a restart.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use skyglow_config::{Config, QualityConfig};
use tracing::{info, warn};

/// How often the config file is read back.
pub const CONFIG_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Re-reads the config file now and then and reports changed quality
/// settings. Other sections need a restart.
pub struct ConfigWatcher {
    dir: PathBuf,
    on_disk: Config,
    interval: Duration,
    last_check: Instant,
    failing: bool,
}

impl ConfigWatcher {
    /// Watch `dir/config.ron`, whose contents were last read as `on_disk`.
    pub fn new(dir: PathBuf, on_disk: Config, now: Instant) -> Self {
        Self {
            dir,
            on_disk,
            interval: CONFIG_POLL_INTERVAL,
            last_check: now,
            failing: false,
        }
    }

    /// Read the file again if the poll interval has passed. Returns the new
    /// quality settings when the `quality` section changed since last read.
    pub fn poll(&mut self, now: Instant) -> Option<QualityConfig> {
        if now.saturating_duration_since(self.last_check) < self.interval {
            return None;
        }
        self.last_check = now;

        match self.on_disk.reload(&self.dir) {
            Ok(changed) => {
                self.failing = false;
                let new = changed?;
                let quality_changed = new.quality != self.on_disk.quality;
                self.on_disk = new;
                quality_changed.then(|| {
                    info!("Quality settings changed in {}", self.dir.display());
                    self.on_disk.quality.clone()
                })
            }
            Err(e) => {
                if !self.failing {
                    warn!("Ignoring config file until it reads cleanly again: {e}");
                    self.failing = true;
                }
                None
            }
        }
    }
}
