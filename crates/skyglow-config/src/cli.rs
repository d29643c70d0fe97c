//! Command-line argument parsing for Skyglow.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;
use crate::quality::{QualityConfig, QualityTier};

/// Skyglow command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "skyglow", about = "Animated starfield backdrop")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in fullscreen.
    #[arg(long)]
    pub fullscreen: Option<bool>,

    /// Quality tier; replaces the whole quality section.
    #[arg(long, value_enum)]
    pub quality: Option<QualityTier>,

    /// Target frame rate, applied after the quality tier.
    #[arg(long)]
    pub target_fps: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Fixed RNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Render headless and write the last frame to this PNG instead of opening a window.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Number of accepted ticks to simulate before writing the snapshot.
    #[arg(long, default_value_t = 1)]
    pub frames: u32,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(fs) = args.fullscreen {
            self.window.fullscreen = fs;
        }
        if let Some(tier) = args.quality {
            self.quality = QualityConfig::preset(tier);
        }
        if let Some(fps) = args.target_fps {
            self.quality.target_fps = fps;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(seed) = args.seed {
            self.debug.seed = Some(seed);
        }
    }
}
