//! Skyglow: an animated starfield in a window.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p skyglow-app -- --quality reduced` for the lighter tier,
//! or `-- --snapshot sky.png --frames 120` to render headless to a PNG.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use skyglow_app::{ConfigWatcher, run_with_config, write_snapshot};
use skyglow_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    // The file as read is what later edits are compared against.
    let (mut config, on_disk) = match Config::load_or_create(&config_dir) {
        Ok(config) => (config.clone(), Some(config)),
        Err(e) => {
            eprintln!("Failed to load config: {e}, using defaults");
            (Config::default(), None)
        }
    };
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    skyglow_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Some(path) = &args.snapshot {
        match write_snapshot(&config, path, args.frames) {
            Ok(()) => info!("Snapshot written to {}", path.display()),
            Err(e) => {
                error!("Snapshot failed: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    info!(
        "Starting Skyglow {}x{} at {} fps",
        config.window.width, config.window.height, config.quality.target_fps
    );
    let watcher = on_disk.map(|c| ConfigWatcher::new(config_dir, c, Instant::now()));
    run_with_config(config, watcher);
}
