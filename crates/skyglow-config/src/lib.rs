//! Configuration system for Skyglow.
//!
//! Window, quality and debug settings persist to disk as RON. Quality tiers
//! bundle the tunables of the starfield (density, particle budgets, frame
//! rate, pixel ratio cap, glow style) into one struct. CLI overrides are
//! applied on top of whatever was loaded.

mod cli;
mod config;
mod error;
mod quality;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, WindowConfig, default_config_dir};
pub use error::ConfigError;
pub use quality::{GlowStyle, QualityConfig, QualityTier};
