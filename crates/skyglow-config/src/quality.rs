//! Quality tiers: one struct for every knob that trades fidelity for fill rate.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Named quality presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum QualityTier {
    /// Dense starfield, gradient glows, 30 FPS.
    Full,
    /// Sparser field, flat glows, 24 FPS and no high-DPI backing store.
    Reduced,
}

/// How soft glows (star halos, dust, head glow) are painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlowStyle {
    /// Flat translucent discs.
    Simple,
    /// Radius-scaled radial gradients.
    Gradient,
}

/// Starfield tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QualityConfig {
    /// Square CSS pixels of viewport per star.
    pub star_density: f32,
    /// Fraction of stars placed in the far layer.
    pub far_fraction: f32,
    /// Number of drifting dust motes.
    pub dust_count: usize,
    /// Number of pooled shooting-star slots.
    pub shooting_star_pool: usize,
    /// Accepted ticks per second.
    pub target_fps: u32,
    /// Upper bound on the device pixel ratio used for the backing surface.
    pub max_pixel_ratio: f64,
    /// Glow painting style.
    pub glow_style: GlowStyle,
}

impl QualityConfig {
    /// Returns the preset for `tier`.
    pub fn preset(tier: QualityTier) -> Self {
        match tier {
            QualityTier::Full => Self {
                star_density: 2500.0,
                far_fraction: 0.8,
                dust_count: 30,
                shooting_star_pool: 3,
                target_fps: 30,
                max_pixel_ratio: 1.5,
                glow_style: GlowStyle::Gradient,
            },
            QualityTier::Reduced => Self {
                star_density: 4000.0,
                far_fraction: 0.85,
                dust_count: 18,
                shooting_star_pool: 2,
                target_fps: 24,
                max_pixel_ratio: 1.0,
                glow_style: GlowStyle::Simple,
            },
        }
    }

    /// Milliseconds between accepted ticks.
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.target_fps.max(1) as f64
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.star_density > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "quality.star_density",
                reason: "must be positive",
            });
        }
        if !(0.0..=1.0).contains(&self.far_fraction) {
            return Err(ConfigError::InvalidValue {
                field: "quality.far_fraction",
                reason: "must be within [0, 1]",
            });
        }
        if self.target_fps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "quality.target_fps",
                reason: "must be at least 1",
            });
        }
        if !(self.max_pixel_ratio > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "quality.max_pixel_ratio",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self::preset(QualityTier::Full)
    }
}
