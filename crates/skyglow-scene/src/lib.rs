//! Starfield scene: theme palette, entity records, scene construction and the
//! per-tick simulators that animate it.

pub mod builder;
pub mod palette;
pub mod scene;
pub mod simulate;

pub use builder::{build_scene, spawn_dust, star_count};
pub use palette::{Hsl, Theme};
pub use scene::{
    DustMote, Layer, Nebula, Planet, Ring, SHOOTING_STAR_DECAY, SHOOTING_STAR_SPAWN_CHANCE, Scene,
    ShootingStar, Star, Viewport,
};
pub use simulate::{dust_alpha, pulse_alpha, step, twinkle_alpha};
