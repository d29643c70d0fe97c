//! Entity records and the [`Scene`] that owns them.

use glam::Vec2;

use crate::palette::{Hsl, Theme};

/// Per-tick probability that an idle shooting-star slot fires.
pub const SHOOTING_STAR_SPAWN_CHANCE: f32 = 0.018;
/// Alpha a shooting star loses per tick.
pub const SHOOTING_STAR_DECAY: f32 = 0.014;

/// Visible area in CSS pixels plus the (capped) device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Copy with the pixel ratio limited to `max`.
    pub fn capped(self, max: f32) -> Self {
        Self {
            pixel_ratio: self.pixel_ratio.min(max),
            ..self
        }
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Backing surface size in device pixels, `floor(css * ratio)` per side.
    pub fn device_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).floor().max(0.0) as u32,
            (self.height * self.pixel_ratio).floor().max(0.0) as u32,
        )
    }
}

/// Depth layer a star is painted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    /// Small and dim, painted behind the planet.
    Far,
    /// Larger and brighter, painted in front of the dust.
    Near,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Star {
    pub position: Vec2,
    pub radius: f32,
    pub base_alpha: f32,
    pub twinkle_speed: f32,
    pub twinkle_phase: f32,
    pub tint: Hsl,
    pub layer: Layer,
}

/// Large, slow, pulsing cloud of color.
#[derive(Clone, Debug, PartialEq)]
pub struct Nebula {
    pub center: Vec2,
    pub radius: f32,
    pub tint: Hsl,
    pub base_alpha: f32,
    /// Alpha for the current tick, written by the pulse simulator.
    pub alpha: f32,
    pub pulse_speed: f32,
    pub pulse_phase: f32,
    pub drift: Vec2,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DustMote {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub base_alpha: f32,
    pub tint: Hsl,
    /// Ticks lived so far.
    pub life: f32,
    pub max_life: f32,
}

/// A pooled slot. Inactive slots keep their last values and are skipped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShootingStar {
    pub head: Vec2,
    pub trail_length: f32,
    pub speed: f32,
    pub alpha: f32,
    /// Direction of travel in radians.
    pub angle: f32,
    pub active: bool,
}

impl ShootingStar {
    /// Unit vector along the direction of travel.
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// End of the trail, `trail_length` behind the head.
    pub fn tail(&self) -> Vec2 {
        self.head - self.direction() * self.trail_length
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ring {
    /// Rotation of the ring plane in radians.
    pub tilt: f32,
    /// Extra radius beyond the body, as a fraction of the planet radius.
    pub width: f32,
    pub alpha: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Planet {
    pub center: Vec2,
    pub radius: f32,
    pub tint: Hsl,
    pub drift: Vec2,
    pub wobble_phase: f32,
    pub ring: Option<Ring>,
}

impl Planet {
    /// Wobble offset along x at `clock`; y uses 0.6 of it.
    pub fn wobble(&self, clock: f32) -> f32 {
        (clock * 0.18 + self.wobble_phase).sin() * (self.radius * 0.01)
    }

    /// Where the body is drawn this tick.
    pub fn draw_center(&self, clock: f32) -> Vec2 {
        let w = self.wobble(clock);
        self.center + Vec2::new(w, w * 0.6)
    }
}

/// Everything that is drawn, owned by one engine and rebuilt on resize.
#[derive(Clone, Debug)]
pub struct Scene {
    pub viewport: Viewport,
    pub theme: Theme,
    pub stars: Vec<Star>,
    pub nebulae: Vec<Nebula>,
    pub dust: Vec<DustMote>,
    pub shooting_stars: Vec<ShootingStar>,
    pub planet: Planet,
    pub spawn_chance: f32,
    pub decay: f32,
}

impl Scene {
    pub fn stars_in(&self, layer: Layer) -> impl Iterator<Item = &Star> {
        self.stars.iter().filter(move |s| s.layer == layer)
    }

    pub fn active_shooting_stars(&self) -> impl Iterator<Item = &ShootingStar> {
        self.shooting_stars.iter().filter(|s| s.active)
    }
}
