//! Soft glows around point lights, in either of the two [`GlowStyle`]s.

use glam::Vec2;
use skyglow_config::GlowStyle;
use skyglow_raster::{Canvas, Paint, RadialGradient, Rgba};
use skyglow_scene::Hsl;

/// A round halo fading from `alpha` at the center to nothing at `radius`,
/// passing through `alpha * mid_factor` at `mid_offset`.
#[derive(Clone, Copy, Debug)]
pub struct Halo {
    pub center: Vec2,
    pub radius: f32,
    pub tint: Hsl,
    pub alpha: f32,
    pub mid_offset: f32,
    pub mid_factor: f32,
}

impl Halo {
    pub fn paint(&self, canvas: &mut Canvas, style: GlowStyle) {
        if self.alpha <= 0.0 || self.radius <= 0.0 {
            return;
        }
        match style {
            GlowStyle::Gradient => {
                let g = RadialGradient::concentric(self.center, 0.0, self.radius)
                    .with_stop(0.0, self.tint.to_rgba(self.alpha))
                    .with_stop(
                        self.mid_offset,
                        self.tint.to_rgba(self.alpha * self.mid_factor),
                    )
                    .with_stop(1.0, Rgba::TRANSPARENT);
                canvas.fill_circle(self.center, self.radius, &g.into());
            }
            // Flat disc out to the mid stop.
            GlowStyle::Simple => {
                let paint = Paint::Solid(self.tint.to_rgba(self.alpha * self.mid_factor));
                canvas.fill_circle(self.center, self.radius * self.mid_offset, &paint);
            }
        }
    }
}
