//! Vertical background gradient.

use glam::Vec2;
use skyglow_raster::{Canvas, LinearGradient};
use skyglow_scene::{Theme, Viewport};

/// Fill the viewport with the three-stop background gradient, darkening
/// towards the bottom.
pub fn paint_background(canvas: &mut Canvas, viewport: &Viewport, theme: &Theme) {
    let bg = theme.background;
    let gradient = LinearGradient::new(Vec2::ZERO, Vec2::new(0.0, viewport.height))
        .with_stop(0.0, bg.shade(-2.0).to_rgba(1.0))
        .with_stop(0.55, bg.shade(-6.0).to_rgba(1.0))
        .with_stop(1.0, bg.shade(-12.0).to_rgba(1.0));
    canvas.fill_rect(
        Vec2::ZERO,
        Vec2::new(viewport.width, viewport.height),
        &gradient.into(),
    );
}
