//! Ringed planet: atmosphere, shaded body, banding, shadow and ring.

use glam::{Affine2, IVec2, Vec2};
use skyglow_raster::{BlendMode, Canvas, MAX_DIMENSION, Paint, RadialGradient, RasterError, Rgba};
use skyglow_scene::Planet;

const BAND_COUNT: usize = 10;
/// Ring stroke width relative to the planet radius.
const RING_STROKE: f32 = 0.18;
/// Device pixels a cached layer may lag behind the animated planet.
const SPRITE_TOLERANCE_PX: f32 = 0.5;

/// Frame the ring is stroked in: origin at the planet, x axis along the tilt.
/// Only the translation depends on where the planet is. [`paint_ring`]
/// builds the same frame on the canvas.
pub fn ring_frame(base: Affine2, center: Vec2, tilt: f32) -> Affine2 {
    base * Affine2::from_translation(center) * Affine2::from_angle(tilt)
}

/// Soft halo around the body, screened onto what is below.
pub fn paint_atmosphere(canvas: &mut Canvas, planet: &Planet, c: Vec2) {
    let r = planet.radius;
    let tint = planet.tint;
    canvas.save();
    canvas.set_blend_mode(BlendMode::Screen);
    let glow = RadialGradient::concentric(c, r * 0.72, r * 1.25)
        .with_stop(0.0, tint.shade(22.0).to_rgba(0.0))
        .with_stop(0.65, tint.shade(20.0).to_rgba(0.12))
        .with_stop(1.0, tint.shade(18.0).to_rgba(0.0));
    canvas.fill_circle(c, r * 1.25, &glow.into());
    canvas.restore();
}

/// Shaded disc with banding and a terminator shadow, clipped to the disc.
pub fn paint_body(canvas: &mut Canvas, planet: &Planet, c: Vec2, clock: f32) {
    let r = planet.radius;
    let tint = planet.tint;

    // Lit from the upper left.
    let body = RadialGradient::new(c - Vec2::splat(r * 0.35), r * 0.2, c, r)
        .with_stop(0.0, tint.shade(20.0).to_rgba(0.98))
        .with_stop(0.45, tint.shade(6.0).to_rgba(0.98))
        .with_stop(1.0, tint.shade(-18.0).to_rgba(0.98));
    canvas.fill_circle(c, r, &body.into());

    canvas.save();
    canvas.clip_circle(c, r);

    canvas.set_global_alpha(0.18);
    let band_paint = Paint::Solid(tint.shade(28.0).to_rgba(0.4));
    for i in 0..BAND_COUNT {
        let y = c.y - r + (i as f32 / BAND_COUNT as f32) * (r * 2.0);
        let wob = band_wobble(planet, i, clock);
        canvas.stroke_cubic(
            Vec2::new(c.x - r, y),
            Vec2::new(c.x - r * 0.2, y + wob),
            Vec2::new(c.x + r * 0.2, y - wob),
            Vec2::new(c.x + r, y),
            1.0,
            &band_paint,
        );
    }
    canvas.set_global_alpha(1.0);

    let shadow = RadialGradient::new(c + Vec2::splat(r * 0.3), r * 0.2, c, r)
        .with_stop(0.0, Rgba::TRANSPARENT)
        .with_stop(1.0, Rgba::BLACK.with_alpha(0.35));
    canvas.fill_circle(c, r, &shadow.into());

    canvas.restore();
}

/// Tilted ring outline, screened so it lightens whatever it crosses.
pub fn paint_ring(canvas: &mut Canvas, planet: &Planet, c: Vec2) {
    let Some(ring) = planet.ring else {
        return;
    };
    let r = planet.radius;
    canvas.save();
    canvas.translate(c);
    canvas.rotate(ring.tilt);
    canvas.set_blend_mode(BlendMode::Screen);
    canvas.stroke_ellipse(
        Vec2::ZERO,
        ring_radii(r, ring.width),
        r * RING_STROKE,
        &Paint::Solid(planet.tint.shade(28.0).to_rgba(ring.alpha)),
    );
    canvas.restore();
}

fn ring_radii(r: f32, width: f32) -> Vec2 {
    let rx = r * (1.08 + width);
    Vec2::new(rx, rx * 0.33)
}

/// Vertical offset of the control points of band `i`.
fn band_wobble(planet: &Planet, i: usize, clock: f32) -> f32 {
    (clock * 0.25 + i as f32 * 0.7 + planet.wobble_phase).sin() * (planet.radius * 0.06)
}

/// One planet layer painted into its own small canvas, composited whole.
struct Sprite {
    canvas: Canvas,
    origin: IVec2,
    blend: BlendMode,
}

impl Sprite {
    /// Paint a layer whose shapes stay inside the user box `min..max` of
    /// `frame`. The sprite's pixel grid lines up with the target's, so
    /// compositing it matches painting the layer directly.
    fn paint<F>(
        previous: Option<Sprite>,
        base: Affine2,
        frame: Affine2,
        (min, max): (Vec2, Vec2),
        blend: BlendMode,
        draw: F,
    ) -> Result<Self, RasterError>
    where
        F: FnOnce(&mut Canvas),
    {
        let mut dmin = Vec2::splat(f32::INFINITY);
        let mut dmax = Vec2::splat(f32::NEG_INFINITY);
        for corner in [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)] {
            let d = frame.transform_point2(corner);
            dmin = dmin.min(d);
            dmax = dmax.max(d);
        }
        let first = (dmin - 1.0).floor();
        let span = (dmax + 1.0).ceil() - first;
        if !first.is_finite() || !span.is_finite() {
            return Err(RasterError::ZeroDimensions {
                width: 0,
                height: 0,
            });
        }
        if span.max_element() > MAX_DIMENSION as f32 {
            return Err(RasterError::TooLarge {
                width: span.x as u32,
                height: span.y as u32,
                max: MAX_DIMENSION,
            });
        }
        let origin = first.as_ivec2();
        let size = span.max(Vec2::ONE).as_uvec2();

        let mut canvas = match previous {
            Some(s) if s.canvas.width() == size.x && s.canvas.height() == size.y => {
                let mut canvas = s.canvas;
                canvas.clear(Rgba::TRANSPARENT);
                canvas
            }
            _ => Canvas::new(size.x, size.y)?,
        };
        canvas.set_transform(Affine2::from_translation(-origin.as_vec2()) * base);
        draw(&mut canvas);
        Ok(Self {
            canvas,
            origin,
            blend,
        })
    }

    fn composite_onto(&self, target: &mut Canvas) {
        target.composite(&self.canvas, self.origin, self.blend);
    }
}

/// The planet's layers painted once and reused while the planet moves by
/// less than half a device pixel.
pub struct PlanetLayers {
    atmosphere: Sprite,
    body: Sprite,
    ring: Option<Sprite>,
    base: Affine2,
    center: Vec2,
    radius: f32,
    clock: f32,
}

impl PlanetLayers {
    /// Paint `planet` at `clock` under the target's transform `base`,
    /// reusing the allocations of `previous` where the sizes still fit.
    pub fn paint(
        previous: Option<PlanetLayers>,
        base: Affine2,
        planet: &Planet,
        clock: f32,
    ) -> Result<Self, RasterError> {
        let (atmosphere, body, ring) = match previous {
            Some(p) => (Some(p.atmosphere), Some(p.body), p.ring),
            None => (None, None, None),
        };
        let c = planet.draw_center(clock);
        let r = planet.radius;

        let glow = Vec2::splat(r * 1.25);
        let atmosphere = Sprite::paint(
            atmosphere,
            base,
            base,
            (c - glow, c + glow),
            BlendMode::Screen,
            |canvas| paint_atmosphere(canvas, planet, c),
        )?;
        let disc = Vec2::splat(r);
        let body = Sprite::paint(
            body,
            base,
            base,
            (c - disc, c + disc),
            BlendMode::SourceOver,
            |canvas| paint_body(canvas, planet, c, clock),
        )?;
        let ring = match planet.ring {
            Some(shape) => {
                let extent = ring_radii(r, shape.width) + Vec2::splat(r * RING_STROKE * 0.5);
                Some(Sprite::paint(
                    ring,
                    base,
                    ring_frame(base, c, shape.tilt),
                    (-extent, extent),
                    BlendMode::Screen,
                    |canvas| paint_ring(canvas, planet, c),
                )?)
            }
            None => None,
        };

        Ok(Self {
            atmosphere,
            body,
            ring,
            base,
            center: c,
            radius: r,
            clock,
        })
    }

    /// Whether these layers still stand in for `planet` at `clock` under
    /// `base`: same transform, and neither the body nor its bands have moved
    /// by half a device pixel.
    pub fn is_current(&self, base: Affine2, planet: &Planet, clock: f32) -> bool {
        if self.base != base || self.radius != planet.radius {
            return false;
        }
        let scale = base.matrix2.determinant().abs().sqrt();
        let moved = planet.draw_center(clock).distance(self.center) * scale;
        // The band control points move at most 0.25 * 0.06r per clock unit.
        let bands = (clock - self.clock).abs() * 0.25 * planet.radius * 0.06 * scale;
        moved < SPRITE_TOLERANCE_PX && bands < SPRITE_TOLERANCE_PX
    }

    /// Composite the layers in paint order.
    pub fn composite_onto(&self, target: &mut Canvas) {
        self.atmosphere.composite_onto(target);
        self.body.composite_onto(target);
        if let Some(ring) = &self.ring {
            ring.composite_onto(target);
        }
    }
}
