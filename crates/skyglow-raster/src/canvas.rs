//! The raster surface itself.
//!
//! [`Canvas`] stores premultiplied RGBA `f32` pixels and a stack of drawing
//! states (transform, global alpha, blend mode, circular clips). Shapes are
//! rasterized over their device-space bounding box: each pixel center is
//! mapped back into user space, gets an anti-aliased coverage from a signed
//! distance, samples the paint there and is composited. Large boxes are
//! shaded row-parallel with rayon.

use glam::{Affine2, IVec2, Vec2};
use rayon::prelude::*;

use crate::color::{Rgba, unpremultiply_to_u8};
use crate::error::RasterError;
use crate::paint::Paint;

/// Largest accepted canvas side in pixels.
pub const MAX_DIMENSION: u32 = 8192;

/// Number of line segments a cubic Bézier is flattened into.
const CUBIC_SEGMENTS: usize = 16;

/// Below this many pixels a shape is shaded on the calling thread.
const PARALLEL_MIN_PIXELS: usize = 16 * 1024;

/// Pixels per work item for whole-surface copies and conversions.
const SURFACE_CHUNK: usize = 8 * 1024;

/// How a source pixel combines with what is already on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Porter-Duff source-over.
    #[default]
    SourceOver,
    /// Screen: `src + dst - src * dst`, brightens and never darkens.
    Screen,
}

/// Circular clip in device pixels.
#[derive(Clone, Copy, Debug)]
struct ClipCircle {
    center: Vec2,
    radius: f32,
}

#[derive(Clone, Debug)]
struct DrawState {
    transform: Affine2,
    global_alpha: f32,
    blend: BlendMode,
    clips: Vec<ClipCircle>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine2::IDENTITY,
            global_alpha: 1.0,
            blend: BlendMode::SourceOver,
            clips: Vec::new(),
        }
    }
}

/// Device pixel rectangle `[x0, x1) x [y0, y1)`, already clamped to a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PixelBounds {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelBounds {
    fn width(&self) -> usize {
        (self.x1 - self.x0) as usize
    }

    fn area(&self) -> usize {
        self.width() * (self.y1 - self.y0) as usize
    }
}

/// Everything one draw call needs per pixel, shared by all rows.
struct Pass<'a> {
    inverse: Affine2,
    px: f32,
    alpha: f32,
    blend: BlendMode,
    clips: &'a [ClipCircle],
    paint: &'a Paint,
}

impl Pass<'_> {
    fn shade_row<F>(&self, row: &mut [[f32; 4]], x0: u32, y: u32, coverage_at: &F)
    where
        F: Fn(u32, u32, Vec2, f32) -> f32,
    {
        let center_y = y as f32 + 0.5;
        let step = self.inverse.matrix2.x_axis;
        let mut user = self
            .inverse
            .transform_point2(Vec2::new(x0 as f32 + 0.5, center_y));

        for (x, dst) in (x0..).zip(row.iter_mut()) {
            let p = user;
            user += step;

            let mut cov = 1.0;
            if !self.clips.is_empty() {
                let device = Vec2::new(x as f32 + 0.5, center_y);
                for clip in self.clips {
                    cov *= coverage(device.distance(clip.center) - clip.radius, 1.0);
                }
                if cov <= 0.0 {
                    continue;
                }
            }
            cov *= coverage_at(x, y, p, self.px);
            if cov <= 0.0 {
                continue;
            }
            let k = cov * self.alpha;
            let s = self.paint.sample(p);
            let src = [s[0] * k, s[1] * k, s[2] * k, s[3] * k];
            if src[3] <= 0.0 {
                continue;
            }
            blend_pixel(dst, src, self.blend);
        }
    }
}

/// A 2D drawing surface backed by premultiplied RGBA `f32` pixels.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
    state: DrawState,
    saved: Vec<DrawState>,
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::ZeroDimensions { width, height });
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RasterError::TooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }
    Ok(())
}

/// Anti-aliased coverage from a signed distance (negative inside) measured in
/// user units, where one device pixel spans `px` user units.
#[inline]
fn coverage(signed_distance: f32, px: f32) -> f32 {
    (0.5 - signed_distance / px).clamp(0.0, 1.0)
}

#[inline]
fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    };
    p.distance(a + ab * t)
}

#[inline]
fn blend_pixel(dst: &mut [f32; 4], src: [f32; 4], mode: BlendMode) {
    match mode {
        BlendMode::SourceOver => {
            let inv = 1.0 - src[3];
            for i in 0..4 {
                dst[i] = src[i] + dst[i] * inv;
            }
        }
        BlendMode::Screen => {
            for i in 0..4 {
                dst[i] = src[i] + dst[i] - src[i] * dst[i];
            }
        }
    }
}

impl Canvas {
    /// Allocate a transparent canvas of `width` x `height` device pixels.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        validate_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
            state: DrawState::default(),
            saved: Vec::new(),
        })
    }

    /// Reallocate to a new size, clearing pixels and resetting all drawing state.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RasterError> {
        validate_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        self.pixels = vec![[0.0; 4]; width as usize * height as usize];
        self.state = DrawState::default();
        self.saved.clear();
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied pixels in row-major order.
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[(y * self.width + x) as usize])
    }

    // --- State ---

    /// Push a copy of the current drawing state.
    pub fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    /// Pop the most recently saved state. Unbalanced calls are ignored.
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    pub fn transform(&self) -> Affine2 {
        self.state.transform
    }

    /// Replace the current transform.
    pub fn set_transform(&mut self, transform: Affine2) {
        self.state.transform = transform;
    }

    /// Post-multiply a translation, like `ctx.translate`.
    pub fn translate(&mut self, offset: Vec2) {
        self.state.transform = self.state.transform * Affine2::from_translation(offset);
    }

    /// Post-multiply a rotation in radians, like `ctx.rotate`.
    pub fn rotate(&mut self, angle: f32) {
        self.state.transform = self.state.transform * Affine2::from_angle(angle);
    }

    pub fn global_alpha(&self) -> f32 {
        self.state.global_alpha
    }

    pub fn set_global_alpha(&mut self, alpha: f32) {
        self.state.global_alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend = mode;
    }

    /// Restrict further drawing to a circle given in user space. Clips
    /// accumulate until the enclosing [`restore`](Self::restore).
    pub fn clip_circle(&mut self, center: Vec2, radius: f32) {
        let clip = ClipCircle {
            center: self.state.transform.transform_point2(center),
            radius: radius.max(0.0) * self.device_scale(),
        };
        self.state.clips.push(clip);
    }

    /// Device pixels per user unit under the current transform.
    pub fn device_scale(&self) -> f32 {
        self.state.transform.matrix2.determinant().abs().sqrt()
    }

    // --- Whole-surface operations ---

    /// Overwrite every pixel with `color`, ignoring transform, clip and blend state.
    pub fn clear(&mut self, color: Rgba) {
        let px = color.premultiplied();
        self.pixels.fill(px);
    }

    /// Copy every pixel from a canvas of the same size.
    pub fn copy_from(&mut self, src: &Canvas) -> Result<(), RasterError> {
        if src.width != self.width || src.height != self.height {
            return Err(RasterError::SizeMismatch {
                src_width: src.width,
                src_height: src.height,
                dst_width: self.width,
                dst_height: self.height,
            });
        }
        self.pixels
            .par_chunks_mut(SURFACE_CHUNK)
            .zip(src.pixels.par_chunks(SURFACE_CHUNK))
            .for_each(|(dst, src)| dst.copy_from_slice(src));
        Ok(())
    }

    /// Composite `src` with its top-left corner at device pixel `origin`,
    /// ignoring transform and clips. Global alpha scales the source.
    pub fn composite(&mut self, src: &Canvas, origin: IVec2, mode: BlendMode) {
        let x0 = origin.x.max(0);
        let y0 = origin.y.max(0);
        let x1 = (origin.x + src.width as i32).min(self.width as i32);
        let y1 = (origin.y + src.height as i32).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let alpha = self.state.global_alpha;
        if alpha <= 0.0 {
            return;
        }

        let width = self.width as usize;
        let src_width = src.width as usize;
        let (sx0, sx1) = ((x0 - origin.x) as usize, (x1 - origin.x) as usize);
        let rows = &mut self.pixels[y0 as usize * width..y1 as usize * width];
        let blend_row = |(i, row): (usize, &mut [[f32; 4]])| {
            let sy = (y0 - origin.y) as usize + i;
            let src_row = &src.pixels[sy * src_width + sx0..sy * src_width + sx1];
            for (dst, s) in row[x0 as usize..x1 as usize].iter_mut().zip(src_row) {
                if *s == [0.0; 4] {
                    continue;
                }
                let s = if alpha < 1.0 {
                    [s[0] * alpha, s[1] * alpha, s[2] * alpha, s[3] * alpha]
                } else {
                    *s
                };
                blend_pixel(dst, s, mode);
            }
        };
        if (x1 - x0) as usize * (y1 - y0) as usize >= PARALLEL_MIN_PIXELS {
            rows.par_chunks_mut(width).enumerate().for_each(blend_row);
        } else {
            rows.chunks_mut(width).enumerate().for_each(blend_row);
        }
    }

    /// Straight-alpha RGBA8 bytes, `width * height * 4` long.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write_rgba8(&mut bytes);
        bytes
    }

    /// Like [`to_rgba8`](Self::to_rgba8), reusing `out`'s allocation.
    pub fn write_rgba8(&self, out: &mut Vec<u8>) {
        out.clear();
        out.resize(self.pixels.len() * 4, 0);
        out.par_chunks_mut(SURFACE_CHUNK * 4)
            .zip(self.pixels.par_chunks(SURFACE_CHUNK))
            .for_each(|(bytes, pixels)| {
                for (dst, p) in bytes.chunks_exact_mut(4).zip(pixels) {
                    dst.copy_from_slice(&unpremultiply_to_u8(*p));
                }
            });
    }

    // --- Shapes ---

    /// Fill an axis-aligned rectangle given in user space.
    pub fn fill_rect(&mut self, origin: Vec2, size: Vec2, paint: &Paint) {
        let half = size.abs() * 0.5;
        let center = origin + size * 0.5;
        self.rasterize_shape(center - half, center + half, paint, |p, px| {
            let d = (p - center).abs() - half;
            coverage(d.x.max(d.y), px)
        });
    }

    /// Fill a circle.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint) {
        if radius <= 0.0 {
            return;
        }
        let extent = Vec2::splat(radius);
        self.rasterize_shape(center - extent, center + extent, paint, |p, px| {
            coverage(p.distance(center) - radius, px)
        });
    }

    /// Stroke a straight line with round caps.
    pub fn stroke_line(&mut self, a: Vec2, b: Vec2, width: f32, paint: &Paint) {
        self.stroke_polyline(&[a, b], width, paint);
    }

    /// Stroke connected segments as one shape, so overlapping joints are not
    /// composited twice. Joins and caps are round.
    ///
    /// Each segment only visits its own bounding box; their coverages merge
    /// into one mask (by maximum) that is then composited once.
    pub fn stroke_polyline(&mut self, points: &[Vec2], width: f32, paint: &Paint) {
        if points.len() < 2 || width <= 0.0 {
            return;
        }
        let scale = self.device_scale();
        if !(scale > 0.0) {
            return;
        }
        let px = 1.0 / scale;
        let half_width = width * 0.5;
        let pad = Vec2::splat(half_width);
        let (mut min, mut max) = (points[0], points[0]);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        let Some(bounds) = self.device_bounds(min - pad, max + pad) else {
            return;
        };

        let inverse = self.state.transform.inverse();
        let mask_width = bounds.width();
        let mut mask = vec![0.0f32; bounds.area()];
        for seg in points.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            let Some(sb) = self.device_bounds(a.min(b) - pad, a.max(b) + pad) else {
                continue;
            };
            for y in sb.y0..sb.y1 {
                let row = (y - bounds.y0) as usize * mask_width;
                for x in sb.x0..sb.x1 {
                    let user = inverse.transform_point2(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                    let cov = coverage(distance_to_segment(user, a, b) - half_width, px);
                    let m = &mut mask[row + (x - bounds.x0) as usize];
                    *m = m.max(cov);
                }
            }
        }

        self.rasterize(bounds, paint, |x, y, _, _| {
            mask[(y - bounds.y0) as usize * mask_width + (x - bounds.x0) as usize]
        });
    }

    /// Stroke a cubic Bézier from `p0` to `p3` with control points `p1`, `p2`.
    pub fn stroke_cubic(
        &mut self,
        p0: Vec2,
        p1: Vec2,
        p2: Vec2,
        p3: Vec2,
        width: f32,
        paint: &Paint,
    ) {
        let points: Vec<Vec2> = (0..=CUBIC_SEGMENTS)
            .map(|i| {
                let t = i as f32 / CUBIC_SEGMENTS as f32;
                let u = 1.0 - t;
                p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
            })
            .collect();
        self.stroke_polyline(&points, width, paint);
    }

    /// Stroke an axis-aligned (in user space) ellipse outline.
    pub fn stroke_ellipse(
        &mut self,
        center: Vec2,
        radii: Vec2,
        width: f32,
        paint: &Paint,
    ) {
        if radii.x <= 0.0 || radii.y <= 0.0 || width <= 0.0 {
            return;
        }
        let half_width = width * 0.5;
        let inv_sq = Vec2::ONE / (radii * radii);
        let extent = radii + Vec2::splat(half_width);
        self.rasterize_shape(center - extent, center + extent, paint, |p, px| {
            // First-order distance to the implicit curve: f / |grad f|.
            let q = p - center;
            let f = q.x * q.x * inv_sq.x + q.y * q.y * inv_sq.y - 1.0;
            let grad = 2.0 * q * inv_sq;
            let len = grad.length();
            let d = if len > 1e-6 { f.abs() / len } else { radii.min_element() };
            coverage(d - half_width, px)
        });
    }

    /// Device bounding box of a transformed user-space box, padded by one
    /// pixel for anti-aliasing and clamped to the canvas.
    fn device_bounds(&self, user_min: Vec2, user_max: Vec2) -> Option<PixelBounds> {
        let transform = self.state.transform;
        let corners = [
            user_min,
            Vec2::new(user_max.x, user_min.y),
            user_max,
            Vec2::new(user_min.x, user_max.y),
        ];
        let mut dmin = Vec2::splat(f32::INFINITY);
        let mut dmax = Vec2::splat(f32::NEG_INFINITY);
        for c in corners {
            let d = transform.transform_point2(c);
            dmin = dmin.min(d);
            dmax = dmax.max(d);
        }
        if !dmin.is_finite() || !dmax.is_finite() {
            return None;
        }
        let bounds = PixelBounds {
            x0: (dmin.x - 1.0).floor().max(0.0) as u32,
            y0: (dmin.y - 1.0).floor().max(0.0) as u32,
            x1: ((dmax.x + 1.0).ceil().max(0.0) as u32).min(self.width),
            y1: ((dmax.y + 1.0).ceil().max(0.0) as u32).min(self.height),
        };
        (bounds.x0 < bounds.x1 && bounds.y0 < bounds.y1).then_some(bounds)
    }

    /// Rasterize a shape given by a user-space coverage function. `shape`
    /// maps a user-space point and the user-space size of one device pixel to
    /// a coverage in [0, 1].
    fn rasterize_shape<F>(&mut self, user_min: Vec2, user_max: Vec2, paint: &Paint, shape: F)
    where
        F: Fn(Vec2, f32) -> f32 + Sync,
    {
        if let Some(bounds) = self.device_bounds(user_min, user_max) {
            self.rasterize(bounds, paint, |_, _, p, px| shape(p, px));
        }
    }

    /// Shared scanline loop over `bounds`. `coverage_at` receives the device
    /// pixel, its center in user space and the user-space pixel size.
    fn rasterize<F>(&mut self, bounds: PixelBounds, paint: &Paint, coverage_at: F)
    where
        F: Fn(u32, u32, Vec2, f32) -> f32 + Sync,
    {
        let alpha = self.state.global_alpha;
        if alpha <= 0.0 {
            return;
        }
        let scale = self.device_scale();
        if !(scale > 0.0) {
            return;
        }
        let pass = Pass {
            inverse: self.state.transform.inverse(),
            px: 1.0 / scale,
            alpha,
            blend: self.state.blend,
            clips: &self.state.clips,
            paint,
        };

        let width = self.width as usize;
        let (x0, x1) = (bounds.x0 as usize, bounds.x1 as usize);
        let rows = &mut self.pixels[bounds.y0 as usize * width..bounds.y1 as usize * width];
        let shade = |(i, row): (usize, &mut [[f32; 4]])| {
            pass.shade_row(&mut row[x0..x1], bounds.x0, bounds.y0 + i as u32, &coverage_at);
        };
        if bounds.area() >= PARALLEL_MIN_PIXELS {
            rows.par_chunks_mut(width).enumerate().for_each(shade);
        } else {
            rows.chunks_mut(width).enumerate().for_each(shade);
        }
    }
}
