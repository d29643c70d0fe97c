//! Paints: solid colors, linear gradients and two-circle radial gradients.
//!
//! Gradients are evaluated in user space (before the canvas transform) and
//! interpolate premultiplied colors between stops, so fading a tint into
//! transparent black never darkens the fringe.

use glam::Vec2;

use crate::color::{Rgba, lerp_premul};

/// A color at a position along a gradient, `offset` in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

/// Gradient along the line from `start` to `end`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    pub start: Vec2,
    pub end: Vec2,
    stops: Vec<ColorStop>,
}

/// Gradient between a start circle `(c0, r0)` and an end circle `(c1, r1)`.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradient {
    pub c0: Vec2,
    pub r0: f32,
    pub c1: Vec2,
    pub r1: f32,
    stops: Vec<ColorStop>,
}

/// What a fill or stroke is colored with.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear(LinearGradient),
    Radial(RadialGradient),
}

/// Insert keeping stops sorted; equal offsets keep insertion order.
fn insert_stop(stops: &mut Vec<ColorStop>, offset: f32, color: Rgba) {
    let offset = offset.clamp(0.0, 1.0);
    let idx = stops.partition_point(|s| s.offset <= offset);
    stops.insert(idx, ColorStop { offset, color });
}

/// Premultiplied color at parameter `t`, padding beyond the end stops.
fn sample_stops(stops: &[ColorStop], t: f32) -> [f32; 4] {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return [0.0; 4];
    };
    if t <= first.offset {
        return first.color.premultiplied();
    }
    if t >= last.offset {
        return last.color.premultiplied();
    }
    let upper = stops.partition_point(|s| s.offset <= t);
    let lo = stops[upper - 1];
    let hi = stops[upper];
    let span = hi.offset - lo.offset;
    if span <= f32::EPSILON {
        return hi.color.premultiplied();
    }
    lerp_premul(
        lo.color.premultiplied(),
        hi.color.premultiplied(),
        (t - lo.offset) / span,
    )
}

impl LinearGradient {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self {
            start,
            end,
            stops: Vec::new(),
        }
    }

    /// Builder-style stop insertion.
    pub fn with_stop(mut self, offset: f32, color: Rgba) -> Self {
        insert_stop(&mut self.stops, offset, color);
        self
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Projection of `p` onto the gradient line, 0 at `start` and 1 at `end`.
    pub fn parameter(&self, p: Vec2) -> f32 {
        let axis = self.end - self.start;
        let len_sq = axis.length_squared();
        if len_sq <= f32::EPSILON {
            return 0.0;
        }
        (p - self.start).dot(axis) / len_sq
    }

    pub fn sample(&self, p: Vec2) -> [f32; 4] {
        sample_stops(&self.stops, self.parameter(p))
    }
}

impl RadialGradient {
    /// Two-circle gradient. For a plain radial falloff pass the same center twice.
    pub fn new(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> Self {
        Self {
            c0,
            r0: r0.max(0.0),
            c1,
            r1: r1.max(0.0),
            stops: Vec::new(),
        }
    }

    /// Concentric gradient from `r0` to `r1` around `center`.
    pub fn concentric(center: Vec2, r0: f32, r1: f32) -> Self {
        Self::new(center, r0, center, r1)
    }

    pub fn with_stop(mut self, offset: f32, color: Rgba) -> Self {
        insert_stop(&mut self.stops, offset, color);
        self
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Largest `t` for which `p` lies on the circle interpolated between the
    /// start and end circles with a non-negative radius. `None` means the
    /// point is not covered by any such circle and stays unpainted.
    pub fn parameter(&self, p: Vec2) -> Option<f32> {
        let dr = self.r1 - self.r0;
        if self.c0 == self.c1 {
            // Concentric: the circle through `p` has radius |p - c|.
            return (dr.abs() > 1e-6).then(|| (p.distance(self.c0) - self.r0) / dr);
        }

        let cd = self.c1 - self.c0;
        let pd = p - self.c0;

        let a = cd.dot(cd) - dr * dr;
        let b = pd.dot(cd) + self.r0 * dr;
        let c = pd.dot(pd) - self.r0 * self.r0;

        let radius_ok = |t: f32| self.r0 + t * dr >= 0.0;

        if a.abs() <= 1e-6 {
            if b.abs() <= 1e-6 {
                return None;
            }
            let t = c / (2.0 * b);
            return radius_ok(t).then_some(t);
        }

        let disc = b * b - a * c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let t1 = (b + root) / a;
        let t2 = (b - root) / a;
        let (hi, lo) = if t1 >= t2 { (t1, t2) } else { (t2, t1) };
        if radius_ok(hi) {
            Some(hi)
        } else if radius_ok(lo) {
            Some(lo)
        } else {
            None
        }
    }

    pub fn sample(&self, p: Vec2) -> [f32; 4] {
        match self.parameter(p) {
            Some(t) => sample_stops(&self.stops, t),
            None => [0.0; 4],
        }
    }
}

impl Paint {
    /// Premultiplied color of this paint at user-space point `p`.
    pub fn sample(&self, p: Vec2) -> [f32; 4] {
        match self {
            Paint::Solid(color) => color.premultiplied(),
            Paint::Linear(g) => g.sample(p),
            Paint::Radial(g) => g.sample(p),
        }
    }
}

impl From<Rgba> for Paint {
    fn from(color: Rgba) -> Self {
        Paint::Solid(color)
    }
}

impl From<LinearGradient> for Paint {
    fn from(g: LinearGradient) -> Self {
        Paint::Linear(g)
    }
}

impl From<RadialGradient> for Paint {
    fn from(g: RadialGradient) -> Self {
        Paint::Radial(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_stops_stay_sorted() {
        let g = LinearGradient::new(Vec2::ZERO, Vec2::X)
            .with_stop(1.0, Rgba::BLACK)
            .with_stop(0.0, Rgba::WHITE)
            .with_stop(0.5, Rgba::WHITE);
        let offsets: Vec<f32> = g.stops().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_linear_parameter_projects_onto_axis() {
        let g = LinearGradient::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 100.0));
        assert!(approx(g.parameter(Vec2::new(40.0, 25.0)), 0.25));
        assert!(approx(g.parameter(Vec2::new(-5.0, 100.0)), 1.0));
    }

    #[test]
    fn test_linear_sample_hits_stop_colors() {
        let red = Rgba::new(1.0, 0.0, 0.0, 1.0);
        let blue = Rgba::new(0.0, 0.0, 1.0, 1.0);
        let g = LinearGradient::new(Vec2::ZERO, Vec2::new(10.0, 0.0))
            .with_stop(0.0, red)
            .with_stop(1.0, blue);
        assert_eq!(g.sample(Vec2::new(0.0, 0.0)), red.premultiplied());
        assert_eq!(g.sample(Vec2::new(10.0, 3.0)), blue.premultiplied());
        let mid = g.sample(Vec2::new(5.0, 0.0));
        assert!(approx(mid[0], 0.5) && approx(mid[2], 0.5));
    }

    #[test]
    fn test_stops_pad_beyond_ends() {
        let g = LinearGradient::new(Vec2::ZERO, Vec2::X)
            .with_stop(0.2, Rgba::WHITE)
            .with_stop(0.8, Rgba::BLACK);
        assert_eq!(g.sample(Vec2::new(-3.0, 0.0)), Rgba::WHITE.premultiplied());
        assert_eq!(g.sample(Vec2::new(4.0, 0.0)), Rgba::BLACK.premultiplied());
    }

    #[test]
    fn test_fade_to_transparent_keeps_hue() {
        let tint = Rgba::new(0.2, 0.8, 0.8, 1.0);
        let g = RadialGradient::concentric(Vec2::ZERO, 0.0, 10.0)
            .with_stop(0.0, tint)
            .with_stop(1.0, Rgba::TRANSPARENT);
        let p = g.sample(Vec2::new(5.0, 0.0));
        // Straight color at the midpoint is still the tint.
        assert!(approx(p[1] / p[3], 0.8));
        assert!(approx(p[3], 0.5));
    }

    #[test]
    fn test_concentric_radial_parameter() {
        let g = RadialGradient::concentric(Vec2::new(50.0, 50.0), 10.0, 30.0);
        assert!(approx(g.parameter(Vec2::new(70.0, 50.0)).unwrap(), 0.5));
        assert!(approx(g.parameter(Vec2::new(50.0, 60.0)).unwrap(), 0.0));
        assert!(approx(g.parameter(Vec2::new(50.0, 80.0)).unwrap(), 1.0));
    }

    #[test]
    fn test_shrinking_concentric_parameter() {
        let g = RadialGradient::concentric(Vec2::ZERO, 30.0, 10.0);
        assert!(approx(g.parameter(Vec2::new(20.0, 0.0)).unwrap(), 0.5));
        assert!(approx(g.parameter(Vec2::new(0.0, 10.0)).unwrap(), 1.0));
        assert_eq!(RadialGradient::concentric(Vec2::ZERO, 5.0, 5.0).parameter(Vec2::X), None);
    }

    #[test]
    fn test_inside_inner_circle_pads_first_stop() {
        let g = RadialGradient::concentric(Vec2::ZERO, 10.0, 20.0)
            .with_stop(0.0, Rgba::WHITE)
            .with_stop(1.0, Rgba::BLACK);
        assert_eq!(g.sample(Vec2::new(2.0, 0.0)), Rgba::WHITE.premultiplied());
    }

    #[test]
    fn test_offset_focus_radial() {
        // Start circle shifted up-left inside the end circle, like a lit sphere.
        let g = RadialGradient::new(Vec2::new(-3.5, -3.5), 2.0, Vec2::ZERO, 10.0);
        let at_focus = g.parameter(Vec2::new(-3.5, -3.5)).unwrap();
        assert!(at_focus <= 0.0);
        let rim = g.parameter(Vec2::new(10.0, 0.0)).unwrap();
        assert!(approx(rim, 1.0), "rim parameter {rim}");
        let opposite = g.parameter(Vec2::new(-10.0, 0.0)).unwrap();
        assert!(approx(opposite, 1.0), "opposite rim parameter {opposite}");
    }

    #[test]
    fn test_empty_gradient_is_transparent() {
        let g = LinearGradient::new(Vec2::ZERO, Vec2::X);
        assert_eq!(g.sample(Vec2::new(0.5, 0.0)), [0.0; 4]);
    }
}
