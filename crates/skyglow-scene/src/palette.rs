//! HSL theme colors and the tint palettes derived from them.

use skyglow_raster::Rgba;

/// A color in HSL space: hue in degrees, saturation and lightness in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const WHITE: Self = Self::new(0.0, 0.0, 100.0);

    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    /// Same hue and saturation, lightness shifted by `delta` and clamped into [0, 100].
    pub fn shade(self, delta: f32) -> Self {
        Self {
            l: (self.l + delta).clamp(0.0, 100.0),
            ..self
        }
    }

    /// Straight sRGB color with the given alpha.
    pub fn to_rgba(self, alpha: f32) -> Rgba {
        let h = self.h.rem_euclid(360.0) / 360.0;
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);

        if s == 0.0 {
            return Rgba::new(l, l, l, 1.0).with_alpha(alpha);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Rgba::new(
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
            1.0,
        )
        .with_alpha(alpha)
    }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// The four named colors everything in the scene is derived from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub background: Hsl,
    pub foreground: Hsl,
    pub primary: Hsl,
    pub accent: Hsl,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Hsl::new(220.0, 20.0, 10.0),
            foreground: Hsl::new(210.0, 40.0, 98.0),
            primary: Hsl::new(180.0, 70.0, 50.0),
            accent: Hsl::new(280.0, 70.0, 60.0),
        }
    }
}

impl Theme {
    /// Tints a star may be drawn with.
    pub fn star_tints(&self) -> [Hsl; 3] {
        [
            self.foreground.shade(-6.0),
            self.primary.shade(18.0),
            self.accent.shade(10.0),
        ]
    }

    /// Tints a dust mote may be drawn with.
    pub fn dust_tints(&self) -> [Hsl; 4] {
        [
            self.primary.shade(10.0),
            self.primary.shade(-5.0),
            self.accent.shade(5.0),
            self.accent.shade(-10.0),
        ]
    }
}
