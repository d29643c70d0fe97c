//! Frame painter with cached background, nebula and planet layers.

use glam::Vec2;
use skyglow_config::GlowStyle;
use skyglow_raster::{Canvas, LinearGradient, Paint, RadialGradient, RasterError, Rgba};
use skyglow_scene::{Hsl, Layer, Nebula, Scene, ShootingStar, Star, dust_alpha, twinkle_alpha};

use crate::background::paint_background;
use crate::glow::Halo;
use crate::planet::PlanetLayers;

const TRAIL_WIDTH: f32 = 2.6;
const HEAD_GLOW_RADIUS: f32 = 7.0;
const SPARKLE_MIN_RADIUS: f32 = 1.4;
const SPARKLE_MIN_ALPHA: f32 = 0.55;

/// Device pixels a nebula may drift before the backdrop is repainted.
const NEBULA_DRIFT_PX: f32 = 0.5;
/// Alpha change that forces a backdrop repaint, well under one 8-bit step
/// at the nebula core.
const NEBULA_ALPHA_STEP: f32 = 5e-4;

/// Background plus nebulae, as last painted.
struct Backdrop {
    canvas: Canvas,
    /// Center and alpha of each nebula when painted.
    nebulae: Vec<(Vec2, f32)>,
}

impl Backdrop {
    fn matches(&self, scene: &Scene, target: &Canvas) -> bool {
        let scale = target.device_scale();
        self.canvas.width() == target.width()
            && self.canvas.height() == target.height()
            && self.canvas.transform() == target.transform()
            && self.nebulae.len() == scene.nebulae.len()
            && self.nebulae.iter().zip(&scene.nebulae).all(|(&(c, a), n)| {
                c.distance(n.center) * scale < NEBULA_DRIFT_PX
                    && (a - n.alpha).abs() < NEBULA_ALPHA_STEP
            })
    }
}

/// Paints scenes onto a canvas.
///
/// Layers that change slowly are painted into caches and copied each frame:
/// the background until the scene is rebuilt, the nebulae until one drifts
/// or pulses visibly, and the planet until it moves half a device pixel.
/// Stars, dust and shooting stars are painted fresh every frame.
pub struct Renderer {
    glow_style: GlowStyle,
    background: Option<Canvas>,
    background_builds: u64,
    backdrop: Option<Backdrop>,
    backdrop_builds: u64,
    planet: Option<PlanetLayers>,
    planet_builds: u64,
}

impl Renderer {
    pub fn new(glow_style: GlowStyle) -> Self {
        Self {
            glow_style,
            background: None,
            background_builds: 0,
            backdrop: None,
            backdrop_builds: 0,
            planet: None,
            planet_builds: 0,
        }
    }

    pub fn glow_style(&self) -> GlowStyle {
        self.glow_style
    }

    /// Switch halo style; cached layers do not depend on it.
    pub fn set_glow_style(&mut self, style: GlowStyle) {
        self.glow_style = style;
    }

    /// Drop every cached layer so the next frame repaints them. Call after
    /// every scene rebuild.
    pub fn invalidate_background(&mut self) {
        self.background = None;
        self.backdrop = None;
        self.planet = None;
    }

    /// How many times the background has been painted from scratch.
    pub fn background_builds(&self) -> u64 {
        self.background_builds
    }

    /// How many times the nebulae have been repainted over the background.
    pub fn backdrop_builds(&self) -> u64 {
        self.backdrop_builds
    }

    /// How many times the planet layers have been repainted.
    pub fn planet_builds(&self) -> u64 {
        self.planet_builds
    }

    /// Paint one frame of `scene` at animation time `clock`.
    ///
    /// Drawing happens in CSS pixels through the canvas's current transform.
    pub fn render(
        &mut self,
        scene: &Scene,
        clock: f32,
        canvas: &mut Canvas,
    ) -> Result<(), RasterError> {
        let backdrop = match self.backdrop.take() {
            Some(b) if b.matches(scene, canvas) => b,
            previous => self.build_backdrop(previous, scene, canvas)?,
        };
        canvas.copy_from(&backdrop.canvas)?;
        self.backdrop = Some(backdrop);

        canvas.save();

        for star in scene.stars_in(Layer::Far) {
            self.paint_far_star(canvas, star, clock);
        }

        if scene.planet.radius > 0.0 {
            let base = canvas.transform();
            let layers = match self.planet.take() {
                Some(l) if l.is_current(base, &scene.planet, clock) => l,
                previous => {
                    self.planet_builds += 1;
                    PlanetLayers::paint(previous, base, &scene.planet, clock)?
                }
            };
            layers.composite_onto(canvas);
            self.planet = Some(layers);
        }

        for mote in &scene.dust {
            Halo {
                center: mote.position,
                radius: mote.radius * 6.0,
                tint: mote.tint,
                alpha: dust_alpha(mote),
                mid_offset: 0.45,
                mid_factor: 0.25,
            }
            .paint(canvas, self.glow_style);
        }

        for star in scene.stars_in(Layer::Near) {
            self.paint_near_star(canvas, star, clock);
        }

        let trail_tint = scene.theme.primary;
        for shooting in scene.active_shooting_stars() {
            self.paint_shooting_star(canvas, shooting, trail_tint);
        }

        canvas.restore();
        Ok(())
    }

    fn build_background(&mut self, scene: &Scene, target: &Canvas) -> Result<Canvas, RasterError> {
        let mut bg = Canvas::new(target.width(), target.height())?;
        bg.set_transform(target.transform());
        paint_background(&mut bg, &scene.viewport, &scene.theme);
        self.background_builds += 1;
        log::debug!(
            "Painted background cache {}x{} (build #{})",
            bg.width(),
            bg.height(),
            self.background_builds
        );
        Ok(bg)
    }

    /// Copy the background and paint the nebulae over it, reusing the
    /// previous backdrop's allocation when the size still fits.
    fn build_backdrop(
        &mut self,
        previous: Option<Backdrop>,
        scene: &Scene,
        target: &Canvas,
    ) -> Result<Backdrop, RasterError> {
        let background = match self.background.take() {
            Some(bg)
                if bg.width() == target.width()
                    && bg.height() == target.height()
                    && bg.transform() == target.transform() =>
            {
                bg
            }
            _ => self.build_background(scene, target)?,
        };

        let mut canvas = match previous {
            Some(b)
                if b.canvas.width() == target.width() && b.canvas.height() == target.height() =>
            {
                b.canvas
            }
            _ => Canvas::new(target.width(), target.height())?,
        };
        canvas.copy_from(&background)?;
        self.background = Some(background);

        canvas.set_transform(target.transform());
        for nebula in &scene.nebulae {
            paint_nebula(&mut canvas, nebula);
        }
        self.backdrop_builds += 1;
        log::trace!("Repainted nebula backdrop (build #{})", self.backdrop_builds);

        Ok(Backdrop {
            canvas,
            nebulae: scene.nebulae.iter().map(|n| (n.center, n.alpha)).collect(),
        })
    }

    fn paint_far_star(&self, canvas: &mut Canvas, star: &Star, clock: f32) {
        let a = twinkle_alpha(star, clock);
        Halo {
            center: star.position,
            radius: star.radius * 5.0,
            tint: star.tint,
            alpha: a,
            mid_offset: 0.4,
            mid_factor: 0.35,
        }
        .paint(canvas, self.glow_style);
        canvas.fill_circle(
            star.position,
            star.radius * 0.55,
            &Paint::Solid(Hsl::WHITE.to_rgba(a)),
        );
    }

    fn paint_near_star(&self, canvas: &mut Canvas, star: &Star, clock: f32) {
        let a = twinkle_alpha(star, clock);
        Halo {
            center: star.position,
            radius: star.radius * 6.0,
            tint: star.tint,
            alpha: a,
            mid_offset: 0.4,
            mid_factor: 0.32,
        }
        .paint(canvas, self.glow_style);
        canvas.fill_circle(
            star.position,
            star.radius * 0.6,
            &Paint::Solid(Hsl::WHITE.to_rgba(a)),
        );

        if star.radius > SPARKLE_MIN_RADIUS && a > SPARKLE_MIN_ALPHA {
            let arm = star.radius * 3.2;
            let paint = Paint::Solid(star.tint.to_rgba(1.0));
            canvas.save();
            canvas.set_global_alpha(a * 0.45);
            canvas.stroke_line(
                star.position - Vec2::new(arm, 0.0),
                star.position + Vec2::new(arm, 0.0),
                1.0,
                &paint,
            );
            canvas.stroke_line(
                star.position - Vec2::new(0.0, arm),
                star.position + Vec2::new(0.0, arm),
                1.0,
                &paint,
            );
            canvas.restore();
        }
    }

    fn paint_shooting_star(&self, canvas: &mut Canvas, s: &ShootingStar, primary: Hsl) {
        let tail = s.tail();
        let trail = LinearGradient::new(s.head, tail)
            .with_stop(0.0, Rgba::WHITE.with_alpha(0.95))
            .with_stop(0.2, primary.shade(18.0).to_rgba(s.alpha * 0.8))
            .with_stop(0.55, primary.shade(5.0).to_rgba(s.alpha * 0.35))
            .with_stop(1.0, Rgba::TRANSPARENT);
        canvas.stroke_line(s.head, tail, TRAIL_WIDTH, &trail.into());

        match self.glow_style {
            GlowStyle::Gradient => {
                let head = RadialGradient::concentric(s.head, 0.0, HEAD_GLOW_RADIUS)
                    .with_stop(0.0, Rgba::WHITE.with_alpha(0.95))
                    .with_stop(0.55, primary.shade(18.0).to_rgba(s.alpha * 0.35))
                    .with_stop(1.0, Rgba::TRANSPARENT);
                canvas.fill_circle(s.head, HEAD_GLOW_RADIUS, &head.into());
            }
            GlowStyle::Simple => {
                canvas.fill_circle(
                    s.head,
                    HEAD_GLOW_RADIUS * 0.4,
                    &Paint::Solid(Rgba::WHITE.with_alpha(0.95 * s.alpha.max(0.0))),
                );
            }
        }
    }
}

/// Soft radial cloud, densest at the center.
fn paint_nebula(canvas: &mut Canvas, nebula: &Nebula) {
    let a = nebula.alpha;
    let g = RadialGradient::concentric(nebula.center, 0.0, nebula.radius)
        .with_stop(0.0, nebula.tint.shade(12.0).to_rgba(a * 1.4))
        .with_stop(0.45, nebula.tint.to_rgba(a * 0.7))
        .with_stop(0.75, nebula.tint.shade(-8.0).to_rgba(a * 0.25))
        .with_stop(1.0, Rgba::TRANSPARENT);
    canvas.fill_circle(nebula.center, nebula.radius, &g.into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Affine2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use skyglow_config::{QualityConfig, QualityTier};
    use skyglow_scene::{Theme, Viewport, build_scene, step};
    use std::time::Instant;

    fn setup(width: f32, height: f32, quality: &QualityConfig) -> (Scene, Canvas) {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let scene = build_scene(
            Viewport::new(width, height, 1.0),
            quality,
            &Theme::default(),
            &mut rng,
        );
        let (w, h) = scene.viewport.device_size();
        let canvas = Canvas::new(w, h).unwrap();
        (scene, canvas)
    }

    #[test]
    fn test_background_cached_across_frames() {
        let (scene, mut canvas) = setup(160.0, 120.0, &QualityConfig::default());
        let mut renderer = Renderer::new(GlowStyle::Gradient);
        for i in 0..5 {
            renderer.render(&scene, i as f32 * 0.016, &mut canvas).unwrap();
        }
        assert_eq!(renderer.background_builds(), 1);

        renderer.invalidate_background();
        renderer.render(&scene, 1.0, &mut canvas).unwrap();
        assert_eq!(renderer.background_builds(), 2);
    }

    #[test]
    fn test_resized_canvas_rebuilds_background() {
        let (scene, mut canvas) = setup(160.0, 120.0, &QualityConfig::default());
        let mut renderer = Renderer::new(GlowStyle::Gradient);
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        canvas.resize(80, 60).unwrap();
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        assert_eq!(renderer.background_builds(), 2);
    }

    #[test]
    fn test_frame_is_opaque() {
        let (scene, mut canvas) = setup(200.0, 150.0, &QualityConfig::default());
        let mut renderer = Renderer::new(GlowStyle::Gradient);
        renderer.render(&scene, 0.5, &mut canvas).unwrap();
        assert!(canvas.pixels().iter().all(|p| p[3] > 0.99));
    }

    #[test]
    fn test_render_restores_canvas_state() {
        let (scene, mut canvas) = setup(200.0, 150.0, &QualityConfig::default());
        let mut renderer = Renderer::new(GlowStyle::Gradient);
        renderer.render(&scene, 0.5, &mut canvas).unwrap();
        assert_eq!(canvas.transform(), Affine2::IDENTITY);
        assert_eq!(canvas.global_alpha(), 1.0);
    }

    #[test]
    fn test_stars_brighten_background() {
        let (mut scene, mut canvas) = setup(200.0, 150.0, &QualityConfig::default());
        scene.stars.truncate(1);
        scene.stars[0].position = Vec2::new(100.5, 20.5);
        scene.stars[0].base_alpha = 0.9;
        scene.dust.clear();
        let mut renderer = Renderer::new(GlowStyle::Gradient);
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        let star = canvas.pixel(100, 20).unwrap();
        let sky = canvas.pixel(150, 20).unwrap();
        assert!(star[0] > sky[0]);
    }

    #[test]
    fn test_shooting_star_painted_only_when_active() {
        let (mut scene, mut canvas) = setup(200.0, 150.0, &QualityConfig::default());
        scene.stars.clear();
        scene.dust.clear();
        let mut renderer = Renderer::new(GlowStyle::Gradient);
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        let before = canvas.pixel(150, 40).unwrap();

        scene.shooting_stars[0] = ShootingStar {
            head: Vec2::new(150.5, 40.5),
            trail_length: 120.0,
            speed: 20.0,
            alpha: 1.0,
            angle: std::f32::consts::FRAC_PI_4,
            active: true,
        };
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        let after = canvas.pixel(150, 40).unwrap();
        assert!(after[0] > before[0] + 0.3);

        scene.shooting_stars[0].active = false;
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        assert_eq!(canvas.pixel(150, 40).unwrap(), before);
    }

    #[test]
    fn test_reduced_tier_renders() {
        let quality = QualityConfig::preset(QualityTier::Reduced);
        let (scene, mut canvas) = setup(320.0, 200.0, &quality);
        let mut renderer = Renderer::new(quality.glow_style);
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        assert_eq!(renderer.glow_style(), GlowStyle::Simple);
        assert!(canvas.pixels().iter().all(|p| p[3] > 0.99));
    }

    #[test]
    fn test_high_dpi_canvas_keeps_css_coordinates() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let scene = build_scene(
            Viewport::new(100.0, 80.0, 1.5),
            &QualityConfig::default(),
            &Theme::default(),
            &mut rng,
        );
        let (w, h) = scene.viewport.device_size();
        assert_eq!((w, h), (150, 120));
        let mut canvas = Canvas::new(w, h).unwrap();
        canvas.set_transform(Affine2::from_scale(Vec2::splat(1.5)));
        let mut renderer = Renderer::new(GlowStyle::Gradient);
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        // Background covers the whole device surface.
        assert!(canvas.pixel(149, 119).unwrap()[3] > 0.99);
    }

    #[test]
    fn test_backdrop_repainted_only_after_visible_nebula_change() {
        let (mut scene, mut canvas) = setup(200.0, 150.0, &QualityConfig::default());
        assert!(!scene.nebulae.is_empty());
        let mut renderer = Renderer::new(GlowStyle::Gradient);
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        assert_eq!(renderer.backdrop_builds(), 1);

        scene.nebulae[0].center.x += 0.1;
        scene.nebulae[0].alpha += 1e-4;
        renderer.render(&scene, 0.016, &mut canvas).unwrap();
        assert_eq!(renderer.backdrop_builds(), 1);

        scene.nebulae[0].center.x += 1.0;
        renderer.render(&scene, 0.032, &mut canvas).unwrap();
        assert_eq!(renderer.backdrop_builds(), 2);

        scene.nebulae[0].alpha += 0.01;
        renderer.render(&scene, 0.048, &mut canvas).unwrap();
        assert_eq!(renderer.backdrop_builds(), 3);
        // The background itself never changed.
        assert_eq!(renderer.background_builds(), 1);
    }

    #[test]
    fn test_planet_repainted_only_when_it_moves() {
        let (mut scene, mut canvas) = setup(200.0, 150.0, &QualityConfig::default());
        let mut renderer = Renderer::new(GlowStyle::Gradient);
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        renderer.render(&scene, 0.016, &mut canvas).unwrap();
        assert_eq!(renderer.planet_builds(), 1);

        scene.planet.center += Vec2::new(2.0, 0.0);
        renderer.render(&scene, 0.032, &mut canvas).unwrap();
        assert_eq!(renderer.planet_builds(), 2);

        renderer.invalidate_background();
        renderer.render(&scene, 0.032, &mut canvas).unwrap();
        assert_eq!(renderer.planet_builds(), 3);
    }

    fn star_at(position: Vec2, layer: Layer) -> Star {
        Star {
            position,
            radius: 1.2,
            base_alpha: 0.9,
            twinkle_speed: 0.01,
            // Full brightness at clock 0.
            twinkle_phase: std::f32::consts::FRAC_PI_2,
            tint: Hsl::WHITE,
            layer,
        }
    }

    #[test]
    fn test_planet_hides_far_stars_but_not_near_ones() {
        let (mut scene, mut canvas) = setup(200.0, 150.0, &QualityConfig::default());
        scene.dust.clear();
        scene.stars.clear();
        scene.planet.center = Vec2::new(100.5, 75.5);
        scene.planet.radius = 30.0;
        scene.planet.drift = Vec2::ZERO;
        scene.planet.wobble_phase = 0.0;
        scene.planet.ring = None;
        scene.planet.tint = Hsl::new(220.0, 60.0, 30.0);
        let c = scene.planet.draw_center(0.0);
        let (x, y) = (c.x as u32, c.y as u32);

        let mut renderer = Renderer::new(GlowStyle::Gradient);
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        let planet_only = canvas.pixel(x, y).unwrap();

        scene.stars = vec![star_at(c, Layer::Far)];
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        let with_far = canvas.pixel(x, y).unwrap();
        for ch in 0..3 {
            assert!((with_far[ch] - planet_only[ch]).abs() < 0.03, "{with_far:?}");
        }

        scene.stars = vec![star_at(c, Layer::Near)];
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        let with_near = canvas.pixel(x, y).unwrap();
        assert!(with_near[1] > planet_only[1] + 0.3, "{with_near:?}");
    }

    #[test]
    fn test_shooting_star_head_covers_near_star_halo() {
        let (mut scene, mut canvas) = setup(200.0, 150.0, &QualityConfig::default());
        scene.dust.clear();
        let head = Vec2::new(150.5, 40.5);
        // The head sits inside the red halo, clear of the core and sparkle arms.
        scene.stars = vec![Star {
            radius: 2.0,
            tint: Hsl::new(0.0, 90.0, 50.0),
            ..star_at(head + Vec2::splat(2.0), Layer::Near)
        }];
        let mut renderer = Renderer::new(GlowStyle::Gradient);
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        let halo = canvas.pixel(150, 40).unwrap();
        assert!(halo[0] > halo[2] + 0.2, "{halo:?}");

        scene.shooting_stars[0] = ShootingStar {
            head,
            trail_length: 80.0,
            speed: 20.0,
            alpha: 1.0,
            angle: std::f32::consts::FRAC_PI_4,
            active: true,
        };
        renderer.render(&scene, 0.0, &mut canvas).unwrap();
        let covered = canvas.pixel(150, 40).unwrap();
        assert!(covered[2] > 0.9, "{covered:?}");
    }

    #[test]
    fn test_glow_style_switch() {
        let mut renderer = Renderer::new(GlowStyle::Gradient);
        renderer.set_glow_style(GlowStyle::Simple);
        assert_eq!(renderer.glow_style(), GlowStyle::Simple);
    }

    #[test]
    #[cfg_attr(debug_assertions, ignore = "frame timing is only meaningful in release builds")]
    fn test_full_hd_frame_fits_frame_interval() {
        let quality = QualityConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut scene = build_scene(
            Viewport::new(1920.0, 1080.0, 1.0),
            &quality,
            &Theme::default(),
            &mut rng,
        );
        let mut canvas = Canvas::new(1920, 1080).unwrap();
        let mut renderer = Renderer::new(quality.glow_style);
        let mut bytes = Vec::new();

        let mut clock = 0.0;
        renderer.render(&scene, clock, &mut canvas).unwrap();
        canvas.write_rgba8(&mut bytes);

        const FRAMES: u32 = 30;
        let start = Instant::now();
        for _ in 0..FRAMES {
            clock += 0.016;
            step(&mut scene, clock, &mut rng);
            renderer.render(&scene, clock, &mut canvas).unwrap();
            canvas.write_rgba8(&mut bytes);
        }
        let per_frame_ms = start.elapsed().as_secs_f64() * 1000.0 / FRAMES as f64;
        assert!(
            per_frame_ms < quality.frame_interval_ms(),
            "{per_frame_ms:.1} ms per 1920x1080 frame"
        );
    }
}
