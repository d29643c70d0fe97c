//! Scene construction from a viewport, quality tier and theme.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;
use skyglow_config::QualityConfig;

use crate::palette::{Hsl, Theme};
use crate::scene::{
    DustMote, Layer, Nebula, Planet, Ring, SHOOTING_STAR_DECAY, SHOOTING_STAR_SPAWN_CHANCE, Scene,
    ShootingStar, Star, Viewport,
};

/// Stars for a viewport: one per `density` square CSS pixels, rounded down.
pub fn star_count(viewport: &Viewport, density: f32) -> usize {
    if density <= 0.0 {
        return 0;
    }
    (viewport.width.max(0.0) * viewport.height.max(0.0) / density).floor() as usize
}

/// Build a fresh scene. The pixel ratio is capped by `quality.max_pixel_ratio`;
/// everything else is in CSS pixels.
pub fn build_scene<R: Rng + ?Sized>(
    viewport: Viewport,
    quality: &QualityConfig,
    theme: &Theme,
    rng: &mut R,
) -> Scene {
    let viewport = viewport.capped(quality.max_pixel_ratio as f32);
    let (w, h) = (viewport.width, viewport.height);
    let min_side = viewport.min_side();

    let star_tints = theme.star_tints();
    let stars = (0..star_count(&viewport, quality.star_density))
        .map(|_| spawn_star(&viewport, quality.far_fraction, &star_tints, rng))
        .collect::<Vec<_>>();

    let nebulae = vec![
        Nebula {
            center: Vec2::new(w * 0.2, h * 0.3),
            radius: min_side * 0.35,
            tint: theme.primary.shade(6.0),
            base_alpha: 0.06,
            alpha: 0.06,
            pulse_speed: 0.0008,
            pulse_phase: 0.0,
            drift: Vec2::new(0.04, 0.02),
        },
        Nebula {
            center: Vec2::new(w * 0.8, h * 0.65),
            radius: min_side * 0.4,
            tint: theme.accent.shade(-4.0),
            base_alpha: 0.05,
            alpha: 0.05,
            pulse_speed: 0.001,
            pulse_phase: PI,
            drift: Vec2::new(-0.04, 0.015),
        },
    ];

    let dust_tints = theme.dust_tints();
    let dust = (0..quality.dust_count)
        .map(|_| spawn_dust(&viewport, &dust_tints, rng))
        .collect();

    let planet = Planet {
        center: Vec2::new(w * 0.1, h * 0.75),
        radius: min_side * 0.22,
        tint: theme.primary.shade(-10.0),
        drift: Vec2::new(0.008, -0.004),
        wobble_phase: rng.random::<f32>() * TAU,
        ring: Some(Ring {
            tilt: -0.35,
            width: 0.4,
            alpha: 0.2,
        }),
    };

    let scene = Scene {
        viewport,
        theme: *theme,
        stars,
        nebulae,
        dust,
        shooting_stars: vec![ShootingStar::default(); quality.shooting_star_pool],
        planet,
        spawn_chance: SHOOTING_STAR_SPAWN_CHANCE,
        decay: SHOOTING_STAR_DECAY,
    };

    tracing::debug!(
        width = w,
        height = h,
        pixel_ratio = viewport.pixel_ratio,
        stars = scene.stars.len(),
        dust = scene.dust.len(),
        shooting_slots = scene.shooting_stars.len(),
        "Built starfield scene"
    );

    scene
}

fn spawn_star<R: Rng + ?Sized>(
    viewport: &Viewport,
    far_fraction: f32,
    tints: &[Hsl],
    rng: &mut R,
) -> Star {
    let layer = if rng.random::<f32>() < far_fraction {
        Layer::Far
    } else {
        Layer::Near
    };
    let position = Vec2::new(
        rng.random::<f32>() * viewport.width,
        rng.random::<f32>() * viewport.height,
    );
    let (radius, base_alpha) = match layer {
        Layer::Far => (
            rng.random::<f32>() + 0.3,
            rng.random::<f32>() * 0.5 + 0.25,
        ),
        Layer::Near => (
            rng.random::<f32>() * 1.8 + 0.5,
            rng.random::<f32>() * 0.5 + 0.4,
        ),
    };
    Star {
        position,
        radius,
        base_alpha,
        twinkle_speed: rng.random::<f32>() * 0.015 + 0.005,
        twinkle_phase: rng.random::<f32>() * TAU,
        tint: tints[rng.random_range(0..tints.len())],
        layer,
    }
}

/// A new dust mote somewhere inside the viewport, part-way through its life.
pub fn spawn_dust<R: Rng + ?Sized>(viewport: &Viewport, tints: &[Hsl], rng: &mut R) -> DustMote {
    DustMote {
        position: Vec2::new(
            rng.random::<f32>() * viewport.width,
            rng.random::<f32>() * viewport.height,
        ),
        velocity: Vec2::new(
            (rng.random::<f32>() - 0.5) * 0.18,
            (rng.random::<f32>() - 0.5) * 0.18,
        ),
        radius: rng.random::<f32>() * 2.6 + 0.7,
        base_alpha: rng.random::<f32>() * 0.35 + 0.08,
        tint: tints[rng.random_range(0..tints.len())],
        life: rng.random::<f32>() * 500.0,
        max_life: 550.0 + rng.random::<f32>() * 650.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use skyglow_config::QualityTier;

    fn full_hd() -> Viewport {
        Viewport::new(1920.0, 1080.0, 1.0)
    }

    #[test]
    fn test_full_hd_star_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let scene = build_scene(full_hd(), &QualityConfig::default(), &Theme::default(), &mut rng);
        assert_eq!(scene.stars.len(), 829);
    }

    #[test]
    fn test_far_fraction_is_close_to_configured() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let scene = build_scene(full_hd(), &QualityConfig::default(), &Theme::default(), &mut rng);
        let far = scene.stars_in(Layer::Far).count() as f32;
        let ratio = far / scene.stars.len() as f32;
        assert!((0.72..=0.88).contains(&ratio), "far ratio {ratio}");
    }

    #[test]
    fn test_star_ranges_per_layer() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let scene = build_scene(full_hd(), &QualityConfig::default(), &Theme::default(), &mut rng);
        for s in &scene.stars {
            match s.layer {
                Layer::Far => {
                    assert!((0.3..1.3).contains(&s.radius));
                    assert!((0.25..0.75).contains(&s.base_alpha));
                }
                Layer::Near => {
                    assert!((0.5..=2.3).contains(&s.radius));
                    assert!((0.4..0.9).contains(&s.base_alpha));
                }
            }
            assert!((0.0..=std::f32::consts::TAU).contains(&s.twinkle_phase));
            assert!(s.position.x < 1920.0 && s.position.y < 1080.0);
        }
    }

    #[test]
    fn test_fixed_entities() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let vp = Viewport::new(1000.0, 500.0, 1.0);
        let scene = build_scene(vp, &QualityConfig::default(), &Theme::default(), &mut rng);
        assert_eq!(scene.nebulae.len(), 2);
        assert_eq!(scene.nebulae[0].center, Vec2::new(200.0, 150.0));
        assert!((scene.nebulae[0].radius - 175.0).abs() < 1e-3);
        assert!((scene.nebulae[1].radius - 200.0).abs() < 1e-3);
        assert_eq!(scene.planet.center, Vec2::new(100.0, 375.0));
        assert!((scene.planet.radius - 110.0).abs() < 1e-3);
        let ring = scene.planet.ring.unwrap();
        assert_eq!(ring.tilt, -0.35);
        assert_eq!(scene.dust.len(), 30);
        assert_eq!(scene.shooting_stars.len(), 3);
        assert!(scene.shooting_stars.iter().all(|s| !s.active));
    }

    #[test]
    fn test_reduced_tier_counts_and_ratio_cap() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let quality = QualityConfig::preset(QualityTier::Reduced);
        let vp = Viewport::new(2000.0, 1000.0, 2.0);
        let scene = build_scene(vp, &quality, &Theme::default(), &mut rng);
        assert_eq!(scene.stars.len(), 500);
        assert_eq!(scene.dust.len(), 18);
        assert_eq!(scene.shooting_stars.len(), 2);
        assert_eq!(scene.viewport.pixel_ratio, 1.0);
    }

    #[test]
    fn test_full_tier_caps_ratio_at_one_and_a_half() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let vp = Viewport::new(100.0, 100.0, 3.0);
        let scene = build_scene(vp, &QualityConfig::default(), &Theme::default(), &mut rng);
        assert_eq!(scene.viewport.device_size(), (150, 150));
    }

    #[test]
    fn test_spawned_dust_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let vp = Viewport::new(800.0, 600.0, 1.0);
        let tints = Theme::default().dust_tints();
        for _ in 0..500 {
            let d = spawn_dust(&vp, &tints, &mut rng);
            assert!(d.life < 500.0);
            assert!((550.0..=1200.0).contains(&d.max_life));
            assert!((0.0..800.0).contains(&d.position.x));
            assert!((0.0..600.0).contains(&d.position.y));
            assert!(d.velocity.x.abs() <= 0.09 && d.velocity.y.abs() <= 0.09);
            assert!(tints.contains(&d.tint));
        }
    }

    #[test]
    fn test_rebuild_replaces_everything() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let q = QualityConfig::default();
        let theme = Theme::default();
        let big = build_scene(full_hd(), &q, &theme, &mut rng);
        let small = build_scene(Viewport::new(400.0, 300.0, 1.0), &q, &theme, &mut rng);
        assert_eq!(small.stars.len(), 48);
        assert!(big.stars.len() > small.stars.len());
        assert!(small.stars.iter().all(|s| s.position.x < 400.0));
    }

    #[test]
    fn test_zero_area_has_no_stars() {
        assert_eq!(star_count(&Viewport::new(0.0, 900.0, 1.0), 2500.0), 0);
    }
}
