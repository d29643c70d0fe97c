//! Per-tick state updates. Everything here is a function of the scene and the
//! animation clock; the RNG is only consulted when something (re)spawns.

use std::f32::consts::FRAC_PI_4;

use glam::Vec2;
use rand::Rng;

use crate::builder::spawn_dust;
use crate::scene::{DustMote, Layer, Scene, Star, Viewport};

/// Dust that strays this far outside the viewport is respawned.
const DUST_MARGIN: f32 = 20.0;
/// Shooting stars this far past the right or bottom edge are retired.
const SHOOTING_STAR_MARGIN: f32 = 200.0;
/// Fraction of a dust mote's life spent fading in, and again fading out.
const DUST_RAMP: f32 = 0.12;

/// Twinkling alpha of a star at `clock`.
pub fn twinkle_alpha(star: &Star, clock: f32) -> f32 {
    let (base, amplitude) = match star.layer {
        Layer::Far => (0.6, 0.4),
        Layer::Near => (0.55, 0.45),
    };
    let tw = (clock * star.twinkle_speed * 60.0 + star.twinkle_phase).sin();
    (star.base_alpha * (base + amplitude * tw)).clamp(0.0, 1.0)
}

/// Alpha of a dust mote, ramped in and out at both ends of its life.
pub fn dust_alpha(mote: &DustMote) -> f32 {
    let t = mote.life / mote.max_life;
    let mut a = mote.base_alpha;
    if t < DUST_RAMP {
        a *= t / DUST_RAMP;
    }
    if t > 1.0 - DUST_RAMP {
        a *= (1.0 - t) / DUST_RAMP;
    }
    a.max(0.0)
}

/// Nebula alpha at `clock`.
pub fn pulse_alpha(base_alpha: f32, pulse_speed: f32, pulse_phase: f32, clock: f32) -> f32 {
    base_alpha * (0.8 + 0.2 * (clock * pulse_speed * 60.0 + pulse_phase).sin())
}

/// Toroidal wrap: leaving past `-margin` re-enters at `extent + margin` and
/// vice versa.
fn wrap(value: f32, extent: f32, margin: f32) -> f32 {
    if value < -margin {
        extent + margin
    } else if value > extent + margin {
        -margin
    } else {
        value
    }
}

fn wrap_point(p: Vec2, viewport: &Viewport, margin: f32) -> Vec2 {
    Vec2::new(
        wrap(p.x, viewport.width, margin),
        wrap(p.y, viewport.height, margin),
    )
}

fn dust_out_of_bounds(p: Vec2, viewport: &Viewport) -> bool {
    p.x < -DUST_MARGIN
        || p.x > viewport.width + DUST_MARGIN
        || p.y < -DUST_MARGIN
        || p.y > viewport.height + DUST_MARGIN
}

/// Pulse and drift every nebula.
pub fn step_nebulae(scene: &mut Scene, clock: f32) {
    let viewport = scene.viewport;
    for n in &mut scene.nebulae {
        n.alpha = pulse_alpha(n.base_alpha, n.pulse_speed, n.pulse_phase, clock);
        n.center = wrap_point(n.center + n.drift, &viewport, n.radius);
    }
}

/// Drift the planet, wrapping with a margin of 1.2 radii.
pub fn step_planet(scene: &mut Scene) {
    let viewport = scene.viewport;
    let p = &mut scene.planet;
    p.center = wrap_point(p.center + p.drift, &viewport, p.radius * 1.2);
}

/// Move and age dust; expired or stray motes are replaced in the same slot.
/// Returns how many were respawned.
pub fn step_dust<R: Rng + ?Sized>(scene: &mut Scene, rng: &mut R) -> usize {
    let viewport = scene.viewport;
    let tints = scene.theme.dust_tints();
    let mut respawned = 0;
    for mote in &mut scene.dust {
        mote.position += mote.velocity;
        mote.life += 1.0;
        if mote.life >= mote.max_life || dust_out_of_bounds(mote.position, &viewport) {
            *mote = spawn_dust(&viewport, &tints, rng);
            respawned += 1;
        }
    }
    respawned
}

/// Advance active shooting stars, retire faded or departed ones, then maybe
/// fire the first idle slot. A full pool simply skips the spawn.
pub fn step_shooting_stars<R: Rng + ?Sized>(scene: &mut Scene, rng: &mut R) {
    let viewport = scene.viewport;
    let decay = scene.decay;
    for s in scene.shooting_stars.iter_mut().filter(|s| s.active) {
        s.head += s.direction() * s.speed;
        s.alpha -= decay;
        if s.alpha <= 0.0
            || s.head.x > viewport.width + SHOOTING_STAR_MARGIN
            || s.head.y > viewport.height + SHOOTING_STAR_MARGIN
        {
            s.active = false;
        }
    }

    let Some(slot) = scene.shooting_stars.iter_mut().find(|s| !s.active) else {
        return;
    };
    if rng.random::<f32>() < scene.spawn_chance {
        slot.head = Vec2::new(
            rng.random::<f32>() * viewport.width * 0.85,
            rng.random::<f32>() * viewport.height * 0.35,
        );
        slot.trail_length = rng.random::<f32>() * 160.0 + 120.0;
        slot.speed = rng.random::<f32>() * 22.0 + 16.0;
        slot.alpha = 1.0;
        slot.angle = FRAC_PI_4 + (rng.random::<f32>() - 0.5) * 0.35;
        slot.active = true;
        tracing::trace!(x = slot.head.x, y = slot.head.y, "Shooting star spawned");
    }
}

/// One accepted tick of every simulator.
pub fn step<R: Rng + ?Sized>(scene: &mut Scene, clock: f32, rng: &mut R) {
    step_nebulae(scene, clock);
    step_planet(scene);
    step_dust(scene, rng);
    step_shooting_stars(scene, rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_scene;
    use crate::palette::{Hsl, Theme};
    use crate::scene::ShootingStar;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use skyglow_config::QualityConfig;

    fn scene(width: f32, height: f32, seed: u64) -> (Scene, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let scene = build_scene(
            Viewport::new(width, height, 1.0),
            &QualityConfig::default(),
            &Theme::default(),
            &mut rng,
        );
        (scene, rng)
    }

    fn star(layer: Layer, base_alpha: f32) -> Star {
        Star {
            position: Vec2::ZERO,
            radius: 1.0,
            base_alpha,
            twinkle_speed: 0.01,
            twinkle_phase: 0.0,
            tint: Hsl::WHITE,
            layer,
        }
    }

    #[test]
    fn test_twinkle_bounds() {
        let far = star(Layer::Far, 0.75);
        let near = star(Layer::Near, 0.9);
        for i in 0..2000 {
            let clock = i as f32 * 0.016;
            let a = twinkle_alpha(&far, clock);
            assert!((0.75 * 0.2 - 1e-5..=0.75 + 1e-5).contains(&a));
            let b = twinkle_alpha(&near, clock);
            assert!((0.9 * 0.1 - 1e-5..=0.9 + 1e-5).contains(&b));
        }
    }

    #[test]
    fn test_dust_alpha_ramps() {
        let mut mote = DustMote {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            radius: 1.0,
            base_alpha: 0.4,
            tint: Hsl::WHITE,
            life: 0.0,
            max_life: 1000.0,
        };
        assert_eq!(dust_alpha(&mote), 0.0);
        mote.life = 60.0;
        assert!((dust_alpha(&mote) - 0.2).abs() < 1e-5);
        mote.life = 500.0;
        assert_eq!(dust_alpha(&mote), 0.4);
        mote.life = 940.0;
        assert!((dust_alpha(&mote) - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_stray_dust_respawns_same_tick() {
        let (mut scene, mut rng) = scene(800.0, 600.0, 1);
        scene.dust.truncate(1);
        scene.dust[0].position = Vec2::new(-25.0, 50.0);
        scene.dust[0].velocity = Vec2::ZERO;
        scene.dust[0].life = 0.0;
        assert_eq!(step_dust(&mut scene, &mut rng), 1);
        let d = &scene.dust[0];
        assert!((0.0..800.0).contains(&d.position.x));
        assert!((0.0..600.0).contains(&d.position.y));
        assert!(d.life < 500.0);
        assert!((550.0..=1200.0).contains(&d.max_life));
    }

    #[test]
    fn test_expired_dust_respawns() {
        let (mut scene, mut rng) = scene(800.0, 600.0, 2);
        scene.dust.truncate(1);
        scene.dust[0].position = Vec2::new(400.0, 300.0);
        scene.dust[0].life = 999.0;
        scene.dust[0].max_life = 1000.0;
        assert_eq!(step_dust(&mut scene, &mut rng), 1);
        assert_eq!(scene.dust.len(), 1);
    }

    #[test]
    fn test_healthy_dust_moves() {
        let (mut scene, mut rng) = scene(800.0, 600.0, 3);
        scene.dust.truncate(1);
        scene.dust[0].position = Vec2::new(400.0, 300.0);
        scene.dust[0].velocity = Vec2::new(0.05, -0.05);
        scene.dust[0].life = 10.0;
        scene.dust[0].max_life = 1000.0;
        assert_eq!(step_dust(&mut scene, &mut rng), 0);
        assert_eq!(scene.dust[0].position, Vec2::new(400.05, 299.95));
        assert_eq!(scene.dust[0].life, 11.0);
    }

    #[test]
    fn test_faint_shooting_star_deactivates() {
        let (mut scene, mut rng) = scene(800.0, 600.0, 4);
        scene.decay = 0.018;
        scene.spawn_chance = 0.0;
        scene.shooting_stars = vec![ShootingStar {
            head: Vec2::new(100.0, 100.0),
            trail_length: 150.0,
            speed: 20.0,
            alpha: 0.01,
            angle: FRAC_PI_4,
            active: true,
        }];
        step_shooting_stars(&mut scene, &mut rng);
        let s = &scene.shooting_stars[0];
        assert!((s.alpha - -0.008).abs() < 1e-6);
        assert!(!s.active);
    }

    #[test]
    fn test_shooting_star_lifecycle() {
        let (mut scene, mut rng) = scene(1600.0, 900.0, 5);
        scene.shooting_stars.truncate(1);
        scene.spawn_chance = 1.0;
        step_shooting_stars(&mut scene, &mut rng);
        assert!(scene.shooting_stars[0].active);
        let first = scene.shooting_stars[0].clone();
        assert_eq!(first.alpha, 1.0);
        assert!(first.head.x < 1600.0 * 0.85 && first.head.y < 900.0 * 0.35);
        assert!((120.0..=280.0).contains(&first.trail_length));
        assert!((16.0..=38.0).contains(&first.speed));
        assert!((first.angle - FRAC_PI_4).abs() <= 0.175 + 1e-6);

        scene.spawn_chance = 0.0;
        let mut prev = first.alpha;
        let mut ticks = 0;
        while scene.shooting_stars[0].active {
            step_shooting_stars(&mut scene, &mut rng);
            let a = scene.shooting_stars[0].alpha;
            assert!(a < prev);
            prev = a;
            ticks += 1;
            assert!(ticks < 100);
        }
        // Retired slot is eligible again.
        scene.spawn_chance = 1.0;
        step_shooting_stars(&mut scene, &mut rng);
        assert!(scene.shooting_stars[0].active);
        assert_eq!(scene.shooting_stars[0].alpha, 1.0);
    }

    #[test]
    fn test_full_pool_skips_spawn() {
        let (mut scene, mut rng) = scene(800.0, 600.0, 6);
        for s in &mut scene.shooting_stars {
            *s = ShootingStar {
                head: Vec2::new(10.0, 10.0),
                speed: 1.0,
                alpha: 1.0,
                active: true,
                ..Default::default()
            };
        }
        scene.spawn_chance = 1.0;
        step_shooting_stars(&mut scene, &mut rng);
        assert!(scene.shooting_stars.iter().all(|s| s.active && s.alpha < 1.0));
    }

    #[test]
    fn test_departed_shooting_star_retires() {
        let (mut scene, mut rng) = scene(800.0, 600.0, 7);
        scene.spawn_chance = 0.0;
        scene.shooting_stars = vec![ShootingStar {
            head: Vec2::new(995.0, 100.0),
            speed: 10.0,
            alpha: 1.0,
            angle: 0.0,
            active: true,
            ..Default::default()
        }];
        step_shooting_stars(&mut scene, &mut rng);
        assert!(!scene.shooting_stars[0].active);
    }

    #[test]
    fn test_nebula_pulse_and_wrap() {
        let (mut scene, _) = scene(800.0, 600.0, 8);
        let r = scene.nebulae[1].radius;
        scene.nebulae[1].center = Vec2::new(-r - 0.01, 300.0);
        step_nebulae(&mut scene, 0.0);
        assert_eq!(scene.nebulae[1].center.x, 800.0 + r);
        for n in &scene.nebulae {
            assert!(n.alpha <= n.base_alpha * 1.0 + 1e-6);
            assert!(n.alpha >= n.base_alpha * 0.6 - 1e-6);
        }
    }

    #[test]
    fn test_planet_wraps_with_padding() {
        let (mut scene, _) = scene(800.0, 600.0, 9);
        let pad = scene.planet.radius * 1.2;
        scene.planet.center = Vec2::new(800.0 + pad, 300.0);
        step_planet(&mut scene);
        assert_eq!(scene.planet.center.x, -pad);
    }

    #[test]
    fn test_step_keeps_collection_sizes() {
        let (mut scene, mut rng) = scene(1024.0, 768.0, 10);
        let sizes = (scene.stars.len(), scene.dust.len(), scene.shooting_stars.len());
        for i in 0..500 {
            step(&mut scene, i as f32 * 0.016, &mut rng);
        }
        assert_eq!(
            sizes,
            (scene.stars.len(), scene.dust.len(), scene.shooting_stars.len())
        );
    }
}
