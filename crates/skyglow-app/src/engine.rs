//! The engine context: one owner for everything a running starfield needs.

use std::time::Instant;

use glam::{Affine2, Vec2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skyglow_config::{Config, ConfigError, QualityConfig};
use skyglow_raster::{Canvas, RasterError};
use skyglow_render::Renderer;
use skyglow_scene::{Scene, Theme, Viewport, build_scene, simulate};
use tracing::{debug, info, warn};

use crate::debounce::ResizeDebouncer;
use crate::scheduler::FrameScheduler;

/// Errors that keep the engine from starting or painting.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The viewport has no drawable device pixels.
    #[error("viewport {width}x{height} has no drawable area")]
    EmptyViewport { width: f32, height: f32 },

    /// The drawing surface could not be allocated or painted.
    #[error("drawing surface unavailable: {0}")]
    Surface(#[from] RasterError),

    /// Quality settings the scene builder cannot use.
    #[error("invalid quality settings: {0}")]
    Quality(#[from] ConfigError),
}

/// Owns scene, canvas, renderer, scheduler, resize debouncer and RNG.
///
/// The host calls [`frame`](Self::frame) on every presentation callback and
/// [`resize`](Self::resize) whenever the window changes size.
pub struct Engine {
    quality: QualityConfig,
    theme: Theme,
    /// Viewport of the current scene, before the pixel ratio cap.
    viewport: Viewport,
    scene: Option<Scene>,
    renderer: Renderer,
    canvas: Canvas,
    scheduler: FrameScheduler,
    debouncer: ResizeDebouncer<Viewport>,
    rng: ChaCha8Rng,
    epoch: Instant,
    /// Scene builds so far, including the initial one.
    builds: u64,
}

impl Engine {
    /// Build the first scene for `viewport` and start the scheduler. `now`
    /// becomes the zero point of the scheduler's timestamps.
    pub fn new(config: &Config, viewport: Viewport, now: Instant) -> Result<Self, EngineError> {
        let rng = match config.debug.seed {
            Some(seed) => {
                info!(seed, "Using fixed starfield seed");
                ChaCha8Rng::seed_from_u64(seed)
            }
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };

        let mut engine = Self {
            quality: config.quality.clone(),
            theme: Theme::default(),
            viewport,
            scene: None,
            renderer: Renderer::new(config.quality.glow_style),
            canvas: Canvas::new(1, 1)?,
            scheduler: FrameScheduler::new(config.quality.target_fps),
            debouncer: ResizeDebouncer::default(),
            rng,
            epoch: now,
            builds: 0,
        };
        engine.rebuild(viewport)?;
        engine.scheduler.start();
        Ok(engine)
    }

    /// Rebuild the scene for `viewport`, reallocating the canvas in device
    /// pixels with a CSS-pixel transform. Nothing changes if this fails.
    fn rebuild(&mut self, requested: Viewport) -> Result<(), EngineError> {
        let viewport = requested.capped(self.quality.max_pixel_ratio as f32);
        let (width, height) = viewport.device_size();
        if width == 0 || height == 0 {
            return Err(EngineError::EmptyViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        self.canvas.resize(width, height)?;
        self.canvas
            .set_transform(Affine2::from_scale(Vec2::splat(viewport.pixel_ratio)));

        let scene = build_scene(viewport, &self.quality, &self.theme, &mut self.rng);
        self.scene = Some(scene);
        self.viewport = requested;
        self.renderer.invalidate_background();
        self.builds += 1;

        debug!(
            width,
            height,
            pixel_ratio = viewport.pixel_ratio,
            build = self.builds,
            "Starfield rebuilt"
        );
        Ok(())
    }

    /// Handle a presentation callback at `now`.
    ///
    /// Applies a due resize, then lets the scheduler decide whether this
    /// callback gets a frame. Returns `true` when the canvas was repainted.
    pub fn frame(&mut self, now: Instant) -> Result<bool, EngineError> {
        if !self.scheduler.is_running() {
            return Ok(false);
        }
        if let Some(viewport) = self.debouncer.poll(now)
            && let Err(e) = self.rebuild(viewport)
        {
            warn!(
                "Resize to {}x{} failed, keeping the current starfield: {e}",
                viewport.width, viewport.height
            );
        }

        let timestamp_ms = now.saturating_duration_since(self.epoch).as_secs_f64() * 1000.0;
        let Some(command) = self.scheduler.tick(timestamp_ms) else {
            return Ok(false);
        };
        let Some(scene) = self.scene.as_mut() else {
            return Ok(false);
        };

        simulate::step(scene, command.clock, &mut self.rng);
        self.renderer.render(scene, command.clock, &mut self.canvas)?;
        Ok(true)
    }

    /// Note a new viewport; the rebuild happens once resizes settle.
    pub fn resize(&mut self, viewport: Viewport, now: Instant) {
        if self.scheduler.is_running() {
            self.debouncer.notify(viewport, now);
        }
    }

    /// Switch to `quality` and rebuild the scene with it. On failure the
    /// previous settings and scene stay in place.
    pub fn set_quality(&mut self, quality: QualityConfig) -> Result<(), EngineError> {
        quality.validate()?;
        let previous = std::mem::replace(&mut self.quality, quality);
        if self.scheduler.is_running()
            && let Err(e) = self.rebuild(self.viewport)
        {
            self.quality = previous;
            return Err(e);
        }
        self.scheduler.set_interval_ms(self.quality.frame_interval_ms());
        self.renderer.set_glow_style(self.quality.glow_style);
        info!(
            target_fps = self.quality.target_fps,
            glow = ?self.quality.glow_style,
            "Quality settings applied"
        );
        Ok(())
    }

    pub fn quality(&self) -> &QualityConfig {
        &self.quality
    }

    /// Stop animating and drop all scene state.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.debouncer.cancel();
        self.scene = None;
        info!(
            frames = self.scheduler.frame_count(),
            skipped = self.scheduler.skipped_count(),
            builds = self.builds,
            backdrop_repaints = self.renderer.backdrop_builds(),
            planet_repaints = self.renderer.planet_builds(),
            "Starfield stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn interval_ms(&self) -> f64 {
        self.scheduler.interval_ms()
    }
}
