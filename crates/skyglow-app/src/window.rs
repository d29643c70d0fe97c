//! Window host: drives the engine from winit's redraw loop and hands each
//! painted frame to the [`Presenter`].

use std::sync::Arc;
use std::time::Instant;

use skyglow_config::Config;
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::config_watch::ConfigWatcher;
use crate::engine::Engine;
use crate::presenter::{PresentError, Presenter, init_presenter_blocking};
use crate::viewport::SurfaceTracker;

/// Seconds between FPS log lines when `debug.show_fps` is on.
const FPS_REPORT_INTERVAL_SECS: f64 = 1.0;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// Counts painted frames and reports the rate once per interval.
struct FpsCounter {
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
        }
    }

    /// Count one frame; returns the rate when a report is due.
    fn record(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start).as_secs_f64();
        if elapsed < FPS_REPORT_INTERVAL_SECS {
            return None;
        }
        let fps = self.frames as f64 / elapsed;
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}

/// Window, GPU presenter and starfield engine.
///
/// If the GPU or the drawing surface cannot be set up the window still opens
/// and stays responsive, it just shows no animated background.
pub struct AppState {
    pub config: Config,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    engine: Option<Engine>,
    surface: SurfaceTracker,
    fps: FpsCounter,
    watcher: Option<ConfigWatcher>,
}

impl AppState {
    pub fn with_config(config: Config) -> Self {
        let surface = SurfaceTracker::new(config.window.width, config.window.height, 1.0);
        Self {
            config,
            window: None,
            presenter: None,
            engine: None,
            surface,
            fps: FpsCounter::new(Instant::now()),
            watcher: None,
        }
    }

    /// Apply quality edits made to the config file while running.
    pub fn with_watcher(mut self, watcher: ConfigWatcher) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Whether the starfield is animating.
    pub fn is_animating(&self) -> bool {
        self.engine.as_ref().is_some_and(Engine::is_running)
    }

    fn start_engine(&mut self, now: Instant) {
        let Some(viewport) = self.surface.viewport() else {
            warn!("Window has no drawable area yet, starfield not started");
            return;
        };
        match Engine::new(&self.config, viewport, now) {
            Ok(engine) => {
                info!(
                    "Starfield started at {}x{} (scale {:.2})",
                    viewport.width, viewport.height, viewport.pixel_ratio
                );
                self.engine = Some(engine);
            }
            Err(e) => warn!("Starfield unavailable: {e}"),
        }
    }

    fn handle_viewport_change(&mut self, now: Instant) {
        let size = self.surface.physical_size();
        if let Some(presenter) = &mut self.presenter {
            presenter.resize(size.width, size.height);
        }
        let Some(viewport) = self.surface.viewport() else {
            return;
        };
        if let Some(engine) = &mut self.engine {
            engine.resize(viewport, now);
        } else if self.presenter.is_some() {
            // The first usable size arrived after the window opened.
            self.start_engine(now);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let Some(engine) = &mut self.engine else {
            return;
        };

        if engine.is_running()
            && let Some(quality) = self.watcher.as_mut().and_then(|w| w.poll(now))
        {
            match engine.set_quality(quality) {
                Ok(()) => self.config.quality = engine.quality().clone(),
                Err(e) => warn!("Keeping current quality settings: {e}"),
            }
        }

        match engine.frame(now) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                error!("Starfield frame failed, stopping animation: {e}");
                engine.stop();
                return;
            }
        }

        if let Some(presenter) = &mut self.presenter {
            match presenter.present(engine.canvas()) {
                Ok(()) => {}
                Err(PresentError::SurfaceLost) => {
                    let size = self.surface.physical_size();
                    presenter.resize(size.width, size.height);
                }
                Err(PresentError::Timeout) => warn!("Surface timeout, skipping frame"),
                Err(e) => {
                    error!("Presentation failed: {e}");
                    event_loop.exit();
                    return;
                }
            }
        }

        if self.config.debug.show_fps
            && let Some(fps) = self.fps.record(now)
        {
            info!("FPS: {fps:.1}");
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(window_attributes_from_config(&self.config))
        {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let inner = window.inner_size();
        self.surface = SurfaceTracker::new(inner.width, inner.height, window.scale_factor());
        info!(
            "Surface initialized: {}x{} (scale: {:.2})",
            inner.width,
            inner.height,
            window.scale_factor()
        );

        match init_presenter_blocking(window.clone(), self.config.window.vsync) {
            Ok(presenter) => {
                self.presenter = Some(presenter);
                self.start_engine(Instant::now());
            }
            Err(e) => error!("GPU initialization failed, running without starfield: {e}"),
        }

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                if let Some(engine) = &mut self.engine {
                    engine.stop();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if self
                    .surface
                    .handle_resize(new_size.width, new_size.height)
                    .is_some()
                {
                    self.handle_viewport_change(Instant::now());
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(window) = &self.window {
                    let inner = window.inner_size();
                    if self
                        .surface
                        .handle_scale_factor_changed(scale_factor, inner.width, inner.height)
                        .is_some()
                    {
                        self.handle_viewport_change(Instant::now());
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if self.is_animating()
                    && let Some(window) = &self.window
                {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Creates an event loop and runs the starfield window with the given config.
///
/// Quality edits picked up by `watcher` are applied live. This function
/// blocks until the window is closed.
#[instrument(skip(config, watcher))]
pub fn run_with_config(config: Config, watcher: Option<ConfigWatcher>) {
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = AppState::with_config(config);
    if let Some(watcher) = watcher {
        app = app.with_watcher(watcher);
    }
    event_loop.run_app(&mut app).expect("Event loop failed");
}
