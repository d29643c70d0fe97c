//! Skyglow application: frame scheduling, the engine context, the winit/wgpu
//! window host and a headless snapshot mode.

pub mod config_watch;
pub mod debounce;
pub mod engine;
pub mod presenter;
pub mod scheduler;
pub mod snapshot;
pub mod viewport;
pub mod window;

pub use config_watch::{CONFIG_POLL_INTERVAL, ConfigWatcher};
pub use debounce::{RESIZE_DEBOUNCE, ResizeDebouncer};
pub use engine::{Engine, EngineError};
pub use presenter::{PresentError, Presenter};
pub use scheduler::{CLOCK_STEP, FrameScheduler, RenderCommand};
pub use snapshot::{SnapshotError, write_snapshot};
pub use viewport::SurfaceTracker;
pub use window::{AppState, run_with_config};
