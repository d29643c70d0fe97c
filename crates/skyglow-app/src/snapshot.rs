//! Headless mode: animate a few frames off-screen and write the last one as PNG.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use skyglow_config::Config;
use skyglow_raster::Canvas;
use skyglow_scene::Viewport;
use tracing::info;

use crate::engine::{Engine, EngineError};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to write snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Run an engine for `frames` accepted ticks at the configured window size,
/// feeding it timestamps one frame interval (plus a millisecond) apart.
pub fn render_frames(config: &Config, frames: u32) -> Result<Engine, SnapshotError> {
    let viewport = Viewport::new(
        config.window.width as f32,
        config.window.height as f32,
        1.0,
    );
    let start = Instant::now();
    let mut engine = Engine::new(config, viewport, start)?;
    let step = Duration::from_secs_f64((engine.interval_ms() + 1.0) / 1000.0);

    let mut now = start;
    let mut painted = 0;
    while painted < frames.max(1) {
        if engine.frame(now)? {
            painted += 1;
        }
        now += step;
    }
    Ok(engine)
}

/// Encode `canvas` as an 8-bit RGBA PNG.
pub fn encode_png<W: Write>(canvas: &Canvas, writer: W) -> Result<(), SnapshotError> {
    let mut encoder = png::Encoder::new(writer, canvas.width(), canvas.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&canvas.to_rgba8())?;
    writer.finish()?;
    Ok(())
}

/// Render `frames` frames and save the result to `path`.
pub fn write_snapshot(config: &Config, path: &Path, frames: u32) -> Result<(), SnapshotError> {
    let engine = render_frames(config, frames)?;
    let file = File::create(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    encode_png(engine.canvas(), BufWriter::new(file))?;
    info!(
        path = %path.display(),
        width = engine.canvas().width(),
        height = engine.canvas().height(),
        frames = engine.scheduler().frame_count(),
        stars = engine.scene().map_or(0, |scene| scene.stars.len()),
        "Snapshot written"
    );
    Ok(())
}
