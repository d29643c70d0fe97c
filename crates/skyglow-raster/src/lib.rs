//! CPU 2D raster surface: premultiplied RGBA pixels, affine transforms,
//! gradient paints and source-over / screen compositing.
//!
//! Drawing coordinates go through the current transform, so callers can keep
//! working in logical (CSS) pixels while the backing store is sized in device
//! pixels.

pub mod canvas;
pub mod color;
pub mod error;
pub mod paint;

pub use canvas::{BlendMode, Canvas, MAX_DIMENSION};
pub use color::Rgba;
pub use error::RasterError;
pub use paint::{ColorStop, LinearGradient, Paint, RadialGradient};
