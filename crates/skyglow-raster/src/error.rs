//! Raster surface errors.

/// Errors that can occur when allocating or copying a [`Canvas`](crate::Canvas).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RasterError {
    /// Width or height is zero.
    #[error("canvas dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    /// One side exceeds [`MAX_DIMENSION`](crate::MAX_DIMENSION).
    #[error("canvas {width}x{height} exceeds the {max}px limit")]
    TooLarge { width: u32, height: u32, max: u32 },

    /// Source and destination canvases differ in size.
    #[error("canvas size mismatch: {src_width}x{src_height} into {dst_width}x{dst_height}")]
    SizeMismatch {
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    },
}
