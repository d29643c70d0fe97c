//! Tracks the window's physical size and scale factor and turns them into a
//! scene [`Viewport`] in logical pixels.
//!
//! Wayland reports zero-sized windows before the compositor assigns a size and
//! minimized windows shrink to zero on some platforms. Those sizes produce no
//! viewport, so the caller keeps whatever it had.

use skyglow_scene::Viewport;

/// Physical pixel dimensions of the window surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

pub struct SurfaceTracker {
    physical: PhysicalSize,
    scale_factor: f64,
}

impl SurfaceTracker {
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        Self {
            physical: PhysicalSize {
                width: physical_width,
                height: physical_height,
            },
            scale_factor: sanitize_scale(scale_factor),
        }
    }

    /// Record a window resize. Returns the new viewport when the size changed
    /// and is drawable.
    pub fn handle_resize(&mut self, physical_width: u32, physical_height: u32) -> Option<Viewport> {
        let size = PhysicalSize {
            width: physical_width,
            height: physical_height,
        };
        if size == self.physical {
            return None;
        }
        self.physical = size;
        self.viewport()
    }

    /// Record a scale factor change (the window moved to another display or
    /// the user changed scaling). The physical size usually changes with it.
    pub fn handle_scale_factor_changed(
        &mut self,
        scale_factor: f64,
        physical_width: u32,
        physical_height: u32,
    ) -> Option<Viewport> {
        self.scale_factor = sanitize_scale(scale_factor);
        self.physical = PhysicalSize {
            width: physical_width,
            height: physical_height,
        };
        self.viewport()
    }

    pub fn physical_size(&self) -> PhysicalSize {
        self.physical
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Logical viewport, or `None` while the surface has no area.
    pub fn viewport(&self) -> Option<Viewport> {
        if self.physical.width == 0 || self.physical.height == 0 {
            return None;
        }
        Some(Viewport::new(
            (self.physical.width as f64 / self.scale_factor) as f32,
            (self.physical.height as f64 / self.scale_factor) as f32,
            self.scale_factor as f32,
        ))
    }
}

fn sanitize_scale(scale_factor: f64) -> f64 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_size_from_scale() {
        let tracker = SurfaceTracker::new(2560, 1440, 2.0);
        let vp = tracker.viewport().unwrap();
        assert_eq!((vp.width, vp.height, vp.pixel_ratio), (1280.0, 720.0, 2.0));
    }

    #[test]
    fn test_unchanged_resize_is_ignored() {
        let mut tracker = SurfaceTracker::new(800, 600, 1.0);
        assert!(tracker.handle_resize(800, 600).is_none());
        assert!(tracker.handle_resize(1024, 600).is_some());
    }

    #[test]
    fn test_zero_size_has_no_viewport() {
        let mut tracker = SurfaceTracker::new(0, 0, 1.0);
        assert!(tracker.viewport().is_none());
        assert!(tracker.handle_resize(0, 720).is_none());
        assert!(tracker.handle_resize(1280, 720).is_some());
    }

    #[test]
    fn test_scale_change_reports_even_if_physical_matches() {
        let mut tracker = SurfaceTracker::new(1600, 1200, 1.0);
        let vp = tracker.handle_scale_factor_changed(2.0, 1600, 1200).unwrap();
        assert_eq!((vp.width, vp.height), (800.0, 600.0));
    }

    #[test]
    fn test_bad_scale_falls_back_to_one() {
        let tracker = SurfaceTracker::new(100, 100, 0.0);
        assert_eq!(tracker.scale_factor(), 1.0);
    }
}
