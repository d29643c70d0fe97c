//! Paints a starfield [`Scene`](skyglow_scene::Scene) onto a raster canvas in
//! a fixed back-to-front layer order.

pub mod background;
pub mod glow;
pub mod planet;
pub mod renderer;

pub use background::paint_background;
pub use renderer::Renderer;
