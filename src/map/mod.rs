pub mod geometry;
pub mod projection;
pub mod renderer;
pub mod spatial;

pub use projection::{Viewport, ZoomBehavior, ZoomTransform};
pub use renderer::{MapLayers, MapRenderer, MapScene};
