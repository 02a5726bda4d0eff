mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use projection::{Viewport, MAX_ZOOM, MIN_ZOOM};
pub use renderer::{render, Label, MapLayers};
pub use spatial::SpatialGrid;
