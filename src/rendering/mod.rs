pub mod renderer;
pub mod surface;

// Re-export main types
pub use renderer::{FrameGeometry, FrameReport, MarkerPlacement, Renderer};
pub use surface::{Color, DrawCommand, RasterSurface, RecordingSurface, Surface};
