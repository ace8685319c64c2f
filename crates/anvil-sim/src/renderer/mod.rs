pub mod color;
pub mod painter;
pub mod status;
pub mod surface;

// Re-export key types for convenient access
pub use color::Rgba;
pub use painter::{draw_overlay, draw_scene, FrameView};
pub use status::{Status, StatusBanner};
pub use surface::{ColorStop, Paint, Rect, Shadow, Surface, TextAlign, TextBaseline, TextStyle};
