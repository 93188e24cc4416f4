//! Layout module: rectangles and the world camera.

mod camera;
mod rect;

pub use camera::WorldView;
pub use rect::Rect;
