mod camera;
pub mod geometry;
pub mod parallel_for_each;
mod renderer;
pub mod scene;
pub mod util;

pub use camera::Camera;
pub use renderer::{render_frame, FrameBuffer};
pub use scene::Scene;
