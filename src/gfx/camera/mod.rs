#[allow(clippy::module_inception)]
pub mod camera;
pub mod camera_controller;
pub mod camera_utils;

// Re-export main types
pub use camera::Camera;
pub use camera_controller::{CameraController, KeyboardState, LookSource};
pub use camera_utils::OPENGL_TO_WGPU_MATRIX;
