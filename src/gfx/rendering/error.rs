use thiserror::Error;

use super::{frame_plan::PlanError, shader_library::ShaderError};
use crate::gfx::{resources::texture_cache::TextureError, scene::MeshError};

/// Renderer setup failures
///
/// Per-frame surface problems are handled inside the engine and never
/// surface as a `RenderError`.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no compatible graphics adapter")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("graphics device request failed")]
    NoDevice(#[from] wgpu::RequestDeviceError),

    #[error("window surface could not be created")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("surface supports no usable format")]
    UnsupportedSurface,

    #[error("adapter cannot render to any float G-buffer format")]
    NoGBufferFormat,

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("built-in mesh is invalid")]
    Mesh(#[from] MeshError),

    #[error("invalid frame plan")]
    Plan(#[from] PlanError),
}
