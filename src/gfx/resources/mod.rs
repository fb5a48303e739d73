// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles textures, render targets and bind group layouts for rendering.

pub mod global_bindings;
pub mod render_targets;
pub mod texture_cache;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{
    CompositeUniforms, ModelUniform, PassUniforms, SceneLayouts, UniformBinding,
};
pub use render_targets::{choose_gbuffer_format, GBuffer, ShadowTarget};
pub use texture_cache::{
    DecodedImage, ImageDecoder, ImageFileDecoder, TextureCache, TextureError, TextureId,
};
pub use texture_resource::TextureResource;
