// src/lib.rs
//! Deferred-shading scene renderer
//!
//! Draws textured OBJ models lit by one shadow-casting directional light in
//! four passes: a shadow map from the light, a skybox and a G-buffer from
//! the eye, and a full-screen composite that lights, shadows and fogs the
//! G-buffer. Built on wgpu and winit.

pub mod app;
pub mod config;
pub mod gfx;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::DeferredApp;
pub use config::{ModelSpec, RendererConfig, SceneDescription};
