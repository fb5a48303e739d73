//! # Graphics Module
//!
//! Everything needed to draw the scene with deferred shading: cameras,
//! geometry, GPU resources, the scene model and the frame pipeline.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - first-person eye camera and the orthographic light camera
//! - **Geometry** ([`geometry`]) - built-in screen quad and skybox cube
//! - **Rendering Pipeline** ([`rendering`]) - shadow, skybox, geometry and composite passes
//! - **Scene Management** ([`scene`]) - meshes, models, the skybox and the light marker
//! - **Resource Management** ([`resources`]) - textures, render targets and bind group layouts
//!
//! ## Usage
//!
//! The graphics system is primarily used through the [`RenderEngine`] and [`Scene`] types:
//!
//! ```no_run
//! use deferred_renderer::{config::RendererConfig, gfx::scene::Scene};
//!
//! let config = RendererConfig::default();
//! let mut scene = Scene::new(config.eye, config.light);
//! // let mut engine = RenderEngine::new(window, &config).await?;
//! // engine.render_frame(&mut scene);
//! ```
//!
//! [`Scene`]: scene::Scene

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::Camera;
pub use rendering::render_engine::RenderEngine;
