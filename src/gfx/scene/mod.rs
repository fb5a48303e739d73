//! # Scene Module
//!
//! The data model the frame pipeline draws: uploaded meshes, models with a
//! transform and a per-model texture cache, the skybox and the scene that ties
//! them to the eye and light cameras.
//!
//! ## Key Components
//!
//! - [`Scene`] - cameras, objects, the light marker and the skybox
//! - [`Model`] - meshes plus a [`Transform`], loaded from OBJ files
//! - [`Mesh`] / [`MeshData`] - GPU and CPU geometry
//! - [`DrawModel`] - draw helpers on `wgpu::RenderPass`
//!
//! ## Usage
//!
//! ```no_run
//! use deferred_renderer::gfx::camera::Camera;
//! use deferred_renderer::gfx::scene::{Model, Scene};
//!
//! let mut scene = Scene::new(Camera::default(), Camera::orthographic((0.0, 4.0, 15.0).into(), 30.0));
//! scene.set_light_marker(Model::empty("lamp"));
//! ```

pub mod mesh;
pub mod model;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod skybox;
pub mod vertex;

// Re-export main types
pub use mesh::{Mesh, MeshData, MeshError};
pub use model::{
    import_obj, DrawModel, ImportedMesh, LoadContext, LoadError, MeshTextures, Model, Transform,
};
pub use scene::{LightMarker, Scene, LIGHT_MARKER_OFFSET};
pub use skybox::{Skybox, SkyboxFaces};
