//! # Built-in Geometry
//!
//! Meshes the renderer needs that do not come from model files: the
//! full-screen quad drawn by the composite and debug passes, and the cube the
//! skybox is rasterised onto.

pub mod primitives;

pub use primitives::{screen_quad, skybox_cube};
