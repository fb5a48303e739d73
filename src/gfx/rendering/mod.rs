// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Device setup, shader loading, pipeline management and the four-pass
//! deferred frame.

pub mod error;
pub mod frame_pipeline;
pub mod frame_plan;
pub mod gpu_context;
pub mod pipeline_manager;
pub mod render_engine;
pub mod shader_library;

// Re-export main types
pub use error::RenderError;
pub use frame_pipeline::FramePipeline;
pub use frame_plan::{Attachment, FrameCounter, FramePlan, PassDesc, PassKind, PlanError};
pub use gpu_context::GpuContext;
pub use pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
pub use shader_library::{ShaderError, ShaderLibrary};
