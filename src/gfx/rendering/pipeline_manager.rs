//! Render pipeline management system for wgpu
//!
//! Shaders are compiled and every registered pipeline is created up front, so
//! a broken shader is reported at startup instead of in the middle of a frame.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use super::shader_library::{ShaderError, ShaderLibrary};
use crate::gfx::scene::vertex::attribute_layouts;

/// Depth test and write configuration of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthConfig {
    pub format: TextureFormat,
    pub write_enabled: bool,
    pub compare: CompareFunction,
}

impl DepthConfig {
    /// Depth test with writes, nearer fragments win
    pub fn write(format: TextureFormat) -> Self {
        Self {
            format,
            write_enabled: true,
            compare: CompareFunction::Less,
        }
    }

    /// Depth test only, fragments at the far plane still pass
    pub fn read_only(format: TextureFormat) -> Self {
        Self {
            format,
            write_enabled: false,
            compare: CompareFunction::LessEqual,
        }
    }
}

/// Configuration for creating a render pipeline
///
/// Every pipeline draws [`Mesh`](crate::gfx::scene::Mesh) geometry and so
/// declares the three vertex attribute buffers.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub cull_mode: Option<Face>,
    pub depth: Option<DepthConfig>,
    pub color_targets: Vec<Option<ColorTargetState>>,
    pub vertex_only: bool, // shadow pass
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "shader".to_string(),
            bind_group_layouts: Vec::new(),
            cull_mode: Some(Face::Back),
            depth: None,
            color_targets: Vec::new(),
            vertex_only: false,
        }
    }
}

impl PipelineConfig {
    pub fn default_with_shader(shader: &str) -> Self {
        Self {
            shader: shader.to_string(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_vertex_only(mut self) -> Self {
        self.vertex_only = true;
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    pub fn with_depth(mut self, depth: DepthConfig) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Same format on every target, no blending
    pub fn with_color_formats(mut self, formats: &[TextureFormat]) -> Self {
        self.color_targets = formats
            .iter()
            .map(|&format| {
                Some(ColorTargetState {
                    format,
                    blend: None,
                    write_mask: ColorWrites::ALL,
                })
            })
            .collect();
        self
    }
}

/// Compiles shaders and owns the pipelines built from them
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
    pending_pipelines: Vec<String>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
            pending_pipelines: Vec::new(),
        }
    }

    /// Registers a pipeline configuration; it is built by [`Self::create_all_pipelines`]
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
        self.pending_pipelines.push(name.to_string());
    }

    /// Compiles a WGSL module, reporting validation errors as [`ShaderError::Compile`]
    pub fn load_shader(&mut self, name: &str, source: &str) -> Result<(), ShaderError> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ShaderError::Compile {
                name: name.to_string(),
                message: error.to_string(),
            });
        }

        self.shader_modules.insert(name.to_string(), shader_module);
        Ok(())
    }

    pub fn load_library(&mut self, library: &ShaderLibrary) -> Result<(), ShaderError> {
        for (name, source) in library.iter() {
            self.load_shader(name, source)?;
            log::debug!("compiled shader '{name}'");
        }
        Ok(())
    }

    pub fn get_pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    /// Creates every pending pipeline, stopping at the first failure
    pub fn create_all_pipelines(&mut self) -> Result<(), ShaderError> {
        let pending = std::mem::take(&mut self.pending_pipelines);

        for (index, name) in pending.iter().enumerate() {
            let Some(config) = self.pipeline_configs.get(name) else {
                continue;
            };
            match self.create_pipeline_from_config(name, config) {
                Ok(pipeline) => {
                    self.pipelines.insert(name.clone(), pipeline);
                }
                Err(err) => {
                    self.pending_pipelines = pending[index..].to_vec();
                    return Err(err);
                }
            }
        }

        log::info!("created {} render pipelines", self.pipelines.len());
        Ok(())
    }

    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<RenderPipeline, ShaderError> {
        let shader = self
            .shader_modules
            .get(&config.shader)
            .ok_or_else(|| ShaderError::Link {
                pipeline: name.to_string(),
                message: format!("shader '{}' was never loaded", config.shader),
            })?;

        self.device.push_error_scope(ErrorFilter::Validation);

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let fragment_state = if config.vertex_only {
            None
        } else {
            Some(FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &config.color_targets,
                compilation_options: PipelineCompilationOptions::default(),
            })
        };

        let depth_stencil = config.depth.map(|depth| DepthStencilState {
            format: depth.format,
            depth_write_enabled: depth.write_enabled,
            depth_compare: depth.compare,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        });

        let vertex_buffers = attribute_layouts();
        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &vertex_buffers,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: fragment_state,
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ShaderError::Link {
                pipeline: name.to_string(),
                message: error.to_string(),
            });
        }
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::default_with_shader("skybox")
            .with_label("Skybox")
            .with_cull_mode(None)
            .with_depth(DepthConfig::read_only(TextureFormat::Depth32Float))
            .with_color_formats(&[TextureFormat::Rgba32Float; 3]);

        assert_eq!(config.shader, "skybox");
        assert_eq!(config.cull_mode, None);
        assert_eq!(config.color_targets.len(), 3);
        assert!(config
            .color_targets
            .iter()
            .all(|t| t.as_ref().is_some_and(|t| t.blend.is_none())));

        let depth = config.depth.unwrap();
        assert!(!depth.write_enabled);
        assert_eq!(depth.compare, CompareFunction::LessEqual);
    }

    #[test]
    fn test_shadow_config_has_no_fragment_targets() {
        let config = PipelineConfig::default_with_shader("shadow")
            .with_vertex_only()
            .with_depth(DepthConfig::write(TextureFormat::Depth32Float));
        assert!(config.vertex_only);
        assert!(config.color_targets.is_empty());
        assert_eq!(config.depth.unwrap().compare, CompareFunction::Less);
    }
}
