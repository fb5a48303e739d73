//! Window-backed rendering engine
//!
//! Owns the window surface and a [`FramePipeline`] drawing into it. Each call
//! to [`RenderEngine::render_frame`] acquires the next surface texture, records
//! the four passes and presents the result.

use super::{
    error::RenderError,
    frame_pipeline::FramePipeline,
    gpu_context::GpuContext,
    shader_library::{ShaderLibrary, ALL_SHADERS},
};
use crate::{
    config::RendererConfig,
    gfx::{resources::global_bindings::SceneLayouts, scene::Scene},
};

/// Surface plus the frame pipeline rendering into it
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    frame_pipeline: FramePipeline,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Requests an adapter compatible with the window, configures the surface
    /// at the configured window size, then reads and compiles every shader
    /// and builds the offscreen targets.
    ///
    /// # Errors
    /// Fails when no adapter or device is available, the surface has no
    /// usable format, or a shader is missing or does not compile.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        renderer_config: &RendererConfig,
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;
        let (gpu, adapter) = GpuContext::new(&instance, Some(&surface)).await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(RenderError::UnsupportedSurface)?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: renderer_config.window_width.max(1),
            height: renderer_config.window_height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);
        log::info!(
            "surface configured: {}x{} {:?}",
            config.width,
            config.height,
            format
        );

        let shaders = ShaderLibrary::load(&renderer_config.shader_dir, &ALL_SHADERS)?;
        let frame_pipeline = FramePipeline::new(gpu, renderer_config, format, &shaders)?;

        Ok(Self {
            surface,
            config,
            frame_pipeline,
        })
    }

    /// Renders and presents one frame
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped, as
    /// is a timed-out acquire. Other surface errors are logged.
    pub fn render_frame(&mut self, scene: &mut Scene) {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                self.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("surface acquire timed out, frame skipped");
                return;
            }
            Err(err) => {
                log::error!("failed to acquire surface texture: {err}");
                return;
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.frame_pipeline.render(scene, &surface_texture_view);
        surface_texture.present();
    }

    fn reconfigure(&self) {
        self.surface
            .configure(&self.frame_pipeline.gpu().device, &self.config);
    }

    pub fn toggle_debug_view(&mut self) -> bool {
        self.frame_pipeline.toggle_debug_view()
    }

    pub fn gpu(&self) -> &GpuContext {
        self.frame_pipeline.gpu()
    }

    /// Layouts models must be created against to be drawable here
    pub fn layouts(&self) -> &SceneLayouts {
        self.frame_pipeline.layouts()
    }
}
