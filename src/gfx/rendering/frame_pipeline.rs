//! # Frame Pipeline
//!
//! Owns the offscreen targets, pipelines and per-pass uniforms and records one
//! frame by walking the validated [`FramePlan`]:
//!
//! 1. **Shadow** - depth from the light camera into the shadow target
//! 2. **Skybox** - clears the G-buffer and draws the sky at the far plane
//! 3. **Geometry** - draws every model into the G-buffer
//! 4. **Composite** - full-screen lighting (or the debug view) into the output
//!
//! Rendering targets any texture view, so the same code drives the window
//! surface and headless rendering.

use wgpu::{CommandEncoder, TextureFormat, TextureView};

use super::{
    error::RenderError,
    frame_plan::{Attachment, FrameCounter, FramePlan, PassDesc, PassKind},
    gpu_context::GpuContext,
    pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager},
    shader_library::{self, ShaderLibrary},
};
use crate::{
    config::RendererConfig,
    gfx::{
        geometry::screen_quad,
        resources::{
            global_bindings::{CompositeUniforms, PassUniforms, SceneLayouts, UniformBinding},
            render_targets::{GBuffer, ShadowTarget},
            texture_resource::TextureResource,
        },
        scene::{
            model::{MeshTexture, MESH_TEXTURE_GROUP},
            DrawModel, Mesh, MeshTextures, Scene,
        },
    },
    wgpu_utils::binding_builder::BindGroupBuilder,
};

const SHADOW_PIPELINE: &str = "shadow";
const SKYBOX_PIPELINE: &str = "skybox";
const GBUFFER_PIPELINE: &str = "gbuffer";
const COMPOSITE_PIPELINE: &str = "composite";
const DEBUG_PIPELINE: &str = "debug";

pub struct FramePipeline {
    gpu: GpuContext,
    layouts: SceneLayouts,
    pipelines: PipelineManager,
    plan: FramePlan,

    shadow_target: ShadowTarget,
    gbuffer: GBuffer,
    fallback_texture: MeshTexture,
    screen_quad: Mesh,

    light_pass: UniformBinding<PassUniforms>,
    eye_pass: UniformBinding<PassUniforms>,
    composite: UniformBinding<CompositeUniforms>,
    composite_inputs: wgpu::BindGroup,

    frame_counter: FrameCounter,
    debug_view: bool,
}

impl FramePipeline {
    /// Builds targets and pipelines for an output of `config`'s window size
    pub fn new(
        gpu: GpuContext,
        config: &RendererConfig,
        output_format: TextureFormat,
        shaders: &ShaderLibrary,
    ) -> Result<Self, RenderError> {
        let device = &gpu.device;
        let plan = FramePlan::deferred()?;
        let layouts = SceneLayouts::new(device);

        let shadow_target = ShadowTarget::new(device, config.shadow_map_resolution);
        let gbuffer = GBuffer::new(
            device,
            config.window_width,
            config.window_height,
            gpu.gbuffer_format,
        );

        let mut pipelines = PipelineManager::new(gpu.device.clone());
        pipelines.load_library(shaders)?;
        register_pipelines(&mut pipelines, &layouts, gbuffer.format(), output_format);
        pipelines.create_all_pipelines()?;

        let noise =
            TextureResource::create_noise(device, &gpu.queue, config.noise_size, config.noise_seed);
        let fallback_texture = MeshTexture::new(
            device,
            &layouts,
            TextureResource::create_white(device, &gpu.queue),
            "Fallback Mesh Texture",
        );
        let screen_quad = Mesh::upload(device, &screen_quad(), None)?;

        let light_pass = UniformBinding::new(
            device,
            &layouts.pass,
            &bytemuck::Zeroable::zeroed(),
            "Light Pass Uniforms",
        );
        let eye_pass = UniformBinding::new(
            device,
            &layouts.pass,
            &bytemuck::Zeroable::zeroed(),
            "Eye Pass Uniforms",
        );
        let composite = UniformBinding::new(
            device,
            &layouts.composite_uniforms,
            &bytemuck::Zeroable::zeroed(),
            "Composite Uniforms",
        );
        let composite_inputs = BindGroupBuilder::new(&layouts.composite_inputs)
            .texture(&gbuffer.color.view)
            .texture(&gbuffer.normal.view)
            .texture(&gbuffer.world_pos.view)
            .texture(&gbuffer.depth.view)
            .texture(&shadow_target.depth.view)
            .texture(&noise.view)
            .sampler(&shadow_target.depth.sampler)
            .create(device, "Composite Inputs");

        log::info!(
            "frame pipeline ready: {}x{} output, {:?} G-buffer, {}px shadow map",
            config.window_width,
            config.window_height,
            gbuffer.format(),
            shadow_target.resolution()
        );

        Ok(Self {
            gpu,
            layouts,
            pipelines,
            plan,
            shadow_target,
            gbuffer,
            fallback_texture,
            screen_quad,
            light_pass,
            eye_pass,
            composite,
            composite_inputs,
            frame_counter: FrameCounter::default(),
            debug_view: config.debug_view,
        })
    }

    /// Records and submits one frame into `target`
    pub fn render(&mut self, scene: &mut Scene, target: &TextureView) {
        scene.prepare(&self.gpu.queue);
        self.update_uniforms(scene);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        for pass in self.plan.passes() {
            match pass.kind {
                PassKind::Shadow => self.encode_shadow(&mut encoder, pass, scene),
                PassKind::Skybox => self.encode_skybox(&mut encoder, pass, scene),
                PassKind::Geometry => self.encode_geometry(&mut encoder, pass, scene),
                PassKind::Composite => self.encode_composite(&mut encoder, pass, target),
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    fn update_uniforms(&mut self, scene: &mut Scene) {
        let queue = &self.gpu.queue;

        let light_view = scene.light.view_matrix(false);
        let light_projection = scene.light.projection_matrix(false);
        self.light_pass.update(
            queue,
            PassUniforms::new(light_view, light_projection, &scene.light),
        );

        let eye_view = scene.eye.view_matrix(true);
        let eye_projection = scene.eye.projection_matrix(true);
        self.eye_pass
            .update(queue, PassUniforms::new(eye_view, eye_projection, &scene.eye));

        let frame = self.frame_counter.advance();
        self.composite.update(
            queue,
            CompositeUniforms::new(
                light_view,
                light_projection,
                scene.light.position,
                &scene.eye,
                frame,
            ),
        );
    }

    fn pipeline(&self, name: &str) -> Option<&wgpu::RenderPipeline> {
        let pipeline = self.pipelines.get_pipeline(name);
        if pipeline.is_none() {
            log::error!("render pipeline '{name}' is missing, pass skipped");
        }
        pipeline
    }

    fn depth_attachment<'v>(
        view: &'v TextureView,
        pass: &PassDesc,
        attachment: Attachment,
    ) -> wgpu::RenderPassDepthStencilAttachment<'v> {
        wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: if pass.clears.contains(&attachment) {
                    wgpu::LoadOp::Clear(1.0)
                } else {
                    wgpu::LoadOp::Load
                },
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }

    fn encode_shadow(&self, encoder: &mut CommandEncoder, pass: &PassDesc, scene: &Scene) {
        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(Self::depth_attachment(
                &self.shadow_target.depth.view,
                pass,
                Attachment::ShadowDepth,
            )),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let resolution = self.shadow_target.resolution() as f32;
        shadow_pass.set_viewport(0.0, 0.0, resolution, resolution, 0.0, 1.0);

        let Some(pipeline) = self.pipeline(SHADOW_PIPELINE) else {
            return;
        };
        shadow_pass.set_pipeline(pipeline);
        shadow_pass.set_bind_group(0, self.light_pass.bind_group(), &[]);
        for model in scene.drawables() {
            shadow_pass.draw_model(model, MeshTextures::None);
        }
    }

    fn begin_gbuffer_pass<'e>(
        &'e self,
        encoder: &'e mut CommandEncoder,
        pass: &PassDesc,
        label: &str,
    ) -> wgpu::RenderPass<'e> {
        let color_attachments = self
            .gbuffer
            .color_attachments(pass.clears.contains(&Attachment::GColor));
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(Self::depth_attachment(
                &self.gbuffer.depth.view,
                pass,
                Attachment::GDepth,
            )),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let (width, height) = self.gbuffer.size();
        render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        render_pass
    }

    fn encode_skybox(&self, encoder: &mut CommandEncoder, pass: &PassDesc, scene: &Scene) {
        let mut sky_pass = self.begin_gbuffer_pass(encoder, pass, "Skybox Pass");

        // without a sky the pass still clears the G-buffer
        let Some(skybox) = &scene.skybox else {
            return;
        };
        let Some(pipeline) = self.pipeline(SKYBOX_PIPELINE) else {
            return;
        };
        sky_pass.set_pipeline(pipeline);
        sky_pass.set_bind_group(0, self.eye_pass.bind_group(), &[]);
        sky_pass.set_bind_group(MESH_TEXTURE_GROUP, skybox.bind_group(), &[]);
        sky_pass.draw_model(&skybox.model, MeshTextures::None);
    }

    fn encode_geometry(&self, encoder: &mut CommandEncoder, pass: &PassDesc, scene: &Scene) {
        let mut geometry_pass = self.begin_gbuffer_pass(encoder, pass, "Geometry Pass");

        let Some(pipeline) = self.pipeline(GBUFFER_PIPELINE) else {
            return;
        };
        geometry_pass.set_pipeline(pipeline);
        geometry_pass.set_bind_group(0, self.eye_pass.bind_group(), &[]);
        let textures = MeshTextures::Diffuse {
            fallback: &self.fallback_texture.bind_group,
        };
        for model in scene.drawables() {
            geometry_pass.draw_model(model, textures);
        }
    }

    fn encode_composite(&self, encoder: &mut CommandEncoder, pass: &PassDesc, target: &TextureView) {
        let load = if pass.clears.contains(&Attachment::Output) {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        } else {
            wgpu::LoadOp::Load
        };
        let mut composite_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let (width, height) = self.gbuffer.size();
        composite_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);

        let name = if self.debug_view {
            DEBUG_PIPELINE
        } else {
            COMPOSITE_PIPELINE
        };
        let Some(pipeline) = self.pipeline(name) else {
            return;
        };
        composite_pass.set_pipeline(pipeline);
        composite_pass.set_bind_group(0, self.composite.bind_group(), &[]);
        composite_pass.set_bind_group(1, &self.composite_inputs, &[]);
        composite_pass.draw_mesh(&self.screen_quad);
    }

    pub fn toggle_debug_view(&mut self) -> bool {
        self.debug_view = !self.debug_view;
        log::info!(
            "debug view {}",
            if self.debug_view { "on" } else { "off" }
        );
        self.debug_view
    }

    pub fn frame_counter(&self) -> i32 {
        self.frame_counter.value()
    }

    pub fn layouts(&self) -> &SceneLayouts {
        &self.layouts
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }
}

fn register_pipelines(
    pipelines: &mut PipelineManager,
    layouts: &SceneLayouts,
    gbuffer_format: TextureFormat,
    output_format: TextureFormat,
) {
    let depth_format = TextureResource::DEPTH_FORMAT;
    let gbuffer_formats = [gbuffer_format; 3];

    pipelines.register_pipeline(
        SHADOW_PIPELINE,
        PipelineConfig::default_with_shader(shader_library::SHADOW)
            .with_label("Shadow Pipeline")
            .with_vertex_only()
            .with_depth(DepthConfig::write(depth_format))
            .with_bind_group_layouts(vec![
                layouts.pass.layout.clone(),
                layouts.model.layout.clone(),
            ]),
    );

    pipelines.register_pipeline(
        SKYBOX_PIPELINE,
        PipelineConfig::default_with_shader(shader_library::SKYBOX)
            .with_label("Skybox Pipeline")
            .with_cull_mode(None)
            .with_depth(DepthConfig::read_only(depth_format))
            .with_color_formats(&gbuffer_formats)
            .with_bind_group_layouts(vec![
                layouts.pass.layout.clone(),
                layouts.model.layout.clone(),
                layouts.skybox.layout.clone(),
            ]),
    );

    pipelines.register_pipeline(
        GBUFFER_PIPELINE,
        PipelineConfig::default_with_shader(shader_library::GBUFFER)
            .with_label("G-Buffer Pipeline")
            .with_cull_mode(None)
            .with_depth(DepthConfig::write(depth_format))
            .with_color_formats(&gbuffer_formats)
            .with_bind_group_layouts(vec![
                layouts.pass.layout.clone(),
                layouts.model.layout.clone(),
                layouts.mesh_texture.layout.clone(),
            ]),
    );

    for (name, shader, label) in [
        (COMPOSITE_PIPELINE, shader_library::COMPOSITE, "Composite Pipeline"),
        (DEBUG_PIPELINE, shader_library::DEBUG, "Debug Pipeline"),
    ] {
        pipelines.register_pipeline(
            name,
            PipelineConfig::default_with_shader(shader)
                .with_label(label)
                .with_cull_mode(None)
                .with_color_formats(&[output_format])
                .with_bind_group_layouts(vec![
                    layouts.composite_uniforms.layout.clone(),
                    layouts.composite_inputs.layout.clone(),
                ]),
        );
    }
}
