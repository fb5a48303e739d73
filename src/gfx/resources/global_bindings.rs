//! Uniform layouts and bind group layouts shared by the pipelines
//!
//! Every uniform struct here MUST match its WGSL counterpart byte for byte.
//!
//! | group | mesh passes              | composite / debug         |
//! |-------|--------------------------|---------------------------|
//! | 0     | [`PassUniforms`]         | [`CompositeUniforms`]     |
//! | 1     | [`ModelUniform`]         | targets, noise, sampler   |
//! | 2     | mesh texture or cube map |                           |

use cgmath::{Matrix4, Vector3};

use crate::{
    gfx::camera::{camera_utils::convert_matrix4_to_array, Camera},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Per-pass camera data (`view`, `projection`, `cameraPos`, `near`, `far`)
///
/// One layout serves the shadow, skybox and geometry stages. None of them
/// reads `near`/`far`: the skybox reaches the far plane by emitting clip
/// `z = w`. The composite stage gets its own copy in [`CompositeUniforms`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PassUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub near: f32,
    pub far: f32,
    pub _padding: [f32; 2],
}

impl PassUniforms {
    pub fn new(view: Matrix4<f32>, projection: Matrix4<f32>, camera: &Camera) -> Self {
        Self {
            view: convert_matrix4_to_array(view),
            projection: convert_matrix4_to_array(projection),
            camera_pos: camera.position.extend(1.0).into(),
            near: camera.znear,
            far: camera.zfar,
            _padding: [0.0; 2],
        }
    }
}

/// World matrix of one scene object (`model`)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn new(model: Matrix4<f32>) -> Self {
        Self {
            model: convert_matrix4_to_array(model),
        }
    }
}

/// Inputs of the full-screen lighting pass
///
/// `view` and `projection` are the light camera's, as the composite shader
/// reprojects world positions into light space with them.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeUniforms {
    pub shadow_vp: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_pos: [f32; 4],
    pub camera_pos: [f32; 4],
    pub near: f32,
    pub far: f32,
    pub frame_counter: i32,
    pub _padding: f32,
}

impl CompositeUniforms {
    pub fn new(
        light_view: Matrix4<f32>,
        light_projection: Matrix4<f32>,
        light_position: Vector3<f32>,
        eye: &Camera,
        frame_counter: i32,
    ) -> Self {
        Self {
            shadow_vp: convert_matrix4_to_array(light_projection * light_view),
            view: convert_matrix4_to_array(light_view),
            projection: convert_matrix4_to_array(light_projection),
            light_pos: light_position.extend(1.0).into(),
            camera_pos: eye.position.extend(1.0).into(),
            near: eye.znear,
            far: eye.zfar,
            frame_counter,
            _padding: 0.0,
        }
    }
}

/// Every bind group layout the frame pipeline uses, created once
pub struct SceneLayouts {
    pub pass: BindGroupLayoutWithDesc,
    pub model: BindGroupLayoutWithDesc,
    pub mesh_texture: BindGroupLayoutWithDesc,
    pub skybox: BindGroupLayoutWithDesc,
    pub composite_uniforms: BindGroupLayoutWithDesc,
    pub composite_inputs: BindGroupLayoutWithDesc,
}

impl SceneLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let filtering = wgpu::SamplerBindingType::Filtering;

        Self {
            pass: BindGroupLayoutBuilder::new()
                .next_binding_rendering(binding_types::uniform())
                .create(device, "Pass Uniforms Layout"),
            model: BindGroupLayoutBuilder::new()
                .next_binding_vertex(binding_types::uniform())
                .create(device, "Model Uniform Layout"),
            mesh_texture: BindGroupLayoutBuilder::new()
                .next_binding_fragment(binding_types::texture_2d())
                .next_binding_fragment(binding_types::sampler(filtering))
                .create(device, "Mesh Texture Layout"),
            skybox: BindGroupLayoutBuilder::new()
                .next_binding_fragment(binding_types::texture_cube())
                .next_binding_fragment(binding_types::sampler(filtering))
                .create(device, "Skybox Layout"),
            composite_uniforms: BindGroupLayoutBuilder::new()
                .next_binding_rendering(binding_types::uniform())
                .create(device, "Composite Uniforms Layout"),
            // gcolor, gnormal, gworldpos, gdepth, shadowtex, noisetex, depth_sampler
            composite_inputs: BindGroupLayoutBuilder::new()
                .next_binding_fragment(binding_types::unfilterable_texture_2d())
                .next_binding_fragment(binding_types::unfilterable_texture_2d())
                .next_binding_fragment(binding_types::unfilterable_texture_2d())
                .next_binding_fragment(binding_types::depth_texture_2d())
                .next_binding_fragment(binding_types::depth_texture_2d())
                .next_binding_fragment(binding_types::unfilterable_texture_2d())
                .next_binding_fragment(binding_types::sampler(
                    wgpu::SamplerBindingType::Comparison,
                ))
                .create(device, "Composite Inputs Layout"),
        }
    }
}

/// A uniform buffer bound alone in its own bind group
pub struct UniformBinding<Content> {
    pub ubo: UniformBuffer<Content>,
    bind_group: wgpu::BindGroup,
}

impl<Content: bytemuck::Pod> UniformBinding<Content> {
    pub fn new(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        initial: &Content,
        label: &str,
    ) -> Self {
        let ubo = UniformBuffer::new_with_data(device, initial);
        let bind_group = BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .create(device, label);
        Self { ubo, bind_group }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, content: Content) {
        self.ubo.update_content(queue, content);
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn test_uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<PassUniforms>(), 160);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 64);
        assert_eq!(std::mem::size_of::<CompositeUniforms>(), 240);
    }

    #[test]
    fn test_composite_shadow_vp_is_projection_times_view() {
        let view = Matrix4::from_translation(Vector3::new(0.0, -4.0, -15.0));
        let projection = Matrix4::from_nonuniform_scale(0.5, 0.5, 0.25);
        let eye = Camera::default();

        let uniforms = CompositeUniforms::new(view, projection, Vector3::new(0.0, 4.0, 15.0), &eye, 9);
        assert_eq!(uniforms.shadow_vp, convert_matrix4_to_array(projection * view));
        assert_eq!(uniforms.light_pos, [0.0, 4.0, 15.0, 1.0]);
        assert_eq!(uniforms.near, eye.znear);
        assert_eq!(uniforms.frame_counter, 9);
    }

    #[test]
    fn test_pass_uniforms_carry_camera_planes() {
        let camera = Camera::default();
        let uniforms = PassUniforms::new(Matrix4::identity(), Matrix4::identity(), &camera);
        assert_eq!(uniforms.near, 0.01);
        assert_eq!(uniforms.far, 100.0);
        assert_eq!(uniforms.camera_pos, [0.0, 0.0, 0.0, 1.0]);
    }

    /// The sky writes clip `z = w`; that is the depth the eye's far plane gets
    #[test]
    fn test_sky_depth_equals_far_plane_depth() {
        let eye = Camera::default();
        let projection = eye.projection_matrix(true);
        let on_far_plane = projection * cgmath::Vector4::new(3.0, -2.0, -eye.zfar, 1.0);
        let sky = cgmath::Vector4::new(on_far_plane.x, on_far_plane.y, on_far_plane.w, on_far_plane.w);

        assert!((on_far_plane.z / on_far_plane.w - 1.0).abs() < 1e-4);
        assert_eq!(sky.z / sky.w, 1.0);
    }
}
