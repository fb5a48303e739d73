use std::path::{Path, PathBuf};

use super::{
    mesh::Mesh,
    model::{LoadError, Model, Transform},
};
use crate::gfx::{
    geometry::skybox_cube,
    resources::{
        global_bindings::SceneLayouts,
        texture_cache::ImageDecoder,
        texture_resource::TextureResource,
    },
};
use crate::wgpu_utils::binding_builder::BindGroupBuilder;

/// Six face images of a cube map, ordered +X, -X, +Y, -Y, +Z, -Z
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkyboxFaces {
    pub right: PathBuf,
    pub left: PathBuf,
    pub top: PathBuf,
    pub bottom: PathBuf,
    pub front: PathBuf,
    pub back: PathBuf,
}

impl SkyboxFaces {
    /// `<dir>/<prefix>_{Right,Left,Top,Bottom,Front,Back}.<extension>`
    pub fn from_prefix(dir: &Path, prefix: &str, extension: &str) -> Self {
        let face = |name: &str| dir.join(format!("{prefix}_{name}.{extension}"));
        Self {
            right: face("Right"),
            left: face("Left"),
            top: face("Top"),
            bottom: face("Bottom"),
            front: face("Front"),
            back: face("Back"),
        }
    }

    pub fn in_layer_order(&self) -> [&Path; 6] {
        [
            &self.right,
            &self.left,
            &self.top,
            &self.bottom,
            &self.front,
            &self.back,
        ]
    }
}

/// Cube model drawn around the eye plus its cube-map bind group
pub struct Skybox {
    pub model: Model,
    pub cube_map: TextureResource,
    bind_group: wgpu::BindGroup,
}

impl Skybox {
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &SceneLayouts,
        decoder: &dyn ImageDecoder,
        faces: &SkyboxFaces,
    ) -> Result<Self, LoadError> {
        let [right, left, top, bottom, front, back] = faces
            .in_layer_order()
            .map(|path| decoder.decode(path).map(|image| (path.to_path_buf(), image)));
        let decoded = [right?, left?, top?, bottom?, front?, back?];
        let cube_map = TextureResource::create_cube_map(device, queue, &decoded, "Skybox Cube Map")?;

        let bind_group = BindGroupBuilder::new(&layouts.skybox)
            .texture(&cube_map.view)
            .sampler(&cube_map.sampler)
            .create(device, "Skybox Bind Group");

        let mesh = Mesh::upload(device, &skybox_cube(), None).map_err(|source| LoadError::Mesh {
            path: PathBuf::from("skybox"),
            index: 0,
            source,
        })?;
        let model = Model::from_meshes("skybox", Transform::default(), vec![mesh], device, layouts);

        let (width, height) = cube_map.size();
        log::info!("loaded skybox cube map ({width}x{height} per face)");
        Ok(Self {
            model,
            cube_map,
            bind_group,
        })
    }

    /// Keeps the cube centred on the eye
    pub fn follow(&mut self, eye_position: cgmath::Vector3<f32>) {
        self.model.transform.translate = eye_position;
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faces_follow_cube_map_layer_order() {
        let faces = SkyboxFaces::from_prefix(Path::new("skybox"), "Box", "bmp");
        let names: Vec<String> = faces
            .in_layer_order()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "skybox/Box_Right.bmp",
                "skybox/Box_Left.bmp",
                "skybox/Box_Top.bmp",
                "skybox/Box_Bottom.bmp",
                "skybox/Box_Front.bmp",
                "skybox/Box_Back.bmp",
            ]
        );
    }
}
