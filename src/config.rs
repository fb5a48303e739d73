//! Renderer and scene settings
//!
//! Everything is set in code; there are no configuration files or command-line
//! flags. Defaults reproduce the bundled demo scene.

use std::path::{Path, PathBuf};

use cgmath::{Deg, Vector3};

use crate::gfx::{camera::Camera, scene::SkyboxFaces, scene::Transform};

/// Window, pass and input settings
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub shadow_map_resolution: u32,
    pub shader_dir: PathBuf,
    /// Distance moved per frame while a movement key is held
    pub move_speed: f32,
    /// Degrees turned for a cursor offset of one window extent
    pub look_sensitivity: f32,
    pub noise_size: u32,
    pub noise_seed: u64,
    pub eye: Camera,
    pub light: Camera,
    pub debug_view: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_title: "Deferred Renderer".to_string(),
            window_width: 512,
            window_height: 512,
            shadow_map_resolution: 1024,
            shader_dir: PathBuf::from("shaders"),
            move_speed: 0.035,
            look_sensitivity: 35.0,
            noise_size: 64,
            noise_seed: 0x5EED,
            eye: Camera::perspective(Vector3::new(0.0, 0.0, 0.0), Deg(70.0), 1.0),
            light: Camera::orthographic(Vector3::new(0.0, 4.0, 15.0), 30.0),
            debug_view: false,
        }
    }
}

impl RendererConfig {
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self.eye.aspect = width as f32 / height.max(1) as f32;
        self
    }

    pub fn with_window_title(mut self, title: &str) -> Self {
        self.window_title = title.to_owned();
        self
    }

    pub fn with_shadow_map_resolution(mut self, resolution: u32) -> Self {
        self.shadow_map_resolution = resolution;
        self
    }

    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = dir.into();
        self
    }

    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    pub fn with_look_sensitivity(mut self, degrees: f32) -> Self {
        self.look_sensitivity = degrees;
        self
    }

    pub fn with_cameras(mut self, eye: Camera, light: Camera) -> Self {
        self.eye = eye;
        self.light = light;
        self
    }

    pub fn with_debug_view(mut self, enabled: bool) -> Self {
        self.debug_view = enabled;
        self
    }
}

/// One model file and where to put it
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub path: PathBuf,
    pub transform: Transform,
}

impl ModelSpec {
    pub fn new(path: impl Into<PathBuf>, translate: [f32; 3], rotate: [f32; 3], scale: f32) -> Self {
        Self {
            path: path.into(),
            transform: Transform::new(translate.into(), rotate.into(), Vector3::new(scale, scale, scale)),
        }
    }
}

/// Models, light marker and sky making up a scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescription {
    pub models: Vec<ModelSpec>,
    pub light_marker: Option<ModelSpec>,
    pub skybox: Option<SkyboxFaces>,
}

impl SceneDescription {
    /// Two trees on a ground plane, a desk lamp marking the light, and a sky
    /// box, with asset paths relative to `asset_dir`
    pub fn demo(asset_dir: &Path) -> Self {
        let tree = asset_dir.join("models/tree/tree02.obj");
        Self {
            models: vec![
                ModelSpec::new(&tree, [2.5, 0.0, 2.0], [0.0; 3], 0.0025),
                ModelSpec::new(&tree, [10.0, 0.0, 7.0], [0.0; 3], 0.0015),
                ModelSpec::new(
                    asset_dir.join("models/plane/plane.obj"),
                    [0.0, -1.1, 0.0],
                    [0.0; 3],
                    10.0,
                ),
            ],
            light_marker: Some(ModelSpec::new(
                asset_dir.join("models/lamp/lampara_escritorio.obj"),
                [1.0, 0.0, -1.0],
                [0.0, 180.0, 0.0],
                0.008,
            )),
            skybox: Some(SkyboxFaces::from_prefix(&asset_dir.join("skybox"), "Box", "bmp")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RendererConfig::default();
        assert_eq!((config.window_width, config.window_height), (512, 512));
        assert_eq!(config.shadow_map_resolution, 1024);
        assert_eq!(config.light.position, Vector3::new(0.0, 4.0, 15.0));
        assert_eq!(config.light.right, 30.0);
        assert!(config.eye.znear > 0.0 && config.eye.znear < config.eye.zfar);
        assert!(!config.debug_view);
    }

    #[test]
    fn test_window_size_updates_eye_aspect() {
        let config = RendererConfig::default().with_window_size(800, 400);
        assert_eq!(config.eye.aspect, 2.0);
    }

    #[test]
    fn test_demo_scene() {
        let scene = SceneDescription::demo(Path::new("assets"));
        assert_eq!(scene.models.len(), 3);
        assert_eq!(scene.models[0].path, scene.models[1].path);
        assert_eq!(scene.models[2].transform.scale, Vector3::new(10.0, 10.0, 10.0));

        let marker = scene.light_marker.unwrap();
        assert_eq!(marker.transform.rotate, Vector3::new(0.0, 180.0, 0.0));
        assert_eq!(
            scene.skybox.unwrap().right,
            Path::new("assets/skybox/Box_Right.bmp")
        );
    }
}
