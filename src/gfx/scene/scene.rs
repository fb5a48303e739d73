use cgmath::Vector3;

use super::{model::Model, skybox::Skybox};
use crate::gfx::camera::{Camera, CameraController, KeyboardState};

/// Offset of the light marker from the light position
pub const LIGHT_MARKER_OFFSET: Vector3<f32> = Vector3::new(0.0, 0.0, 2.0);

/// Model drawn where the light is, so the light can be seen moving
pub struct LightMarker {
    pub model: Model,
    pub offset: Vector3<f32>,
}

impl LightMarker {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            offset: LIGHT_MARKER_OFFSET,
        }
    }

    /// Moves the marker to `light_position + offset`
    pub fn snap_to(&mut self, light_position: Vector3<f32>) {
        self.model.transform.translate = light_position + self.offset;
    }
}

/// Main scene: eye and light cameras, the objects, the light marker and the sky
pub struct Scene {
    pub eye: Camera,
    pub light: Camera,
    pub objects: Vec<Model>,
    pub light_marker: Option<LightMarker>,
    pub skybox: Option<Skybox>,
}

impl Scene {
    pub fn new(eye: Camera, light: Camera) -> Self {
        Self {
            eye,
            light,
            objects: Vec::new(),
            light_marker: None,
            skybox: None,
        }
    }

    pub fn add_object(&mut self, model: Model) {
        self.objects.push(model);
    }

    pub fn set_light_marker(&mut self, model: Model) {
        let mut marker = LightMarker::new(model);
        marker.snap_to(self.light.position);
        self.light_marker = Some(marker);
    }

    pub fn set_skybox(&mut self, skybox: Skybox) {
        self.skybox = Some(skybox);
    }

    /// Per-frame CPU update ahead of the passes
    ///
    /// Applies input movement, aims the light at the world origin and snaps
    /// the marker and the skybox to their anchors.
    pub fn update(&mut self, keys: &KeyboardState, controller: &CameraController) {
        controller.apply_movement(keys, &mut self.eye, &mut self.light);
        self.light.aim_at(Vector3::new(0.0, 0.0, 0.0));

        if let Some(marker) = &mut self.light_marker {
            marker.snap_to(self.light.position);
        }
        if let Some(skybox) = &mut self.skybox {
            skybox.follow(self.eye.position);
        }
    }

    /// Uploads every model's world matrix
    pub fn prepare(&mut self, queue: &wgpu::Queue) {
        for model in &mut self.objects {
            model.prepare(queue);
        }
        if let Some(marker) = &mut self.light_marker {
            marker.model.prepare(queue);
        }
        if let Some(skybox) = &mut self.skybox {
            skybox.model.prepare(queue);
        }
    }

    /// Models drawn by the shadow and geometry passes, marker last
    pub fn drawables(&self) -> impl Iterator<Item = &Model> {
        self.objects
            .iter()
            .chain(self.light_marker.as_ref().map(|marker| &marker.model))
    }

    pub fn drawable_count(&self) -> usize {
        self.objects.len() + usize::from(self.light_marker.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, InnerSpace};
    use winit::keyboard::KeyCode;

    fn demo_scene() -> Scene {
        Scene::new(
            Camera::perspective(Vector3::new(0.0, 0.0, 0.0), Deg(70.0), 1.0),
            Camera::orthographic(Vector3::new(0.0, 4.0, 15.0), 30.0),
        )
    }

    #[test]
    fn test_empty_scene_updates_and_draws_nothing() {
        let mut scene = demo_scene();
        let controller = CameraController::new(0.035, 35.0);
        scene.update(&KeyboardState::new(), &controller);

        assert_eq!(scene.drawables().count(), 0);
        assert_eq!(scene.drawable_count(), 0);
        let expected = Vector3::new(0.0, -4.0, -15.0).normalize();
        assert!((scene.light.direction - expected).magnitude() < 1e-6);
    }

    #[test]
    fn test_light_marker_tracks_light_after_every_update() {
        let mut scene = demo_scene();
        scene.add_object(Model::empty("tree"));
        scene.add_object(Model::empty("plane"));
        scene.set_light_marker(Model::empty("lamp"));

        let controller = CameraController::new(0.5, 35.0);
        let mut keys = KeyboardState::new();
        keys.set(KeyCode::KeyJ, true);
        keys.set(KeyCode::KeyK, true);

        for _ in 0..3 {
            scene.update(&keys, &controller);
            let marker = scene.light_marker.as_ref().unwrap();
            assert_eq!(
                marker.model.transform.translate,
                scene.light.position + Vector3::new(0.0, 0.0, 2.0)
            );
        }
        assert_eq!(scene.light.position, Vector3::new(1.5, 2.5, 15.0));
    }

    #[test]
    fn test_marker_is_drawn_after_objects() {
        let mut scene = demo_scene();
        scene.set_light_marker(Model::empty("lamp"));
        scene.add_object(Model::empty("tree"));
        scene.add_object(Model::empty("plane"));

        let names: Vec<&str> = scene.drawables().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["tree", "plane", "lamp"]);
        assert_eq!(scene.drawable_count(), 3);
    }
}
