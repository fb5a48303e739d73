use std::collections::HashSet;

use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::camera::Camera;

/// Pressed/released state for every physical key seen so far
#[derive(Debug, Default, Clone)]
pub struct KeyboardState {
    pressed: HashSet<KeyCode>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_key_event(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(code) = event.physical_key {
            self.set(code, event.state == ElementState::Pressed);
        }
    }

    pub fn set(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }
}

/// Signal currently turning the eye
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookSource {
    /// Offset of the cursor from the window centre, re-centred after each
    /// event; only meaningful while the platform can warp the cursor
    #[default]
    CursorOffset,
    /// Raw `DeviceEvent::MouseMotion` deltas, once the first one arrives
    RawMotion,
    /// Cursor warping failed and no raw motion has been seen yet
    Disabled,
}

/// First-person eye controls plus the light nudging keys
///
/// Movement is applied once per frame at a fixed step, so speed follows the
/// frame rate.
pub struct CameraController {
    pub move_speed: f32,
    /// Degrees of rotation for a cursor offset of one full window extent
    pub look_sensitivity: f32,
    look_source: LookSource,
}

impl CameraController {
    pub fn new(move_speed: f32, look_sensitivity: f32) -> Self {
        Self {
            move_speed,
            look_sensitivity,
            look_source: LookSource::default(),
        }
    }

    pub fn look_source(&self) -> LookSource {
        self.look_source
    }

    /// Moves the eye with W/A/S/D, Space and Left Ctrl, the light with I/J/K/L
    pub fn apply_movement(&self, keys: &KeyboardState, eye: &mut Camera, light: &mut Camera) {
        let speed = self.move_speed;

        if keys.is_pressed(KeyCode::KeyW) {
            eye.position += eye.direction * speed;
        }
        if keys.is_pressed(KeyCode::KeyS) {
            eye.position -= eye.direction * speed;
        }
        if keys.is_pressed(KeyCode::KeyA) {
            eye.position -= eye.right_vector() * speed;
        }
        if keys.is_pressed(KeyCode::KeyD) {
            eye.position += eye.right_vector() * speed;
        }
        if keys.is_pressed(KeyCode::ControlLeft) {
            eye.position.y -= speed;
        }
        if keys.is_pressed(KeyCode::Space) {
            eye.position.y += speed;
        }

        if keys.is_pressed(KeyCode::KeyJ) {
            light.position.x += speed;
        }
        if keys.is_pressed(KeyCode::KeyL) {
            light.position.x -= speed;
        }
        if keys.is_pressed(KeyCode::KeyI) {
            light.position.y += speed;
        }
        if keys.is_pressed(KeyCode::KeyK) {
            light.position.y -= speed;
        }
    }

    /// Turns the eye by the cursor's offset from the window centre
    ///
    /// The caller warps the cursor back to [`window_center`] afterwards, which
    /// gives unbounded look rotation. Ignored once raw motion drives the look
    /// or warping has failed, as the offset would then never return to zero.
    pub fn process_cursor(
        &self,
        position: PhysicalPosition<f64>,
        window_size: PhysicalSize<u32>,
        eye: &mut Camera,
    ) {
        if self.look_source != LookSource::CursorOffset {
            return;
        }
        let center = window_center(window_size);
        self.turn(
            (position.x - center.x, position.y - center.y),
            window_size,
            eye,
        );
    }

    /// Turns the eye by a raw mouse delta, scaled like a cursor offset
    pub fn process_mouse_motion(
        &mut self,
        delta: (f64, f64),
        window_size: PhysicalSize<u32>,
        eye: &mut Camera,
    ) {
        if self.look_source != LookSource::RawMotion {
            log::debug!("raw mouse motion available, cursor offsets ignored from now on");
            self.look_source = LookSource::RawMotion;
        }
        self.turn(delta, window_size, eye);
    }

    /// Records that the cursor could not be re-centred
    pub fn cursor_warp_failed(&mut self) {
        if self.look_source == LookSource::CursorOffset {
            log::warn!("cursor cannot be re-centred, mouse look waits for raw motion");
            self.look_source = LookSource::Disabled;
        }
    }

    fn turn(&self, offset: (f64, f64), window_size: PhysicalSize<u32>, eye: &mut Camera) {
        if window_size.width == 0 || window_size.height == 0 {
            return;
        }
        let dx = offset.0 as f32 / window_size.width as f32;
        let dy = offset.1 as f32 / window_size.height as f32;

        eye.add_yaw(self.look_sensitivity * dx);
        eye.add_pitch(-self.look_sensitivity * dy);
    }
}

pub fn window_center(window_size: PhysicalSize<u32>) -> PhysicalPosition<f64> {
    PhysicalPosition::new(
        window_size.width as f64 / 2.0,
        window_size.height as f64 / 2.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_keyboard_state_tracks_press_and_release() {
        let mut keys = KeyboardState::new();
        keys.set(KeyCode::KeyW, true);
        assert!(keys.is_pressed(KeyCode::KeyW));
        keys.set(KeyCode::KeyW, false);
        assert!(!keys.is_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_forward_movement_follows_direction() {
        let controller = CameraController::new(0.5, 35.0);
        let mut keys = KeyboardState::new();
        keys.set(KeyCode::KeyW, true);

        let mut eye = Camera::default();
        let mut light = Camera::default();
        controller.apply_movement(&keys, &mut eye, &mut light);

        assert_eq!(eye.position, Vector3::new(0.0, 0.0, -0.5));
        assert_eq!(light.position, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_light_keys_move_light_only() {
        let controller = CameraController::new(1.0, 35.0);
        let mut keys = KeyboardState::new();
        keys.set(KeyCode::KeyJ, true);
        keys.set(KeyCode::KeyI, true);

        let mut eye = Camera::default();
        let mut light = Camera::default();
        controller.apply_movement(&keys, &mut eye, &mut light);

        assert_eq!(light.position, Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(eye.position, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_cursor_at_center_does_not_turn() {
        let controller = CameraController::new(0.035, 35.0);
        let size = PhysicalSize::new(512, 512);
        let mut eye = Camera::default();

        controller.process_cursor(window_center(size), size, &mut eye);
        assert_eq!(eye.yaw, 0.0);
        assert_eq!(eye.pitch, 0.0);

        controller.process_cursor(PhysicalPosition::new(512.0, 0.0), size, &mut eye);
        assert!((eye.yaw - 17.5).abs() < 1e-5);
        assert!((eye.pitch - 17.5).abs() < 1e-5);
    }

    #[test]
    fn test_mouse_motion_turns_like_a_cursor_offset() {
        let mut controller = CameraController::new(0.035, 35.0);
        let size = PhysicalSize::new(512, 512);
        let mut eye = Camera::default();

        controller.process_mouse_motion((256.0, -256.0), size, &mut eye);
        assert!((eye.yaw - 17.5).abs() < 1e-5);
        assert!((eye.pitch - 17.5).abs() < 1e-5);
        assert_eq!(controller.look_source(), LookSource::RawMotion);
    }

    #[test]
    fn test_cursor_offsets_ignored_once_raw_motion_arrives() {
        let mut controller = CameraController::new(0.035, 35.0);
        let size = PhysicalSize::new(512, 512);
        let mut eye = Camera::default();

        controller.process_mouse_motion((0.0, 0.0), size, &mut eye);
        controller.process_cursor(PhysicalPosition::new(512.0, 512.0), size, &mut eye);
        assert_eq!(eye.yaw, 0.0);
        assert_eq!(eye.pitch, 0.0);
    }

    #[test]
    fn test_stuck_cursor_stops_turning_after_failed_warp() {
        let mut controller = CameraController::new(0.035, 35.0);
        let size = PhysicalSize::new(512, 512);
        let off_center = PhysicalPosition::new(400.0, 256.0);
        let mut eye = Camera::default();

        controller.process_cursor(off_center, size, &mut eye);
        let yaw = eye.yaw;
        assert!(yaw > 0.0);

        controller.cursor_warp_failed();
        for _ in 0..10 {
            controller.process_cursor(off_center, size, &mut eye);
        }
        assert_eq!(eye.yaw, yaw);
        assert_eq!(controller.look_source(), LookSource::Disabled);

        controller.process_mouse_motion((12.0, 0.0), size, &mut eye);
        assert!(eye.yaw > yaw);
    }
}
