//! Viewpoint used for both the eye and the shadow-casting light
//!
//! The camera keeps an explicit view direction. The eye camera derives it from
//! pitch/yaw every time the view matrix is requested; the light camera is
//! aimed explicitly with [`Camera::aim_at`] and uses the stored direction.

use cgmath::{ortho, perspective, Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

use super::camera_utils::{wrap_degrees, OPENGL_TO_WGPU_MATRIX};

/// Pitch limit that keeps the view direction away from the up vector
pub const MAX_PITCH: f32 = 89.0;

/// Position, orientation and projection parameters of a viewpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vector3<f32>,
    /// Unit view direction
    pub direction: Vector3<f32>,
    pub up: Vector3<f32>,
    /// Degrees, clamped to [-89, 89]
    pub pitch: f32,
    /// Degrees, wrapped to [-180, 180)
    pub yaw: f32,

    // perspective projection
    pub fovy: Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,

    // orthographic projection
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            pitch: 0.0,
            yaw: 0.0,
            fovy: Deg(70.0),
            aspect: 1.0,
            znear: 0.01,
            zfar: 100.0,
            left: -1.0,
            right: 1.0,
            top: 1.0,
            bottom: -1.0,
        }
    }
}

impl Camera {
    /// Perspective eye camera at `position` looking down -Z
    pub fn perspective(position: Vector3<f32>, fovy: Deg<f32>, aspect: f32) -> Self {
        Self {
            position,
            fovy,
            aspect,
            ..Default::default()
        }
    }

    /// Orthographic camera with a symmetric `half_extent` box, as used by the light
    pub fn orthographic(position: Vector3<f32>, half_extent: f32) -> Self {
        Self {
            position,
            left: -half_extent,
            right: half_extent,
            bottom: -half_extent,
            top: half_extent,
            ..Default::default()
        }
    }

    /// Forward vector derived from pitch and yaw (right-handed, yaw 0 looks along -Z)
    pub fn orientation_direction(&self) -> Vector3<f32> {
        let pitch = Deg(self.pitch);
        let yaw = Deg(self.yaw);
        let (sin_pitch, cos_pitch) = cgmath::Angle::sin_cos(pitch);
        let (sin_yaw, cos_yaw) = cgmath::Angle::sin_cos(yaw);
        Vector3::new(cos_pitch * sin_yaw, sin_pitch, -cos_pitch * cos_yaw)
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.direction = self.orientation_direction();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = wrap_degrees(yaw);
        self.direction = self.orientation_direction();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Points the stored direction at `target`
    ///
    /// Leaves the direction untouched when the camera sits on the target.
    pub fn aim_at(&mut self, target: Vector3<f32>) {
        let offset = target - self.position;
        if offset.magnitude2() > f32::EPSILON {
            self.direction = offset.normalize();
        }
    }

    /// Unit vector pointing to the camera's right
    pub fn right_vector(&self) -> Vector3<f32> {
        self.direction.cross(self.up).normalize()
    }

    /// World-to-view transform
    ///
    /// With `use_orientation` the direction is first recomputed from pitch/yaw
    /// (eye camera); without it the stored direction is used verbatim (light).
    pub fn view_matrix(&mut self, use_orientation: bool) -> Matrix4<f32> {
        if use_orientation {
            self.direction = self.orientation_direction();
        }
        let eye = Point3::from_vec(self.position);
        Matrix4::look_at_rh(eye, eye + self.direction, self.up)
    }

    /// View-to-clip transform in wgpu clip space (depth 0 at near, 1 at far)
    pub fn projection_matrix(&self, use_perspective: bool) -> Matrix4<f32> {
        let projection = if use_perspective {
            perspective(self.fovy, self.aspect, self.znear, self.zfar)
        } else {
            ortho(
                self.left,
                self.right,
                self.bottom,
                self.top,
                self.znear,
                self.zfar,
            )
        };
        OPENGL_TO_WGPU_MATRIX * projection
    }

    pub fn view_projection(&mut self, use_orientation: bool, use_perspective: bool) -> Matrix4<f32> {
        let view = self.view_matrix(use_orientation);
        self.projection_matrix(use_perspective) * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4, "{a} != {b}");
    }

    fn clip_depth(projection: Matrix4<f32>, view_z: f32) -> f32 {
        let clip = projection * Vector4::new(0.0, 0.0, view_z, 1.0);
        clip.z / clip.w
    }

    #[test]
    fn test_direction_is_unit_over_pitch_yaw_domain() {
        let mut camera = Camera::default();
        let mut pitch = -89.0;
        while pitch <= 89.0 {
            let mut yaw = -180.0;
            while yaw < 180.0 {
                camera.pitch = pitch;
                camera.yaw = yaw;
                assert_close(camera.orientation_direction().magnitude(), 1.0);
                yaw += 15.0;
            }
            pitch += 11.125;
        }
    }

    #[test]
    fn test_zero_orientation_looks_down_negative_z() {
        let camera = Camera::default();
        let direction = camera.orientation_direction();
        assert_close(direction.x, 0.0);
        assert_close(direction.y, 0.0);
        assert_close(direction.z, -1.0);
    }

    #[test]
    fn test_view_matrix_maps_position_to_origin() {
        let mut camera = Camera::perspective(Vector3::new(3.0, -2.0, 7.5), Deg(70.0), 1.0);
        camera.set_pitch(30.0);
        camera.set_yaw(-120.0);

        let view = camera.view_matrix(true);
        let origin = view * camera.position.extend(1.0);
        assert_close(origin.x, 0.0);
        assert_close(origin.y, 0.0);
        assert_close(origin.z, 0.0);
        assert_close(origin.w, 1.0);
    }

    #[test]
    fn test_view_matrix_without_orientation_keeps_direction() {
        let mut light = Camera::orthographic(Vector3::new(0.0, 4.0, 15.0), 30.0);
        light.aim_at(Vector3::new(0.0, 0.0, 0.0));
        let aimed = light.direction;

        light.pitch = 45.0;
        light.view_matrix(false);
        assert_eq!(light.direction, aimed);
        assert_close(aimed.magnitude(), 1.0);
    }

    #[test]
    fn test_pitch_is_clamped_and_yaw_wrapped() {
        let mut camera = Camera::default();
        camera.add_pitch(120.0);
        assert_eq!(camera.pitch, MAX_PITCH);
        camera.add_pitch(-400.0);
        assert_eq!(camera.pitch, -MAX_PITCH);

        camera.set_yaw(170.0);
        camera.add_yaw(20.0);
        assert_close(camera.yaw, -170.0);
    }

    #[test]
    fn test_perspective_maps_near_and_far_to_unit_depth() {
        let camera = Camera::default();
        let projection = camera.projection_matrix(true);
        assert_close(clip_depth(projection, -camera.znear), 0.0);
        assert_close(clip_depth(projection, -camera.zfar), 1.0);
    }

    #[test]
    fn test_orthographic_maps_near_and_far_to_unit_depth() {
        let camera = Camera::orthographic(Vector3::new(0.0, 4.0, 15.0), 30.0);
        let projection = camera.projection_matrix(false);
        assert_close(clip_depth(projection, -camera.znear), 0.0);
        assert_close(clip_depth(projection, -camera.zfar), 1.0);
    }
}
