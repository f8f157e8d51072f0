use lib_math::{Frustum, Mat3, Mat4, Quat, Vec3, rotate_around_axis};

use crate::scene::{CAMERA_EYE, CAMERA_TARGET};

pub const NEAR_CLIP: f32 = 0.2;
pub const FAR_CLIP: f32 = 1000.0;

/// A first-person camera.
///
/// Right-handed: the camera looks down its local -Z with +Y up, and clip
/// space depth runs `[0, 1]` from the near to the far plane. Matrices are
/// only refreshed by [`update_matrices`](Self::update_matrices).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    right: Vec3,
    up: Vec3,
    forward: Vec3,

    /// Vertical field of view in radians.
    pub vertical_fov: f32,
    pub aspect: f32,
    pub near_clip: f32,
    pub far_clip: f32,

    /// Units per second.
    pub movement_speed: f32,
    /// Degrees per second at full key or stick deflection.
    pub look_speed: f32,
    /// Degrees per mouse count.
    pub mouse_sensitivity: f32,

    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
    frustum: Frustum,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            eye: CAMERA_EYE,
            right: Vec3::X,
            up: Vec3::Y,
            forward: Vec3::NEG_Z,
            vertical_fov: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near_clip: NEAR_CLIP,
            far_clip: FAR_CLIP,
            movement_speed: 10.0,
            look_speed: 90.0,
            mouse_sensitivity: 0.15,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            frustum: Frustum::from_view_projection(&Mat4::IDENTITY),
        };

        camera.look_at(CAMERA_TARGET);
        camera.update_matrices();

        camera
    }
}

impl Camera {
    /// Turns the camera toward `target`, keeping world up as close to up as
    /// possible.
    pub fn look_at(&mut self, target: Vec3) {
        let forward = (target - self.eye).normalize_or_zero();
        if forward == Vec3::ZERO {
            return;
        }

        let reference_up = if forward.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };

        self.forward = forward;
        self.right = forward.cross(reference_up).normalize();
        self.up = self.right.cross(forward);
    }

    /// Rotates the basis `angle` radians around `axis`.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        self.right = rotate_around_axis(self.right, axis, angle);
        self.up = rotate_around_axis(self.up, axis, angle);
        self.forward = rotate_around_axis(self.forward, axis, angle);
    }

    /// Positive angles look up.
    pub fn pitch(&mut self, angle: f32) {
        self.rotate(self.right, angle);
    }

    /// Positive angles turn left, around world up.
    pub fn yaw(&mut self, angle: f32) {
        self.rotate(Vec3::Y, angle);
    }

    /// Moves the eye along the camera's own axes: `x` right, `y` up, `z`
    /// forward.
    pub fn move_local(&mut self, delta: Vec3) {
        self.eye += self.right * delta.x + self.up * delta.y + self.forward * delta.z;
    }

    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn update_matrices(&mut self) {
        self.orthonormalize();

        self.view = Mat4::look_to_rh(self.eye, self.forward, self.up);
        self.projection =
            Mat4::perspective_rh(self.vertical_fov, self.aspect, self.near_clip, self.far_clip);
        self.view_projection = self.projection * self.view;
        self.frustum = Frustum::from_view_projection(&self.view_projection);
    }

    /// A copy of this camera moved to `position` and turned to
    /// `orientation`, with fresh matrices. The projection is left to the
    /// caller when it does not come from the field of view.
    pub fn with_pose(&self, position: Vec3, orientation: Quat) -> Camera {
        let mut camera = self.clone();

        camera.eye = position;
        camera.right = orientation * Vec3::X;
        camera.up = orientation * Vec3::Y;
        camera.forward = orientation * Vec3::NEG_Z;
        camera.update_matrices();

        camera
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_mat3(&Mat3::from_cols(self.right, self.up, -self.forward)).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// A point one unit in front of the eye.
    pub fn target(&self) -> Vec3 {
        self.eye + self.forward
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn point_in_frustum(&self, point: Vec3) -> bool {
        self.frustum.contains_point(point)
    }

    fn orthonormalize(&mut self) {
        self.forward = self.forward.normalize();
        self.right = self.forward.cross(self.up).normalize();
        self.up = self.right.cross(self.forward);
    }
}
