//! Perspective camera in rendering space.

use glam::{Mat4, Quat, Vec3};

/// A perspective camera. Positions are in rendering units.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

impl Camera {
    /// Place a camera at `eye` looking towards `target`.
    pub fn looking_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let mut camera = Self {
            position: eye,
            ..Self::default()
        };
        camera.look_at(target, up);
        camera
    }

    /// Rotate in place to face `target`.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let world = Mat4::look_at_rh(self.position, target, up).inverse();
        let (_, rotation, _) = world.to_scale_rotation_translation();
        self.rotation = rotation.normalize();
    }

    /// Compute the view matrix (inverse of camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        (Mat4::from_translation(self.position) * Mat4::from_quat(self.rotation)).inverse()
    }

    /// Right-handed perspective with depth mapped to `[0, 1]`.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// The up direction vector (+Y in camera space).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        self.aspect_ratio = width / height;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y: 75f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 5000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_camera_looks_down_neg_z() {
        let forward = Camera::default().forward();
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_looking_at_faces_target() {
        let camera = Camera::looking_at(Vec3::new(40.0, 0.0, 0.0), Vec3::ZERO, Vec3::Z);
        assert!((camera.forward() - Vec3::NEG_X).length() < 1e-5);
        assert!((camera.up() - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_view_matrix_inverse_is_camera_transform() {
        let camera = Camera::looking_at(Vec3::new(10.0, 20.0, 30.0), Vec3::ZERO, Vec3::Y);
        let reconstructed = camera.view_matrix().inverse().col(3).truncate();
        assert!((reconstructed - camera.position).length() < 1e-4);
    }

    #[test]
    fn test_standard_depth_range() {
        let camera = Camera {
            near: 1.0,
            far: 100.0,
            ..Camera::default()
        };
        let vp = camera.view_projection_matrix();
        let near = vp * glam::Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = vp * glam::Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_aspect_ratio() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1920.0, 1080.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }
}
