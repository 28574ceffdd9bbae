use glam::{Mat3, Mat4, Vec3};

/// A snapshot of where the viewer is and what it sees.
///
/// Produced by [`FreelookCamera::camera`](crate::FreelookCamera::camera) once
/// per frame and consumed read-only by the render passes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Unit view direction.
    pub front: Vec3,
    pub up: Vec3,
    pub fov: f32, // degrees
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Perspective projection with wgpu's `[0, 1]` depth range.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }

    /// View matrix with the translation dropped, for drawing the skybox.
    pub fn skybox_view(&self) -> Mat4 {
        strip_translation(self.view_matrix())
    }
}

/// Keep only the rotation part of a view matrix.
pub fn strip_translation(view: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(view))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_view_looks_down_negative_z() {
        let camera = Camera::default();
        let expected = Mat4::look_at_rh(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::Y,
        );
        assert_eq!(camera.view_matrix(), expected);
    }

    #[test]
    fn skybox_view_has_no_translation() {
        let positions = [
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(-120.0, 4.5, 7.25),
            Vec3::new(1e4, -1e4, 3.0),
        ];
        for position in positions {
            let camera = Camera {
                position,
                front: Vec3::new(0.3, -0.2, -1.0).normalize(),
                ..Camera::default()
            };
            let sky = camera.skybox_view();
            assert_eq!(sky.w_axis, glam::Vec4::W, "camera at {position}");
            assert_eq!(sky.transform_point3(Vec3::ZERO), Vec3::ZERO);
        }
    }

    #[test]
    fn skybox_view_keeps_rotation() {
        let camera = Camera {
            position: Vec3::new(5.0, 1.0, -2.0),
            front: Vec3::X,
            ..Camera::default()
        };
        let full = camera.view_matrix();
        let sky = camera.skybox_view();
        let dir = Vec3::new(0.2, 0.7, -0.4);
        assert!(
            full.transform_vector3(dir)
                .abs_diff_eq(sky.transform_vector3(dir), 1e-6)
        );
    }

    #[test]
    fn projection_uses_zero_to_one_depth() {
        let camera = Camera::default();
        let proj = camera.projection_matrix(16.0 / 9.0);

        let near = proj * glam::Vec4::new(0.0, 0.0, -camera.near, 1.0);
        let far = proj * glam::Vec4::new(0.0, 0.0, -camera.far, 1.0);
        approx::assert_abs_diff_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        approx::assert_abs_diff_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }
}
