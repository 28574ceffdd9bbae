//! A first-person freelook camera driven by keyboard, pointer, and scroll.
//!
//! [`FreelookCamera`] owns the viewer's position and yaw/pitch orientation.
//! Input handlers mutate it between frames; the frame driver reads a
//! [`Camera`] snapshot from it each frame.
//!
//! # Controls
//!
//! - **W/S**: Move along the view direction
//! - **A/D**: Strafe along `normalize(front × up)`
//! - **Pointer**: Yaw and pitch, 0.1 degrees per pixel by default
//! - **Scroll**: Zoom between 1 and 45 degrees of field of view
//!
//! # Example
//!
//! ```
//! use shadowbox::{CameraMovement, FreelookCamera, Vec2};
//!
//! let mut camera = FreelookCamera::new();
//! camera.apply_keyboard(CameraMovement::Forward, 0.016);
//! camera.apply_pointer_delta(Vec2::new(4.0, -2.0)); // swallowed: first motion
//! camera.apply_pointer_delta(Vec2::new(4.0, -2.0));
//! camera.apply_scroll(1.0);
//!
//! let view = camera.view_matrix();
//! # let _ = view;
//! ```

use glam::{Mat4, Vec2, Vec3};

use crate::camera::Camera;

/// Keyboard movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Pitch stays strictly inside ±90° to keep the basis from flipping.
pub const PITCH_LIMIT: f32 = 89.0;
pub const MIN_FOV: f32 = 1.0;
pub const MAX_FOV: f32 = 45.0;

/// First-person camera state.
///
/// Angles are in degrees. `front` is always unit length and is recomputed
/// from yaw and pitch after every orientation change.
#[derive(Clone, Debug)]
pub struct FreelookCamera {
    pub position: Vec3,
    front: Vec3,
    /// World up, used for strafing and the view matrix.
    pub up: Vec3,
    /// Horizontal angle. -90 looks toward -Z.
    yaw: f32,
    /// Vertical angle, clamped to ±[`PITCH_LIMIT`].
    pitch: f32,
    /// Field of view, clamped to [[`MIN_FOV`], [`MAX_FOV`]].
    fov: f32,
    /// Movement speed in units per second.
    pub speed: f32,
    /// Degrees per pointer pixel.
    pub sensitivity: f32,
    pub near: f32,
    pub far: f32,
    first_pointer: bool,
}

impl Default for FreelookCamera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            fov: MAX_FOV,
            speed: 3.5,
            sensitivity: 0.1,
            near: 0.1,
            far: 100.0,
            first_pointer: true,
        };
        camera.update_front();
        camera
    }
}

impl FreelookCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting position.
    pub fn position(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    /// Set movement speed in units per second.
    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set pointer sensitivity in degrees per pixel.
    pub fn sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Set the starting orientation in degrees. Pitch is clamped.
    pub fn orientation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_front();
        self
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Unit strafe direction.
    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize()
    }

    /// Move by `speed * elapsed` along the view or strafe direction.
    ///
    /// No collision: the camera passes through geometry.
    pub fn apply_keyboard(&mut self, direction: CameraMovement, elapsed: f32) {
        let distance = self.speed * elapsed;
        match direction {
            CameraMovement::Forward => self.position += distance * self.front,
            CameraMovement::Backward => self.position -= distance * self.front,
            CameraMovement::Left => self.position -= self.right() * distance,
            CameraMovement::Right => self.position += self.right() * distance,
        }
    }

    /// Turn by a raw pointer delta in pixels (screen y grows downward).
    ///
    /// The first delta after construction or [`release_pointer`](Self::release_pointer)
    /// is discarded so reacquiring the pointer never causes a jump.
    pub fn apply_pointer_delta(&mut self, delta: Vec2) {
        if self.first_pointer {
            self.first_pointer = false;
            return;
        }

        let offset = delta * self.sensitivity;
        self.yaw += offset.x;
        self.pitch = (self.pitch - offset.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_front();
    }

    /// Forget pointer history, e.g. after the window loses focus.
    pub fn release_pointer(&mut self) {
        self.first_pointer = true;
    }

    /// Zoom: scrolling up narrows the field of view.
    pub fn apply_scroll(&mut self, delta: f32) {
        self.fov = (self.fov - delta).clamp(MIN_FOV, MAX_FOV);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.camera().view_matrix()
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        self.camera().projection_matrix(aspect)
    }

    /// Current state as a render-side snapshot.
    pub fn camera(&self) -> Camera {
        Camera {
            position: self.position,
            front: self.front,
            up: self.up,
            fov: self.fov,
            near: self.near,
            far: self.far,
        }
    }

    fn update_front(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
    }
}
