use std::collections::HashSet;

use glam::Vec2;
use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::freelook_camera::CameraMovement;

/// Pixels per scroll "line" for touchpads that report pixel deltas.
const PIXELS_PER_LINE: f32 = 120.0;

const MOVEMENT_KEYS: [(KeyCode, CameraMovement); 4] = [
    (KeyCode::KeyW, CameraMovement::Forward),
    (KeyCode::KeyS, CameraMovement::Backward),
    (KeyCode::KeyA, CameraMovement::Left),
    (KeyCode::KeyD, CameraMovement::Right),
];

/// Input gathered between frames.
///
/// Held keys persist across frames. Pointer and scroll deltas accumulate
/// until [`begin_frame`](Self::begin_frame) clears them.
#[derive(Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    pointer_delta: Vec2,
    scroll_delta: f32,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-frame deltas. Call after the frame has consumed them.
    pub fn begin_frame(&mut self) {
        self.pointer_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press(key),
                        ElementState::Released => self.release(key),
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => self.scroll(scroll_lines(*delta)),
            WindowEvent::Focused(false) => self.clear(),
            _ => {}
        }
    }

    /// Raw pointer motion, unaffected by cursor grab or window edges.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.pointer_delta += Vec2::new(*dx as f32, *dy as f32);
        }
    }

    pub fn press(&mut self, key: KeyCode) {
        self.keys_down.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.keys_down.remove(&key);
    }

    /// Accumulate scroll in lines.
    pub fn scroll(&mut self, lines: f32) {
        self.scroll_delta += lines;
    }

    /// Drop all held keys and pending deltas.
    pub fn clear(&mut self) {
        self.keys_down.clear();
        self.begin_frame();
    }

    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Camera movements for every held movement key, in W, S, A, D order.
    pub fn movements(&self) -> impl Iterator<Item = CameraMovement> + '_ {
        MOVEMENT_KEYS
            .iter()
            .filter(|(key, _)| self.key_down(*key))
            .map(|(_, movement)| *movement)
    }

    /// Pointer movement since the last frame, in pixels.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_delta
    }

    /// Vertical scroll since the last frame, in lines. Positive is away from the user.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }
}

/// Vertical scroll amount in lines.
pub fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn held_keys_map_to_movements() {
        let mut input = Input::new();
        input.press(KeyCode::KeyD);
        input.press(KeyCode::KeyW);
        input.press(KeyCode::KeyQ);

        let movements: Vec<_> = input.movements().collect();
        assert_eq!(movements, [CameraMovement::Forward, CameraMovement::Right]);

        input.release(KeyCode::KeyW);
        let movements: Vec<_> = input.movements().collect();
        assert_eq!(movements, [CameraMovement::Right]);
    }

    #[test]
    fn keys_survive_begin_frame() {
        let mut input = Input::new();
        input.press(KeyCode::KeyS);
        input.begin_frame();
        assert!(input.key_down(KeyCode::KeyS));
    }

    #[test]
    fn pointer_motion_accumulates_until_frame_start() {
        let mut input = Input::new();
        input.handle_device_event(&DeviceEvent::MouseMotion { delta: (3.0, -1.0) });
        input.handle_device_event(&DeviceEvent::MouseMotion { delta: (2.0, 4.0) });
        assert_eq!(input.pointer_delta(), Vec2::new(5.0, 3.0));

        input.begin_frame();
        assert_eq!(input.pointer_delta(), Vec2::ZERO);
    }

    #[test]
    fn scroll_deltas_convert_to_lines() {
        assert_eq!(scroll_lines(MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        assert_eq!(
            scroll_lines(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -240.0))),
            -2.0
        );
    }

    #[test]
    fn focus_loss_clears_held_keys() {
        let mut input = Input::new();
        input.press(KeyCode::KeyA);
        input.handle_device_event(&DeviceEvent::MouseMotion { delta: (1.0, 1.0) });

        input.handle_event(&WindowEvent::Focused(false));
        assert!(!input.key_down(KeyCode::KeyA));
        assert_eq!(input.pointer_delta(), Vec2::ZERO);
        assert_eq!(input.movements().count(), 0);
    }
}
