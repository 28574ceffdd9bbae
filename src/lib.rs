//! # Shadowbox
//!
//! **A shadow-mapped interior room with a free-look camera.**
//!
//! Each frame renders the room's depth from a single orthographic light, then
//! draws the room from the camera with ambient, diffuse and specular lighting
//! attenuated by that shadow map, and finally fills the background with a
//! skybox.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> Result<(), shadowbox::AppError> {
//!     shadowbox::run_with_config(
//!         shadowbox::AppConfig::new()
//!             .title("Room")
//!             .size(1280, 720)
//!             .asset_dir("assets"),
//!     )
//! }
//! ```
//!
//! Move with W/A/S/D, look around with the mouse and zoom with the wheel.
//!
//! The numeric parts (camera, scene graph, light frustum, shadow lookup) do not
//! need a GPU and can be used on their own:
//!
//! ```
//! use shadowbox::{CameraMovement, FreelookCamera};
//!
//! let mut camera = FreelookCamera::new();
//! camera.apply_keyboard(CameraMovement::Forward, 1.0);
//! assert!((camera.position.z - (3.0 - 3.5)).abs() < 1e-5);
//! ```

mod app;
mod camera;
mod color_pass;
mod error;
mod freelook_camera;
mod gpu;
mod input;
mod mesh;
pub mod scene;
mod scene_draw;
pub mod shader;
pub mod shadow;
mod skybox;
mod texture;

pub use app::{AppConfig, FrameClock, run, run_with_config};
pub use camera::{Camera, strip_translation};
pub use color_pass::{ColorPass, SceneUniforms};
pub use error::{AppError, GpuError, SceneError, ShaderError, TextureError};
pub use freelook_camera::{CameraMovement, FreelookCamera, MAX_FOV, MIN_FOV, PITCH_LIMIT};
pub use gpu::GpuContext;
pub use input::{Input, scroll_lines};
pub use mesh::{Vertex, VertexBuffer};
pub use scene_draw::{ObjectBuffer, ObjectUniforms, PassParams, draw_scene_graph};
pub use skybox::{SKYBOX_INDICES, SKYBOX_VERTICES, SkyboxPass, SkyboxUniforms};
pub use texture::{CUBE_FACES, CubeTexture, Texture};

// Re-export glam types for convenience
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
