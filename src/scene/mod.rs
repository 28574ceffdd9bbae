//! Scene data for the room: meshes, objects, and the light.
//!
//! # Overview
//!
//! - [`MeshRegistry`] maps mesh names to ranges of the shared vertex buffer
//! - [`SceneGraph`] is the ordered list of [`SceneObject`]s both passes draw
//! - [`LightState`] builds the light's view and orthographic projection
//! - [`Lighting`] holds the shading constants
//! - [`RoomScene`] loads all of the above from the embedded description
//!
//! # Example
//!
//! ```
//! use shadowbox::scene::{LightState, RoomScene};
//!
//! let room = RoomScene::load().unwrap();
//! let light = LightState::default();
//!
//! for object in &room.graph {
//!     let light_mvp = light.view_projection() * object.model_matrix();
//!     # let _ = light_mvp;
//! }
//! ```

mod light;
mod object;
mod registry;
mod room;

pub use light::{LightState, Lighting};
pub use object::{SceneGraph, SceneObject, Transform};
pub use registry::{MeshRange, MeshRegistry};
pub use room::{ROOM_SCENE, RoomScene};
