//! The interior room: fixed mesh data and object placements.
//!
//! Loaded from a RON document embedded at compile time. Meshes are
//! concatenated into one vertex list in document order; objects name the mesh
//! they draw.

use std::collections::HashSet;

use glam::Vec3;
use serde::Deserialize;

use super::object::{SceneGraph, SceneObject, Transform};
use super::registry::{MeshRange, MeshRegistry};
use crate::error::SceneError;
use crate::mesh::Vertex;

/// The scene description shipped with the binary.
pub const ROOM_SCENE: &str = include_str!("../../assets/room.ron");

#[derive(Debug, Deserialize)]
struct SceneDescription {
    meshes: Vec<MeshDescription>,
    objects: Vec<ObjectDescription>,
}

#[derive(Debug, Deserialize)]
struct MeshDescription {
    name: String,
    vertices: Vec<VertexDescription>,
}

#[derive(Debug, Deserialize)]
struct VertexDescription {
    position: [f32; 3],
    color: [u8; 3],
    uv: [f32; 2],
    #[serde(default)]
    normal: [f32; 3],
}

#[derive(Debug, Deserialize)]
struct ObjectDescription {
    name: String,
    mesh: String,
    translate: [f32; 3],
    scale: [f32; 3],
    #[serde(default)]
    rotations: Vec<RotationDescription>,
    #[serde(default = "casts_shadow_default")]
    casts_shadow: bool,
}

#[derive(Debug, Deserialize)]
struct RotationDescription {
    /// Degrees.
    angle: f32,
    axis: [f32; 3],
}

fn casts_shadow_default() -> bool {
    true
}

/// CPU-side scene: vertices to upload, the mesh registry, and the objects.
#[derive(Clone, Debug)]
pub struct RoomScene {
    pub vertices: Vec<Vertex>,
    pub registry: MeshRegistry,
    pub graph: SceneGraph,
}

impl RoomScene {
    /// Parse the embedded room description.
    pub fn load() -> Result<Self, SceneError> {
        Self::from_ron(ROOM_SCENE)
    }

    pub fn from_ron(source: &str) -> Result<Self, SceneError> {
        let description: SceneDescription =
            ron::from_str(source).map_err(|e| SceneError::Parse(e.to_string()))?;
        Self::build(description)
    }

    fn build(description: SceneDescription) -> Result<Self, SceneError> {
        let total: usize = description.meshes.iter().map(|m| m.vertices.len()).sum();
        let mut vertices = Vec::with_capacity(total);
        let mut registry = MeshRegistry::new(total as u32);

        for mesh in description.meshes {
            let range = MeshRange::new(vertices.len() as u32, mesh.vertices.len() as u32);
            registry.insert(mesh.name, range)?;
            vertices.extend(
                mesh.vertices
                    .into_iter()
                    .map(|v| Vertex::new(v.position, v.color, v.uv, v.normal)),
            );
        }

        let mut seen = HashSet::new();
        let mut objects = Vec::with_capacity(description.objects.len());
        for object in description.objects {
            if !seen.insert(object.name.clone()) {
                return Err(SceneError::DuplicateObject(object.name));
            }
            let range = registry.resolve(&object.name, &object.mesh)?;

            let mut transform = Transform::new()
                .translate(Vec3::from_array(object.translate))
                .scale(Vec3::from_array(object.scale));
            for rotation in &object.rotations {
                let axis = Vec3::from_array(rotation.axis);
                if axis.length_squared() == 0.0 {
                    return Err(SceneError::DegenerateAxis(object.name));
                }
                transform = transform.rotate(rotation.angle, axis);
            }

            let mut scene_object = SceneObject::new(object.name, range, transform);
            scene_object.casts_shadow = object.casts_shadow;
            objects.push(scene_object);
        }

        log::debug!(
            "Loaded scene: {} vertices, {} meshes, {} objects",
            vertices.len(),
            registry.len(),
            objects.len()
        );

        Ok(Self {
            vertices,
            registry,
            graph: SceneGraph::new(objects),
        })
    }

    /// Meshes that are registered but drawn by no object.
    pub fn unused_meshes(&self) -> Vec<&str> {
        self.registry
            .names()
            .filter(|name| {
                let range = self.registry.get(name);
                !self.graph.iter().any(|o| Some(o.mesh) == range)
            })
            .collect()
    }
}
