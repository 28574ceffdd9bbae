use std::collections::HashMap;
use std::ops::Range;

use crate::error::SceneError;

/// A contiguous slice of the shared vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshRange {
    pub start: u32,
    pub count: u32,
}

impl MeshRange {
    pub const fn new(start: u32, count: u32) -> Self {
        Self { start, count }
    }

    pub fn end(&self) -> u32 {
        self.start + self.count
    }

    /// Vertex range suitable for `RenderPass::draw`.
    pub fn vertices(&self) -> Range<u32> {
        self.start..self.end()
    }
}

/// Maps mesh names to immutable ranges of the shared vertex buffer.
///
/// Every range is checked against the buffer length when it is inserted, so
/// any range handed out by [`get`](Self::get) is safe to draw.
#[derive(Clone, Debug)]
pub struct MeshRegistry {
    vertex_count: u32,
    ranges: HashMap<String, MeshRange>,
    order: Vec<String>,
}

impl MeshRegistry {
    /// Create an empty registry for a buffer of `vertex_count` vertices.
    pub fn new(vertex_count: u32) -> Self {
        Self {
            vertex_count,
            ranges: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, range: MeshRange) -> Result<(), SceneError> {
        let name = name.into();

        if self.ranges.contains_key(&name) {
            return Err(SceneError::DuplicateMesh(name));
        }
        if range.count == 0 {
            return Err(SceneError::EmptyMesh(name));
        }
        let end = range.start.checked_add(range.count);
        match end {
            Some(end) if end <= self.vertex_count => {}
            _ => {
                return Err(SceneError::RangeOutOfBounds {
                    name,
                    start: range.start,
                    end: range.start.saturating_add(range.count),
                    len: self.vertex_count,
                });
            }
        }

        self.order.push(name.clone());
        self.ranges.insert(name, range);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<MeshRange> {
        self.ranges.get(name).copied()
    }

    /// Look up the mesh an object refers to.
    pub fn resolve(&self, object: &str, mesh: &str) -> Result<MeshRange, SceneError> {
        self.get(mesh).ok_or_else(|| SceneError::UnknownMesh {
            object: object.to_string(),
            mesh: mesh.to_string(),
        })
    }

    /// Mesh names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut registry = MeshRegistry::new(60);
        registry.insert("room", MeshRange::new(0, 30)).unwrap();
        registry.insert("crate", MeshRange::new(30, 30)).unwrap();

        assert_eq!(registry.get("crate"), Some(MeshRange::new(30, 30)));
        assert_eq!(registry.get("chair"), None);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["room", "crate"]);
    }

    #[test]
    fn range_must_fit_buffer() {
        let mut registry = MeshRegistry::new(40);
        let err = registry.insert("room", MeshRange::new(30, 12)).unwrap_err();
        assert_eq!(
            err,
            SceneError::RangeOutOfBounds {
                name: "room".into(),
                start: 30,
                end: 42,
                len: 40
            }
        );

        // Exactly touching the end is fine.
        registry.insert("room", MeshRange::new(30, 10)).unwrap();
    }

    #[test]
    fn overflowing_range_is_rejected() {
        let mut registry = MeshRegistry::new(10);
        let err = registry.insert("huge", MeshRange::new(u32::MAX, 2)).unwrap_err();
        assert!(matches!(err, SceneError::RangeOutOfBounds { .. }));
    }

    #[test]
    fn duplicate_and_empty_names() {
        let mut registry = MeshRegistry::new(10);
        registry.insert("a", MeshRange::new(0, 3)).unwrap();
        assert_eq!(
            registry.insert("a", MeshRange::new(3, 3)),
            Err(SceneError::DuplicateMesh("a".into()))
        );
        assert_eq!(
            registry.insert("b", MeshRange::new(3, 0)),
            Err(SceneError::EmptyMesh("b".into()))
        );
    }

    #[test]
    fn resolve_reports_the_object() {
        let registry = MeshRegistry::new(0);
        assert_eq!(
            registry.resolve("crate_1", "crate"),
            Err(SceneError::UnknownMesh {
                object: "crate_1".into(),
                mesh: "crate".into()
            })
        );
    }

    #[test]
    fn mesh_range_vertices() {
        let range = MeshRange::new(42, 36);
        assert_eq!(range.end(), 78);
        assert_eq!(range.vertices(), 42..78);
    }
}
