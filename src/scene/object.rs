use glam::{Mat4, Quat, Vec3};

use super::registry::MeshRange;

/// Placement of a scene object: translate, then scale, then rotate.
///
/// The matrix is composed as `T * S * R`, so rotations act in the object's
/// local frame before scaling and translation. Rotations chained with
/// [`rotate`](Self::rotate) compose in call order (`R = R1 * R2 * ...`).
///
/// ```
/// use shadowbox::scene::Transform;
/// use shadowbox::Vec3;
///
/// let transform = Transform::new()
///     .translate(Vec3::new(3.0, -1.6, -3.2))
///     .uniform_scale(1.2)
///     .rotate(-25.0, Vec3::Y)
///     .rotate(90.0, Vec3::X);
/// let model = transform.matrix();
/// # let _ = model;
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Append a rotation of `degrees` about `axis`. The axis is normalized.
    pub fn rotate(mut self, degrees: f32, axis: Vec3) -> Self {
        let axis = axis.normalize_or_zero();
        if axis != Vec3::ZERO {
            self.rotation *= Quat::from_axis_angle(axis, degrees.to_radians());
        }
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_scale(self.scale)
            * Mat4::from_quat(self.rotation)
    }
}

/// A named object drawing one mesh range with its own model matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub mesh: MeshRange,
    pub transform: Transform,
    /// Whether the shadow pass draws this object.
    pub casts_shadow: bool,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, mesh: MeshRange, transform: Transform) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform,
            casts_shadow: true,
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }
}

/// The ordered set of objects both render passes traverse.
///
/// Order is draw order. The index of an object is also its slot in the
/// per-object uniform buffers.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    objects: Vec<SceneObject>,
}

impl SceneGraph {
    pub fn new(objects: Vec<SceneObject>) -> Self {
        Self { objects }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SceneObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Compose every object's model matrix, in draw order.
    pub fn model_matrices(&self) -> Vec<Mat4> {
        self.objects.iter().map(SceneObject::model_matrix).collect()
    }
}

impl<'a> IntoIterator for &'a SceneGraph {
    type Item = &'a SceneObject;
    type IntoIter = std::slice::Iter<'a, SceneObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_transform() {
        assert_eq!(Transform::new().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn composes_translate_scale_rotate() {
        let transform = Transform::new()
            .translate(Vec3::new(1.0, 2.0, 3.0))
            .uniform_scale(2.0)
            .rotate(90.0, Vec3::Y);

        let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_scale(Vec3::splat(2.0))
            * Mat4::from_rotation_y(90f32.to_radians());
        assert!(transform.matrix().abs_diff_eq(expected, 1e-6));

        // Local +X rotates to -Z, doubles, then offsets.
        let p = transform.matrix().transform_point3(Vec3::X);
        assert_abs_diff_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.y, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn chained_rotations_apply_in_call_order() {
        let transform = Transform::new().rotate(-25.0, Vec3::Y).rotate(90.0, Vec3::X);
        let expected =
            Mat4::from_rotation_y((-25f32).to_radians()) * Mat4::from_rotation_x(90f32.to_radians());
        assert!(transform.matrix().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn rotation_axis_is_normalized() {
        let a = Transform::new().rotate(45.0, Vec3::new(0.0, 3.0, 0.0));
        let b = Transform::new().rotate(45.0, Vec3::Y);
        assert!(a.matrix().abs_diff_eq(b.matrix(), 1e-6));
    }

    #[test]
    fn model_matrices_follow_draw_order() {
        let graph = SceneGraph::new(vec![
            SceneObject::new("a", MeshRange::new(0, 3), Transform::new()),
            SceneObject::new(
                "b",
                MeshRange::new(3, 3),
                Transform::new().translate(Vec3::X),
            ),
        ]);

        let matrices = graph.model_matrices();
        assert_eq!(matrices.len(), 2);
        assert_eq!(matrices[0], Mat4::IDENTITY);
        assert_eq!(matrices[1], Mat4::from_translation(Vec3::X));
        assert_eq!(graph.get("b").map(|o| o.mesh.start), Some(3));
    }

    #[test]
    fn recomposition_is_deterministic() {
        let object = SceneObject::new(
            "crate_3",
            MeshRange::new(42, 36),
            Transform::new()
                .translate(Vec3::new(-3.5, -2.6, -4.0))
                .uniform_scale(0.3)
                .rotate(250.0, Vec3::Y),
        );
        assert_eq!(object.model_matrix(), object.model_matrix());
    }
}
