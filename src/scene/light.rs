use glam::{Mat4, Vec3, Vec4Swizzles};

use super::object::SceneGraph;
use crate::mesh::Vertex;

/// The single light's position and orthographic shadow frustum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightState {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for LightState {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, -10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            left: -10.0,
            right: 10.0,
            bottom: -10.0,
            top: 10.0,
            near: 10.0,
            far: 20.0,
        }
    }
}

impl LightState {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Orthographic projection mapping depth to wgpu's `[0, 1]` range.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// True if a world-space point lies inside the light frustum.
    pub fn encloses(&self, point: Vec3) -> bool {
        const EPS: f32 = 1e-5;
        let clip = self.view_projection() * point.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        ndc.x.abs() <= 1.0 + EPS
            && ndc.y.abs() <= 1.0 + EPS
            && ndc.z >= -EPS
            && ndc.z <= 1.0 + EPS
    }

    /// Names of shadow casters with at least one vertex outside the frustum.
    ///
    /// Geometry outside the frustum is silently clipped from the shadow map.
    pub fn casters_outside<'a>(&self, graph: &'a SceneGraph, vertices: &[Vertex]) -> Vec<&'a str> {
        graph
            .iter()
            .filter(|object| object.casts_shadow)
            .filter(|object| {
                let model = object.model_matrix();
                let start = object.mesh.start as usize;
                let end = (object.mesh.end() as usize).min(vertices.len());
                vertices[start.min(end)..end].iter().any(|v| {
                    let world = model.transform_point3(Vec3::from_array(v.position));
                    !self.encloses(world)
                })
            })
            .map(|object| object.name.as_str())
            .collect()
    }
}

/// Shading constants shared by the color shader and [`shadow_factor`](crate::shadow::shadow_factor).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    /// Direction the light travels. Not unit length: its
    /// magnitude of sqrt(2) scales the diffuse and specular terms.
    pub direction: Vec3,
    /// Depth slack before a fragment counts as occluded.
    pub shadow_bias: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.4),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::splat(0.2),
            shininess: 1.0,
            direction: Vec3::new(0.0, -1.0, 1.0),
            shadow_bias: 0.005,
        }
    }
}

impl Lighting {
    /// Per-channel light intensity at a surface, as computed by `scene.wgsl`.
    ///
    /// `to_eye` points from the surface to the camera. `shadow` is 0 when the
    /// fragment is occluded and 1 when lit; only ambient survives occlusion.
    pub fn intensity(&self, normal: Vec3, to_eye: Vec3, shadow: f32) -> Vec3 {
        let n = normal.normalize_or_zero();
        let diffuse = n.dot(-self.direction).max(0.0) * self.diffuse;

        let reflected = self.direction - 2.0 * self.direction.dot(n) * n;
        let spec = to_eye
            .normalize_or_zero()
            .dot(reflected)
            .max(0.0)
            .powf(self.shininess);
        let specular = spec * self.specular;

        self.ambient + shadow * (diffuse + specular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MeshRange, SceneObject, Transform};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn light_frustum_contains_origin() {
        let light = LightState::default();
        assert!(light.encloses(Vec3::ZERO));
        // Light sits at depth 0, before the near plane.
        assert!(!light.encloses(light.position));
    }

    #[test]
    fn points_past_the_box_are_outside() {
        let light = LightState::default();
        assert!(!light.encloses(Vec3::new(11.0, 0.0, 0.0)));
        assert!(light.encloses(Vec3::new(9.0, 0.0, 0.0)));
        // Far along the view direction, past the far plane.
        assert!(!light.encloses(Vec3::new(0.0, -10.0, 10.0)));
    }

    #[test]
    fn origin_depth_matches_distance() {
        let light = LightState::default();
        let clip = light.view_projection() * Vec3::ZERO.extend(1.0);
        let distance = light.position.length();
        assert_relative_eq!(clip.z / clip.w, (distance - 10.0) / 10.0, epsilon = 1e-5);
    }

    #[test]
    fn casters_outside_reports_clipped_objects() {
        let vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [255; 3], [0.0; 2], [0.0; 3]),
            Vertex::new([1.0, 0.0, 0.0], [255; 3], [0.0; 2], [0.0; 3]),
            Vertex::new([0.0, 1.0, 0.0], [255; 3], [0.0; 2], [0.0; 3]),
        ];
        let mut hidden = SceneObject::new(
            "hidden",
            MeshRange::new(0, 3),
            Transform::new().translate(Vec3::new(50.0, 0.0, 0.0)),
        );
        hidden.casts_shadow = false;
        let graph = SceneGraph::new(vec![
            SceneObject::new("inside", MeshRange::new(0, 3), Transform::new()),
            SceneObject::new(
                "outside",
                MeshRange::new(0, 3),
                Transform::new().translate(Vec3::new(50.0, 0.0, 0.0)),
            ),
            hidden,
        ]);

        let outside = LightState::default().casters_outside(&graph, &vertices);
        assert_eq!(outside, ["outside"]);
    }

    #[test]
    fn directional_light_is_not_normalized() {
        let lighting = Lighting::default();
        assert_relative_eq!(lighting.direction.length(), 2f32.sqrt());
    }

    #[test]
    fn unnormalized_direction_scales_diffuse() {
        let lighting = Lighting {
            specular: Vec3::ZERO,
            ..Lighting::default()
        };
        // Facing straight into the light.
        let normal = -lighting.direction.normalize();
        let lit = lighting.intensity(normal, Vec3::Y, 1.0);
        let expected = 0.4 + 0.8 * 2f32.sqrt();
        assert_abs_diff_eq!(lit.x, expected, epsilon = 1e-5);
    }

    #[test]
    fn occlusion_keeps_only_ambient() {
        let lighting = Lighting::default();
        let shaded = lighting.intensity(Vec3::Y, Vec3::Y, 0.0);
        assert_eq!(shaded, lighting.ambient);
    }

    #[test]
    fn shadowed_white_texel_stores_ambient_byte() {
        // A linear target stores the shaded value unchanged.
        let shaded = Lighting::default().intensity(Vec3::Y, Vec3::Y, 0.0);
        let stored = (shaded.x.clamp(0.0, 1.0) * 255.0).round() as u8;
        assert_eq!(stored, 102);
    }

    #[test]
    fn back_facing_surface_gets_no_diffuse() {
        let lighting = Lighting {
            specular: Vec3::ZERO,
            ..Lighting::default()
        };
        // Floor facing down, light travelling down.
        let lit = lighting.intensity(Vec3::NEG_Y, Vec3::Y, 1.0);
        assert_eq!(lit, lighting.ambient);
    }
}
