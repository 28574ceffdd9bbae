//! Per-object uniforms and the scene traversal shared by both passes.
//!
//! Each pass owns an [`ObjectBuffer`]: one uniform slot per scene object,
//! written once per frame and bound with a dynamic offset per draw. The shadow
//! and color passes then call [`draw_scene_graph`] with their own pipeline and
//! bind groups, so the traversal (order, ranges, offsets) is identical.

use glam::Mat4;

use crate::gpu::GpuContext;
use crate::mesh::VertexBuffer;
use crate::scene::SceneGraph;

/// Per-object matrices, bound at group 1.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    /// Combined model-view-projection matrix.
    pub mat: [[f32; 4]; 4],
    /// Model matrix alone, for world-space lighting and the light transform.
    pub model: [[f32; 4]; 4],
}

impl ObjectUniforms {
    pub fn new(view_projection: Mat4, model: Mat4) -> Self {
        Self {
            mat: (view_projection * model).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
        }
    }
}

/// Group 1 in both programs: one object's matrices at a dynamic offset.
pub(crate) const OBJECT_LAYOUT_ENTRIES: [wgpu::BindGroupLayoutEntry; 1] =
    [wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniforms>() as u64),
        },
        count: None,
    }];

/// Uniforms for every object in draw order.
pub fn object_uniforms(graph: &SceneGraph, view_projection: Mat4) -> Vec<ObjectUniforms> {
    graph
        .model_matrices()
        .into_iter()
        .map(|model| ObjectUniforms::new(view_projection, model))
        .collect()
}

/// Round `size` up to a multiple of `alignment`.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// A uniform buffer with one [`ObjectUniforms`] slot per object.
pub struct ObjectBuffer {
    buffer: wgpu::Buffer,
    stride: u64,
    capacity: usize,
    bind_group: wgpu::BindGroup,
    staging: Vec<u8>,
}

impl ObjectBuffer {
    /// Bind group layout shared by every pass's group 1.
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &OBJECT_LAYOUT_ENTRIES,
        })
    }

    pub fn new(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        capacity: usize,
        label: &str,
    ) -> Self {
        let size = std::mem::size_of::<ObjectUniforms>() as u64;
        let alignment = gpu.device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = aligned_stride(size, alignment);
        let capacity = capacity.max(1);

        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", label)),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size),
                }),
            }],
        });

        Self {
            buffer,
            stride,
            capacity,
            bind_group,
            staging: vec![0; (stride * capacity as u64) as usize],
        }
    }

    /// Upload all slots. Extra entries beyond capacity are dropped.
    pub fn write(&mut self, queue: &wgpu::Queue, uniforms: &[ObjectUniforms]) {
        if uniforms.len() > self.capacity {
            log::warn!(
                "{} objects exceed uniform capacity {}",
                uniforms.len(),
                self.capacity
            );
        }
        for (i, u) in uniforms.iter().take(self.capacity).enumerate() {
            let start = i * self.stride as usize;
            let bytes = bytemuck::bytes_of(u);
            self.staging[start..start + bytes.len()].copy_from_slice(bytes);
        }
        queue.write_buffer(&self.buffer, 0, &self.staging);
    }

    /// Dynamic offset for object `index`.
    pub fn offset(&self, index: usize) -> wgpu::DynamicOffset {
        (index as u64 * self.stride) as wgpu::DynamicOffset
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// What a pass binds around the shared traversal.
pub struct PassParams<'a> {
    pub pipeline: &'a wgpu::RenderPipeline,
    /// Group 0: per-frame camera or light data.
    pub frame: &'a wgpu::BindGroup,
    pub objects: &'a ObjectBuffer,
    /// Group 2: surface texture, for passes that shade.
    pub material: Option<&'a wgpu::BindGroup>,
    /// Skip objects that do not cast shadows.
    pub shadow_casters_only: bool,
}

/// Draw every object of `graph` with the pass's pipeline and bindings.
pub fn draw_scene_graph(
    render_pass: &mut wgpu::RenderPass,
    vertices: &VertexBuffer,
    graph: &SceneGraph,
    params: &PassParams,
) {
    render_pass.set_pipeline(params.pipeline);
    render_pass.set_bind_group(0, params.frame, &[]);
    if let Some(material) = params.material {
        render_pass.set_bind_group(2, material, &[]);
    }
    render_pass.set_vertex_buffer(0, vertices.buffer.slice(..));

    for (index, object) in drawn_objects(graph, params.shadow_casters_only, params.objects.capacity()) {
        render_pass.set_bind_group(1, &params.objects.bind_group, &[params.objects.offset(index)]);
        render_pass.draw(object.mesh.vertices(), 0..1);
    }
}

/// Objects a pass draws, paired with their uniform slot.
fn drawn_objects(
    graph: &SceneGraph,
    shadow_casters_only: bool,
    capacity: usize,
) -> impl Iterator<Item = (usize, &crate::scene::SceneObject)> {
    graph
        .iter()
        .enumerate()
        .take(capacity)
        .filter(move |(_, object)| !shadow_casters_only || object.casts_shadow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MeshRange, SceneObject, Transform};
    use glam::Vec3;

    #[test]
    fn object_uniforms_are_128_bytes() {
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 128);
    }

    #[test]
    fn stride_rounds_up_to_alignment() {
        assert_eq!(aligned_stride(128, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(257, 256), 512);
        assert_eq!(aligned_stride(128, 64), 128);
    }

    #[test]
    fn mat_is_view_projection_times_model() {
        let vp = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0)
            * Mat4::look_at_rh(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);
        let model = Mat4::from_translation(Vec3::new(-4.0, -4.0, -4.0));
        let u = ObjectUniforms::new(vp, model);

        assert_eq!(u.model, model.to_cols_array_2d());
        let mat = Mat4::from_cols_array_2d(&u.mat);
        assert!(mat.abs_diff_eq(vp * model, 1e-6));
    }

    fn graph() -> SceneGraph {
        let mut window = SceneObject::new("window", MeshRange::new(6, 6), Transform::new());
        window.casts_shadow = false;
        SceneGraph::new(vec![
            SceneObject::new("room", MeshRange::new(0, 6), Transform::new().uniform_scale(5.0)),
            window,
            SceneObject::new("crate", MeshRange::new(12, 36), Transform::new()),
        ])
    }

    #[test]
    fn uniforms_follow_graph_order() {
        let graph = graph();
        let uniforms = object_uniforms(&graph, Mat4::IDENTITY);
        assert_eq!(uniforms.len(), 3);
        assert_eq!(
            uniforms[0].model,
            Mat4::from_scale(Vec3::splat(5.0)).to_cols_array_2d()
        );
    }

    #[test]
    fn both_passes_share_slots() {
        let graph = graph();

        let color: Vec<_> = drawn_objects(&graph, false, 16).map(|(i, o)| (i, o.name.as_str())).collect();
        assert_eq!(color, [(0, "room"), (1, "window"), (2, "crate")]);

        // Skipping a non-caster keeps the remaining indices stable.
        let shadow: Vec<_> = drawn_objects(&graph, true, 16).map(|(i, o)| (i, o.name.as_str())).collect();
        assert_eq!(shadow, [(0, "room"), (2, "crate")]);
    }

    #[test]
    fn traversal_stops_at_capacity() {
        let graph = graph();
        assert_eq!(drawn_objects(&graph, false, 2).count(), 2);
    }
}
