//! Depth-only shadow pass rendered from the light.
//!
//! [`ShadowMap`] owns the offscreen depth target. [`ShadowPass`] fills it once
//! per frame, and the color pass reads it back through `scene.wgsl`.
//! [`shadow_factor`] is the CPU form of the shader's lookup.

use glam::{UVec2, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::gpu::GpuContext;
use crate::mesh::{Vertex, VertexBuffer};
use crate::scene::{LightState, Lighting, SceneGraph};
use crate::scene_draw::{self, ObjectBuffer, PassParams};

pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth held by the 1×1 map bound when the real target is unusable.
pub const FALLBACK_DEPTH: f32 = 1.0;

/// Group 0 of `shadow_map.wgsl`: the light matrices.
pub(crate) const LIGHT_LAYOUT_ENTRIES: [wgpu::BindGroupLayoutEntry; 1] =
    [wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ShadowUniforms>() as u64),
        },
        count: None,
    }];

/// Project a light-clip position to shadow-map `(u, v, depth)`.
///
/// Returns `None` when the position falls outside the light frustum, which the
/// color pass treats as lit.
pub fn light_space_coords(light_clip: Vec4) -> Option<Vec3> {
    let ndc = light_clip.xyz() / light_clip.w;
    let uv = Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);

    let inside = (0.0..=1.0).contains(&uv.x)
        && (0.0..=1.0).contains(&uv.y)
        && (0.0..=1.0).contains(&ndc.z);
    inside.then(|| uv.extend(ndc.z))
}

/// Texel addressed by `uv` in a square map of `size`, clamped to the last row and column.
pub fn shadow_texel(uv: Vec2, size: u32) -> UVec2 {
    let max = (size.max(1) - 1) as f32;
    (uv * size as f32).min(Vec2::splat(max)).max(Vec2::ZERO).as_uvec2()
}

/// True if a fragment at `depth` is hidden behind `stored`. Ties within the bias are lit.
pub fn is_occluded(depth: f32, stored: f32, bias: f32) -> bool {
    depth - bias > stored
}

/// 0.0 when the light is blocked, 1.0 when lit.
///
/// `stored_depth` reads the shadow map at a UV in `[0, 1]`. It is not called
/// for positions outside the light frustum.
pub fn shadow_factor(
    light_clip: Vec4,
    lighting: &Lighting,
    stored_depth: impl FnOnce(Vec2) -> f32,
) -> f32 {
    let Some(coords) = light_space_coords(light_clip) else {
        return 1.0;
    };
    if is_occluded(coords.z, stored_depth(coords.truncate()), lighting.shadow_bias) {
        0.0
    } else {
        1.0
    }
}

/// Matrices for `shadow_map.wgsl` group 0.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl ShadowUniforms {
    pub fn new(light: &LightState) -> Self {
        Self {
            projection: light.projection_matrix().to_cols_array_2d(),
            view: light.view_matrix().to_cols_array_2d(),
        }
    }
}

/// The offscreen depth target written by [`ShadowPass`].
pub struct ShadowMap {
    pub(crate) view: wgpu::TextureView,
    size: u32,
    complete: bool,
}

impl ShadowMap {
    /// Allocate a square depth target.
    ///
    /// If the device rejects the target, an error is logged once and a 1x1
    /// map cleared to the far plane stands in. Every fragment then reads as
    /// lit and the shadow pass is skipped.
    pub fn new(gpu: &GpuContext, size: u32) -> Self {
        let (texture, error) =
            gpu.validation_scope(|| Self::create_texture(&gpu.device, size, "Shadow Map"));

        match error {
            None => {
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                log::debug!("Shadow map allocated at {size}x{size}");
                Self {
                    view,
                    size,
                    complete: true,
                }
            }
            Some(e) => {
                log::error!("Shadow map {size}x{size} is unusable, rendering without shadows: {e}");
                Self::unlit_fallback(gpu)
            }
        }
    }

    fn create_texture(device: &wgpu::Device, size: u32, label: &str) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        })
    }

    fn unlit_fallback(gpu: &GpuContext) -> Self {
        let texture = Self::create_texture(&gpu.device, 1, "Fallback Shadow Map");
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Fallback Shadow Clear"),
            });
        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Fallback Shadow Clear"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(FALLBACK_DEPTH),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));

        Self {
            view,
            size: 1,
            complete: false,
        }
    }

    /// False when running on the lit fallback.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Renders shadow casters into a [`ShadowMap`] from the light.
pub struct ShadowPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
    objects: ObjectBuffer,
}

impl ShadowPass {
    pub fn new(gpu: &GpuContext, shader: &wgpu::ShaderModule, object_count: usize) -> Self {
        let device = &gpu.device;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shadow Uniforms"),
            size: std::mem::size_of::<ShadowUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let light_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Bind Group Layout"),
            entries: &LIGHT_LAYOUT_ENTRIES,
        });

        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Bind Group"),
            layout: &light_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let object_layout = ObjectBuffer::bind_group_layout(device);
        let objects = ObjectBuffer::new(gpu, &object_layout, object_count, "Shadow Object Uniforms");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&light_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: SHADOW_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            light_bind_group,
            objects,
        }
    }

    /// Upload light matrices and per-object model matrices for this frame.
    pub fn prepare(&mut self, queue: &wgpu::Queue, light: &LightState, graph: &SceneGraph) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&ShadowUniforms::new(light)),
        );
        let uniforms = scene_draw::object_uniforms(graph, light.view_projection());
        self.objects.write(queue, &uniforms);
    }

    /// Clear the map and draw every shadow caster into it.
    ///
    /// Records nothing when `map` is the fallback. Its single texel stays at
    /// [`FALLBACK_DEPTH`], so every fragment of the color pass reads as lit.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        map: &ShadowMap,
        vertices: &VertexBuffer,
        graph: &SceneGraph,
    ) {
        if !map.is_complete() {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // The viewport belongs to this pass only; the color pass starts with
        // the full surface again.
        let size = map.size() as f32;
        render_pass.set_viewport(0.0, 0.0, size, size, 0.0, 1.0);

        scene_draw::draw_scene_graph(
            &mut render_pass,
            vertices,
            graph,
            &PassParams {
                pipeline: &self.pipeline,
                frame: &self.light_bind_group,
                objects: &self.objects,
                material: None,
                shadow_casters_only: true,
            },
        );
    }
}
