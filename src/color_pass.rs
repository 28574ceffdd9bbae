//! Lit, textured color pass that samples the shadow map.
//!
//! Uses three bind groups, matching `scene.wgsl`:
//! - **Group 0**: [`SceneUniforms`] and the shadow map
//! - **Group 1**: per-object matrices through an [`ObjectBuffer`]
//! - **Group 2**: the wall texture and its sampler
//!
//! The pass owns the window-sized depth buffer. The skybox is drawn into the
//! same render pass afterwards, so [`ColorPass::begin`] hands the open pass
//! back to the caller.

use glam::{Mat4, Vec3};

use crate::gpu::GpuContext;
use crate::mesh::{Vertex, VertexBuffer};
use crate::scene::{LightState, Lighting, SceneGraph};
use crate::scene_draw::{self, ObjectBuffer, PassParams};
use crate::shadow::ShadowMap;
use crate::texture::Texture;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Group 0: scene uniforms and the shadow map.
pub(crate) const SCENE_LAYOUT_ENTRIES: [wgpu::BindGroupLayoutEntry; 2] = [
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<SceneUniforms>() as u64),
        },
        count: None,
    },
    wgpu::BindGroupLayoutEntry {
        binding: 1,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    },
];

/// Group 2: the wall texture and its sampler.
pub(crate) const MATERIAL_LAYOUT_ENTRIES: [wgpu::BindGroupLayoutEntry; 2] = [
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    },
    wgpu::BindGroupLayoutEntry {
        binding: 1,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    },
];

/// Per-frame light and camera data for `scene.wgsl` group 0.
///
/// Each `vec3` is followed by a scalar or explicit padding to meet WGSL's
/// 16-byte alignment.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub projection_light: [[f32; 4]; 4],
    pub view_light: [[f32; 4]; 4],
    pub eye_position: [f32; 3],
    pub shininess: f32,
    pub ambient: [f32; 3],
    pub shadow_bias: f32,
    pub diffuse: [f32; 3],
    pub _pad0: f32,
    pub specular: [f32; 3],
    pub _pad1: f32,
    pub directional_light: [f32; 3],
    pub _pad2: f32,
}

impl SceneUniforms {
    pub fn new(light: &LightState, lighting: &Lighting, eye: Vec3) -> Self {
        Self {
            projection_light: light.projection_matrix().to_cols_array_2d(),
            view_light: light.view_matrix().to_cols_array_2d(),
            eye_position: eye.to_array(),
            shininess: lighting.shininess,
            ambient: lighting.ambient.to_array(),
            shadow_bias: lighting.shadow_bias,
            diffuse: lighting.diffuse.to_array(),
            _pad0: 0.0,
            specular: lighting.specular.to_array(),
            _pad1: 0.0,
            directional_light: lighting.direction.to_array(),
            _pad2: 0.0,
        }
    }
}

/// Renders the scene graph from the camera with lighting and shadows.
pub struct ColorPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    objects: ObjectBuffer,
    material_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl ColorPass {
    pub fn new(
        gpu: &GpuContext,
        shader: &wgpu::ShaderModule,
        shadow_map: &ShadowMap,
        wall: &Texture,
        object_count: usize,
    ) -> Self {
        let device = &gpu.device;

        // Scene uniforms and shadow map (group 0)
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &SCENE_LAYOUT_ENTRIES,
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(shadow_map.view()),
                },
            ],
        });

        // Object matrices (group 1)
        let object_layout = ObjectBuffer::bind_group_layout(device);
        let objects = ObjectBuffer::new(gpu, &object_layout, object_count, "Scene Object Uniforms");

        // Wall texture (group 2)
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Wall Texture Bind Group Layout"),
            entries: &MATERIAL_LAYOUT_ENTRIES,
        });

        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Wall Texture Bind Group"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&wall.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&wall.sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &object_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let depth_view = Self::create_depth_view(gpu);

        Self {
            pipeline,
            uniform_buffer,
            scene_bind_group,
            objects,
            material_bind_group,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreate the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = Self::create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Upload this frame's light, camera and object matrices.
    pub fn prepare(
        &mut self,
        queue: &wgpu::Queue,
        light: &LightState,
        lighting: &Lighting,
        eye: Vec3,
        view_projection: Mat4,
        graph: &SceneGraph,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&SceneUniforms::new(light, lighting, eye)),
        );
        let uniforms = scene_draw::object_uniforms(graph, view_projection);
        self.objects.write(queue, &uniforms);
    }

    /// Open the color render pass, clearing to black and the far plane.
    pub fn begin<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Color Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    /// Draw every object with lighting and shadows.
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass,
        vertices: &VertexBuffer,
        graph: &SceneGraph,
    ) {
        scene_draw::draw_scene_graph(
            render_pass,
            vertices,
            graph,
            &PassParams {
                pipeline: &self.pipeline,
                frame: &self.scene_bind_group,
                objects: &self.objects,
                material: Some(&self.material_bind_group),
                shadow_casters_only: false,
            },
        );
    }
}
