//! Vertex format and the shared scene vertex buffer.
//!
//! Every mesh in the scene lives in one non-indexed triangle list. Objects
//! draw a contiguous `(start, count)` slice of it, recorded in the
//! [`MeshRegistry`](crate::scene::MeshRegistry).
//!
//! # Vertex Layout
//!
//! [`Vertex`] occupies 36 bytes:
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | color     | Unorm8x4  | 12     | 1               |
//! | uv        | Float32x2 | 16     | 2               |
//! | normal    | Float32x3 | 24     | 3               |
//!
//! Colors are authored as three bytes. The fourth byte is padding set to 255
//! because wgpu has no three-component byte format.

use crate::gpu::GpuContext;

/// A vertex with position, byte color, texture coordinates and normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    /// RGB in the first three bytes, normalized to [0, 1] by the vertex fetch.
    pub color: [u8; 4],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // color
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Unorm8x4,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    pub fn new(position: [f32; 3], color: [u8; 3], uv: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            color: [color[0], color[1], color[2], 255],
            uv,
            normal,
        }
    }
}

/// The GPU copy of every scene vertex, uploaded once at startup.
#[derive(Debug)]
pub struct VertexBuffer {
    pub(crate) buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl VertexBuffer {
    pub fn new(gpu: &GpuContext, vertices: &[Vertex]) -> Self {
        use wgpu::util::DeviceExt;

        let buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Scene Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        Self {
            buffer,
            vertex_count: vertices.len() as u32,
        }
    }

    /// Number of vertices in the buffer.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}
