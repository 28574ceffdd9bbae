//! Error types for startup, scene loading, shaders, and textures.
//!
//! Fatal failures bubble up as [`AppError`] and end the process. Texture
//! failures are recoverable: callers log them and substitute a fallback.

use std::path::PathBuf;

/// Fatal startup and run-loop failures.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Failures while bringing up the wgpu device and surface.
#[derive(thiserror::Error, Debug)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Shader source loading and validation failures.
#[derive(thiserror::Error, Debug)]
pub enum ShaderError {
    #[error("failed to read shader '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader '{label}' failed validation: {message}")]
    Validation { label: String, message: String },
}

/// Problems with the scene description or the mesh registry.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SceneError {
    #[error("scene description parse error: {0}")]
    Parse(String),

    #[error("mesh '{0}' is registered twice")]
    DuplicateMesh(String),

    #[error("object '{0}' is defined twice")]
    DuplicateObject(String),

    #[error("mesh '{0}' has no vertices")]
    EmptyMesh(String),

    #[error("object '{object}' references unknown mesh '{mesh}'")]
    UnknownMesh { object: String, mesh: String },

    #[error("mesh '{name}' range {start}..{end} exceeds vertex buffer of {len} vertices")]
    RangeOutOfBounds {
        name: String,
        start: u32,
        end: u32,
        len: u32,
    },

    #[error("object '{0}' has a rotation with a zero-length axis")]
    DegenerateAxis(String),
}

/// Image decode failures. Never fatal.
#[derive(thiserror::Error, Debug)]
pub enum TextureError {
    #[error("failed to load image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cube face '{path}' is {width}x{height}, expected {expected}x{expected}")]
    FaceSize {
        path: PathBuf,
        expected: u32,
        width: u32,
        height: u32,
    },
}
