use std::path::{Path, PathBuf};

use crate::error::TextureError;
use crate::gpu::GpuContext;

/// Cube map face files in layer order: +X, -X, +Y, -Y, +Z, -Z.
///
/// wgpu selects cube faces by array layer in exactly this order, so the
/// sequence must not change.
pub const CUBE_FACES: [&str; 6] = [
    "posx.jpg", "negx.jpg", "posy.jpg", "negy.jpg", "posz.jpg", "negz.jpg",
];

/// Format of every sampled image. Texels reach the shader as stored, with no
/// sRGB decode.
pub const TEXEL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Color written into cube faces that failed to load.
const MISSING_FACE_RGBA: [u8; 4] = [128, 128, 128, 255];

/// A 2D texture with its sampler.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw RGBA data. Sampling is linear and repeats.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXEL_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// 1x1 opaque white.
    pub fn white(gpu: &GpuContext) -> Self {
        Self::from_rgba(gpu, &[255, 255, 255, 255], 1, 1, "Default White Texture")
    }

    /// Load an image file, optionally flipping it vertically.
    pub fn from_file(
        gpu: &GpuContext,
        path: impl AsRef<Path>,
        flip_vertically: bool,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = decode_rgba(path, flip_vertically)?;
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(
            gpu,
            &img,
            width,
            height,
            &path.display().to_string(),
        ))
    }

    /// Load an image file, logging and falling back to white on failure.
    pub fn load_or_white(gpu: &GpuContext, path: impl AsRef<Path>, flip_vertically: bool) -> Self {
        match Self::from_file(gpu, path, flip_vertically) {
            Ok(texture) => {
                log::info!("Loaded texture {}x{}", texture.width, texture.height);
                texture
            }
            Err(e) => {
                log::error!("{e}; using a white texture");
                Self::white(gpu)
            }
        }
    }
}

/// A six-face cube texture for environment lookups.
#[derive(Debug)]
pub struct CubeTexture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub size: u32,
}

impl CubeTexture {
    /// Load the six faces named by [`CUBE_FACES`] from `dir`. Faces are not flipped.
    ///
    /// Faces that fail to load, or whose size differs from the first good
    /// face, are logged and replaced with a flat gray face.
    pub fn load(gpu: &GpuContext, dir: impl AsRef<Path>) -> Self {
        let faces = cube_face_paths(dir.as_ref()).map(|path| {
            decode_rgba(&path, false)
                .map_err(|e| log::error!("{e}"))
                .ok()
        });
        let (size, data) = assemble_cube_faces(faces, &cube_face_paths(dir.as_ref()));
        Self::from_rgba(gpu, &data, size, "Skybox Cube Texture")
    }

    /// Create a cube texture from six square RGBA faces laid out in layer order.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], size: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXEL_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{} View", label)),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size,
        }
    }
}

fn decode_rgba(path: &Path, flip_vertically: bool) -> Result<image::RgbaImage, TextureError> {
    let img = image::open(path).map_err(|source| TextureError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let img = if flip_vertically { img.flipv() } else { img };
    Ok(img.to_rgba8())
}

/// Face image paths in layer order.
pub fn cube_face_paths(dir: &Path) -> [PathBuf; 6] {
    CUBE_FACES.map(|face| dir.join(face))
}

/// Pack six optional faces into one layer-major buffer.
///
/// The first loaded face sets the edge length. Missing or mismatched faces
/// become flat gray. With no faces at all the cube is 1x1.
pub fn assemble_cube_faces(
    faces: [Option<image::RgbaImage>; 6],
    paths: &[PathBuf; 6],
) -> (u32, Vec<u8>) {
    let size = faces
        .iter()
        .flatten()
        .map(|face| face.width())
        .next()
        .unwrap_or(1);
    let face_bytes = (size * size * 4) as usize;

    let mut data = Vec::with_capacity(face_bytes * 6);
    for (face, path) in faces.into_iter().zip(paths) {
        match face {
            Some(img) if img.width() == size && img.height() == size => {
                data.extend_from_slice(img.as_raw());
            }
            other => {
                if let Some(img) = other {
                    let err = TextureError::FaceSize {
                        path: path.clone(),
                        expected: size,
                        width: img.width(),
                        height: img.height(),
                    };
                    log::error!("{err}");
                }
                data.extend(MISSING_FACE_RGBA.iter().cycle().take(face_bytes));
            }
        }
    }

    (size, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn paths() -> [PathBuf; 6] {
        cube_face_paths(Path::new("sky"))
    }

    #[test]
    fn face_order_is_px_nx_py_ny_pz_nz() {
        let names: Vec<_> = paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            ["posx.jpg", "negx.jpg", "posy.jpg", "negy.jpg", "posz.jpg", "negz.jpg"]
        );
        assert!(paths().iter().all(|p| p.starts_with("sky")));
    }

    #[test]
    fn faces_are_packed_in_layer_order() {
        let faces: [Option<RgbaImage>; 6] =
            std::array::from_fn(|i| Some(RgbaImage::from_pixel(2, 2, Rgba([i as u8, 0, 0, 255]))));
        let (size, data) = assemble_cube_faces(faces, &paths());

        assert_eq!(size, 2);
        assert_eq!(data.len(), 2 * 2 * 4 * 6);
        for layer in 0..6 {
            assert_eq!(data[layer * 16], layer as u8);
        }
    }

    #[test]
    fn missing_and_mismatched_faces_become_gray() {
        let mut faces: [Option<RgbaImage>; 6] =
            std::array::from_fn(|_| Some(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]))));
        faces[0] = None;
        faces[3] = Some(RgbaImage::from_pixel(8, 8, Rgba([1, 1, 1, 255])));

        let (size, data) = assemble_cube_faces(faces, &paths());
        assert_eq!(size, 4);
        let face = 4 * 4 * 4;
        assert_eq!(&data[0..4], &MISSING_FACE_RGBA);
        assert_eq!(&data[face..face + 4], &[9, 9, 9, 255]);
        assert_eq!(&data[3 * face..3 * face + 4], &MISSING_FACE_RGBA);
        assert_eq!(data.len(), face * 6);
    }

    #[test]
    fn no_faces_gives_one_pixel_cube() {
        let (size, data) = assemble_cube_faces(Default::default(), &paths());
        assert_eq!(size, 1);
        assert_eq!(data.len(), 24);
    }

    #[test]
    fn decode_failure_names_the_file() {
        let err = decode_rgba(Path::new("does/not/exist.jpg"), true).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.jpg"));
    }

    #[test]
    fn texels_are_sampled_without_srgb_decode() {
        assert!(!TEXEL_FORMAT.is_srgb());
        assert_eq!(TEXEL_FORMAT.remove_srgb_suffix(), TEXEL_FORMAT);
    }
}
