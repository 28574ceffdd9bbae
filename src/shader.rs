//! WGSL sources for the three pipelines and their compilation.
//!
//! Sources are embedded at build time. A directory can override them at
//! startup, which is handy when iterating on shading without rebuilding.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use crate::error::ShaderError;
use crate::gpu::GpuContext;

pub const SCENE_FILE: &str = "scene.wgsl";
pub const SHADOW_MAP_FILE: &str = "shadow_map.wgsl";
pub const SKYBOX_FILE: &str = "skybox.wgsl";

const SCENE_WGSL: &str = include_str!("shaders/scene.wgsl");
const SHADOW_MAP_WGSL: &str = include_str!("shaders/shadow_map.wgsl");
const SKYBOX_WGSL: &str = include_str!("shaders/skybox.wgsl");

/// Source text for the color, shadow-map, and skybox programs.
#[derive(Clone, Debug)]
pub struct ShaderSources {
    pub scene: Cow<'static, str>,
    pub shadow_map: Cow<'static, str>,
    pub skybox: Cow<'static, str>,
}

impl ShaderSources {
    pub fn embedded() -> Self {
        Self {
            scene: Cow::Borrowed(SCENE_WGSL),
            shadow_map: Cow::Borrowed(SHADOW_MAP_WGSL),
            skybox: Cow::Borrowed(SKYBOX_WGSL),
        }
    }

    /// Read all three programs from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path)
                .map(Cow::Owned)
                .map_err(|source| ShaderError::Io { path, source })
        };

        Ok(Self {
            scene: read(SCENE_FILE)?,
            shadow_map: read(SHADOW_MAP_FILE)?,
            skybox: read(SKYBOX_FILE)?,
        })
    }

    /// Embedded sources unless a directory is given.
    pub fn load(dir: Option<&Path>) -> Result<Self, ShaderError> {
        match dir {
            Some(dir) => {
                log::info!("Loading shaders from {}", dir.display());
                Self::from_dir(dir)
            }
            None => Ok(Self::embedded()),
        }
    }
}

/// Compile a WGSL module, turning validation failures into an error.
pub fn compile(
    gpu: &GpuContext,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    let (module, error) = gpu.validation_scope(|| {
        gpu.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
    });

    match error {
        None => Ok(module),
        Some(e) => Err(ShaderError::Validation {
            label: label.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_pass::{MATERIAL_LAYOUT_ENTRIES, SCENE_LAYOUT_ENTRIES, SceneUniforms};
    use crate::scene_draw::{OBJECT_LAYOUT_ENTRIES, ObjectUniforms};
    use crate::shadow::{LIGHT_LAYOUT_ENTRIES, ShadowUniforms};
    use crate::skybox::{SKYBOX_LAYOUT_ENTRIES, SkyboxUniforms};
    use naga::valid::{Capabilities, ValidationFlags, Validator};

    fn parse_and_validate(label: &str, source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{label}: {}", e.emit_to_string(source)));
        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .unwrap_or_else(|e| panic!("{label}: {e:?}"));
        module
    }

    /// Check each group's globals against the layout the pipeline is built with.
    fn assert_groups_match(
        label: &str,
        module: &naga::Module,
        groups: &[&[wgpu::BindGroupLayoutEntry]],
    ) {
        let bound: Vec<_> = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| var.binding.as_ref().map(|b| (b.group, b.binding, var)))
            .collect();

        let expected: usize = groups.iter().map(|entries| entries.len()).sum();
        assert_eq!(bound.len(), expected, "{label}: resource count");

        for (group, entries) in groups.iter().enumerate() {
            for entry in entries.iter() {
                let (_, _, var) = bound
                    .iter()
                    .find(|(g, b, _)| *g == group as u32 && *b == entry.binding)
                    .unwrap_or_else(|| panic!("{label}: nothing at ({group}, {})", entry.binding));
                let inner = &module.types[var.ty].inner;

                match entry.ty {
                    wgpu::BindingType::Buffer { min_binding_size, .. } => {
                        let name = &var.name;
                        assert_eq!(var.space, naga::AddressSpace::Uniform, "{label}: {name:?}");
                        let size = inner.size(module.to_ctx()) as u64;
                        assert_eq!(min_binding_size.map(|s| s.get()), Some(size), "{label}: {name:?}");
                    }
                    wgpu::BindingType::Texture { sample_type, view_dimension, .. } => {
                        assert_eq!(var.space, naga::AddressSpace::Handle);
                        let naga::TypeInner::Image { dim, class, .. } = inner else {
                            panic!("{label}: {:?} is not a texture", var.name);
                        };
                        let want_dim = match view_dimension {
                            wgpu::TextureViewDimension::Cube => naga::ImageDimension::Cube,
                            _ => naga::ImageDimension::D2,
                        };
                        assert_eq!(*dim, want_dim, "{label}: {:?}", var.name);
                        match sample_type {
                            wgpu::TextureSampleType::Depth => {
                                assert!(matches!(class, naga::ImageClass::Depth { multi: false }))
                            }
                            _ => assert!(matches!(
                                class,
                                naga::ImageClass::Sampled {
                                    kind: naga::ScalarKind::Float,
                                    multi: false
                                }
                            )),
                        }
                    }
                    wgpu::BindingType::Sampler(_) => {
                        assert_eq!(var.space, naga::AddressSpace::Handle);
                        assert!(matches!(inner, naga::TypeInner::Sampler { comparison: false }));
                    }
                    ref other => panic!("{label}: unexpected binding type {other:?}"),
                }
            }
        }
    }

    /// Entry points sorted by name.
    fn entry_points(module: &naga::Module) -> Vec<(&str, naga::ShaderStage)> {
        let mut points: Vec<_> = module
            .entry_points
            .iter()
            .map(|ep| (ep.name.as_str(), ep.stage))
            .collect();
        points.sort_by_key(|(name, _)| *name);
        points
    }

    #[test]
    fn color_program_matches_its_pipeline_layout() {
        let module = parse_and_validate(SCENE_FILE, SCENE_WGSL);
        assert_groups_match(
            SCENE_FILE,
            &module,
            &[&SCENE_LAYOUT_ENTRIES, &OBJECT_LAYOUT_ENTRIES, &MATERIAL_LAYOUT_ENTRIES],
        );
        assert_eq!(
            entry_points(&module),
            [("fs", naga::ShaderStage::Fragment), ("vs", naga::ShaderStage::Vertex)]
        );
    }

    #[test]
    fn depth_program_matches_its_pipeline_layout() {
        let module = parse_and_validate(SHADOW_MAP_FILE, SHADOW_MAP_WGSL);
        assert_groups_match(
            SHADOW_MAP_FILE,
            &module,
            &[&LIGHT_LAYOUT_ENTRIES, &OBJECT_LAYOUT_ENTRIES],
        );
        assert_eq!(entry_points(&module), [("vs", naga::ShaderStage::Vertex)]);
    }

    #[test]
    fn sky_program_matches_its_pipeline_layout() {
        let module = parse_and_validate(SKYBOX_FILE, SKYBOX_WGSL);
        assert_groups_match(SKYBOX_FILE, &module, &[&SKYBOX_LAYOUT_ENTRIES]);
        assert_eq!(
            entry_points(&module),
            [("fs", naga::ShaderStage::Fragment), ("vs", naga::ShaderStage::Vertex)]
        );
    }

    #[test]
    fn uniform_structs_match_their_rust_mirrors() {
        let sizes = |source: &str| {
            let module = parse_and_validate("uniforms", source);
            let mut sizes: Vec<_> = module
                .global_variables
                .iter()
                .filter(|(_, var)| var.space == naga::AddressSpace::Uniform)
                .map(|(_, var)| {
                    let name = var.name.clone().unwrap_or_default();
                    (name, module.types[var.ty].inner.size(module.to_ctx()) as usize)
                })
                .collect();
            sizes.sort();
            sizes
        };

        assert_eq!(
            sizes(SCENE_WGSL),
            [
                ("object".to_string(), std::mem::size_of::<ObjectUniforms>()),
                ("scene".to_string(), std::mem::size_of::<SceneUniforms>()),
            ]
        );
        assert_eq!(
            sizes(SHADOW_MAP_WGSL),
            [
                ("light".to_string(), std::mem::size_of::<ShadowUniforms>()),
                ("object".to_string(), std::mem::size_of::<ObjectUniforms>()),
            ]
        );
        assert_eq!(
            sizes(SKYBOX_WGSL),
            [("camera".to_string(), std::mem::size_of::<SkyboxUniforms>())]
        );
    }

    #[test]
    fn color_program_exposes_uniform_names() {
        let sources = ShaderSources::embedded();
        for name in [
            "tex",
            "shadowMap",
            "model",
            "mat",
            "projectionLight",
            "viewLight",
            "eyePosition",
            "point_ambient_intensity",
            "point_diffuse_intensity",
            "point_specular_intensity",
            "directional_light",
            "u_shininess",
        ] {
            assert!(sources.scene.contains(name), "scene.wgsl is missing {name}");
        }
    }

    #[test]
    fn depth_and_sky_programs_expose_uniform_names() {
        let sources = ShaderSources::embedded();
        for name in ["projection", "view", "model"] {
            assert!(sources.shadow_map.contains(name), "shadow_map.wgsl is missing {name}");
        }
        for name in ["projection", "view", "skybox"] {
            assert!(sources.skybox.contains(name), "skybox.wgsl is missing {name}");
        }
    }

    #[test]
    fn every_program_has_a_vertex_entry_point() {
        let sources = ShaderSources::embedded();
        for source in [&sources.scene, &sources.shadow_map, &sources.skybox] {
            assert!(source.contains("fn vs("));
        }
        assert!(!sources.shadow_map.contains("@fragment"));
    }

    #[test]
    fn missing_directory_reports_the_path() {
        let err = ShaderSources::from_dir("no/such/shader/dir").unwrap_err();
        match err {
            ShaderError::Io { path, .. } => assert!(path.ends_with(SCENE_FILE)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_without_dir_is_embedded() {
        let sources = ShaderSources::load(None).unwrap();
        assert!(matches!(sources.scene, Cow::Borrowed(_)));
    }
}
