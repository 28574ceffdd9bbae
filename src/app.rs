use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

use crate::color_pass::ColorPass;
use crate::error::AppError;
use crate::freelook_camera::FreelookCamera;
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::mesh::VertexBuffer;
use crate::scene::{LightState, Lighting, RoomScene};
use crate::shader::{self, ShaderSources};
use crate::shadow::{ShadowMap, ShadowPass};
use crate::skybox::SkyboxPass;
use crate::texture::{CubeTexture, Texture};

/// Apply one frame of input to the camera.
///
/// Every held key moves by the same `dt`. Pointer and scroll are applied only
/// when non-zero, so an idle frame never consumes the first-pointer skip.
pub(crate) fn apply_input(input: &Input, camera: &mut FreelookCamera, dt: f32) {
    for movement in input.movements() {
        camera.apply_keyboard(movement, dt);
    }

    let pointer = input.pointer_delta();
    if pointer != Vec2::ZERO {
        camera.apply_pointer_delta(pointer);
    }

    let scroll = input.scroll_delta();
    if scroll != 0.0 {
        camera.apply_scroll(scroll);
    }
}

/// Configuration for the window and the files loaded at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub asset_dir: PathBuf,
    /// Flipped vertically on load.
    pub wall_texture: PathBuf,
    /// Holds the six cube faces named in [`CUBE_FACES`](crate::CUBE_FACES).
    pub skybox_dir: PathBuf,
    /// Read WGSL from here instead of the embedded copies.
    pub shader_dir: Option<PathBuf>,
    pub shadow_map_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Shadowbox".to_string(),
            width: 1920,
            height: 1080,
            asset_dir: PathBuf::new(),
            wall_texture: PathBuf::new(),
            skybox_dir: PathBuf::new(),
            shader_dir: None,
            shadow_map_size: 2048,
        }
        .asset_dir("assets")
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the asset root. The wall texture and skybox paths move with it.
    pub fn asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = dir.into();
        self.wall_texture = self.asset_dir.join("textures").join("room.jpg");
        self.skybox_dir = self.asset_dir.join("skybox");
        self
    }

    pub fn wall_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.wall_texture = path.into();
        self
    }

    pub fn skybox_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.skybox_dir = dir.into();
        self
    }

    pub fn shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }

    pub fn shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = size;
        self
    }
}

/// Measures the time between frames. Sampled once per frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    last_frame: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self { last_frame: now }
    }

    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the room with the default configuration.
pub fn run() -> Result<(), AppError> {
    run_with_config(AppConfig::default())
}

/// Open the window and render until it is closed.
///
/// Errors during startup end the event loop and are returned here.
pub fn run_with_config(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ShadowboxApp {
        state: AppState::Pending { config },
        fatal: None,
    };
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Everything that lives from window creation until shutdown.
struct Renderer {
    window: Arc<Window>,
    gpu: GpuContext,
    input: Input,
    camera: FreelookCamera,
    clock: FrameClock,
    scene: RoomScene,
    light: LightState,
    lighting: Lighting,
    vertices: VertexBuffer,
    shadow_map: ShadowMap,
    shadow_pass: ShadowPass,
    color_pass: ColorPass,
    skybox: SkyboxPass,
}

impl Renderer {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        grab_pointer(&window);

        let gpu = GpuContext::new(window.clone())?;

        let sources = ShaderSources::load(config.shader_dir.as_deref())?;
        let scene_shader = shader::compile(&gpu, "Scene Shader", &sources.scene)?;
        let shadow_shader = shader::compile(&gpu, "Shadow Map Shader", &sources.shadow_map)?;
        let skybox_shader = shader::compile(&gpu, "Skybox Shader", &sources.skybox)?;

        let scene = RoomScene::load()?;
        log::info!(
            "Loaded {} meshes, {} objects, {} vertices",
            scene.registry.len(),
            scene.graph.len(),
            scene.vertices.len()
        );
        log::debug!("Meshes not drawn: {:?}", scene.unused_meshes());

        let light = LightState::default();
        for name in light.casters_outside(&scene.graph, &scene.vertices) {
            log::warn!("'{name}' extends past the light frustum; its shadow will be clipped");
        }

        let vertices = VertexBuffer::new(&gpu, &scene.vertices);
        log::debug!("Uploaded {} vertices", vertices.vertex_count());
        let wall = Texture::load_or_white(&gpu, &config.wall_texture, true);
        let cube = CubeTexture::load(&gpu, &config.skybox_dir);

        let object_count = scene.graph.len();
        let shadow_map = ShadowMap::new(&gpu, config.shadow_map_size);
        let shadow_pass = ShadowPass::new(&gpu, &shadow_shader, object_count);
        let color_pass = ColorPass::new(&gpu, &scene_shader, &shadow_map, &wall, object_count);
        let skybox = SkyboxPass::new(&gpu, &skybox_shader, &cube);

        Ok(Self {
            window,
            gpu,
            input: Input::new(),
            camera: FreelookCamera::new(),
            clock: FrameClock::new(),
            scene,
            light,
            lighting: Lighting::default(),
            vertices,
            shadow_map,
            shadow_pass,
            color_pass,
            skybox,
        })
    }

    fn render_frame(&mut self) {
        let dt = self.clock.tick();
        apply_input(&self.input, &mut self.camera, dt);
        self.color_pass.ensure_depth_size(&self.gpu);

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface {e}, reconfiguring");
                self.gpu.reconfigure();
                return;
            }
            Err(e) => {
                log::error!("Skipping frame: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let camera = self.camera.camera();
        let aspect = self.gpu.aspect();
        let view_projection = camera.projection_matrix(aspect) * camera.view_matrix();
        let graph = &self.scene.graph;

        self.shadow_pass.prepare(&self.gpu.queue, &self.light, graph);
        self.color_pass.prepare(
            &self.gpu.queue,
            &self.light,
            &self.lighting,
            camera.position,
            view_projection,
            graph,
        );
        self.skybox.prepare(&self.gpu.queue, &camera, aspect);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.shadow_pass
            .render(&mut encoder, &self.shadow_map, &self.vertices, graph);

        {
            let mut render_pass = self.color_pass.begin(&mut encoder, &view);
            self.color_pass.draw(&mut render_pass, &self.vertices, graph);
            self.skybox.draw(&mut render_pass);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

fn grab_pointer(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        log::warn!("Could not grab the pointer: {e}");
    }
    window.set_cursor_visible(false);
}

enum AppState {
    Pending { config: AppConfig },
    Running(Box<Renderer>),
    Terminated,
}

struct ShadowboxApp {
    state: AppState,
    fatal: Option<AppError>,
}

impl ApplicationHandler for ShadowboxApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config } = &self.state else {
            return;
        };

        match Renderer::new(event_loop, config) {
            Ok(renderer) => {
                renderer.window.request_redraw();
                self.state = AppState::Running(Box::new(renderer));
            }
            Err(e) => {
                self.fatal = Some(e);
                self.state = AppState::Terminated;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(renderer) = &mut self.state else {
            return;
        };

        renderer.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                renderer.gpu.resize(size.width, size.height);
            }
            WindowEvent::Focused(true) => {
                grab_pointer(&renderer.window);
            }
            WindowEvent::Focused(false) => {
                renderer.camera.release_pointer();
            }
            WindowEvent::RedrawRequested => {
                renderer.render_frame();
                renderer.input.begin_frame();
                renderer.window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let AppState::Running(renderer) = &mut self.state {
            renderer.input.handle_device_event(&event);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if matches!(self.state, AppState::Running(_)) {
            log::info!("Window closed, shutting down");
        }
        self.state = AppState::Terminated;
    }
}
