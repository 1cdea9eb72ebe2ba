//! `vista [MODEL.stl]` opens a model (a unit cube by default) in an orbit viewer.
//!
//! Drag with the left mouse button to orbit, scroll to zoom. Keys `1`–`4`
//! toggle faces, wireframe, bounding box and corner markers; `Esc` quits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use glam::{Vec2, Vec4};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use vista::{
    DrawConfig, GpuContext, Model, OrbitCamera, Renderer, ShaderVariant, SurfaceAction,
    ViewerConfig, init_logging,
};

const BOX_COLOR: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);
const MARKER_COLOR: Vec4 = Vec4::new(0.0, 0.4, 1.0, 0.8);

struct Viewer {
    config: ViewerConfig,
    model: Model,
    camera: OrbitCamera,
    draw: DrawConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    renderer: Option<Renderer>,
    dragging: bool,
    cursor: Option<Vec2>,
    markers_dirty: bool,
}

impl Viewer {
    fn new(config: ViewerConfig, model: Model) -> Self {
        Self {
            draw: config.draw,
            camera: OrbitCamera::new().distance(2.5).azimuth(0.6).elevation(0.4),
            config,
            model,
            window: None,
            gpu: None,
            renderer: None,
            dragging: false,
            cursor: None,
            markers_dirty: true,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.width,
                self.config.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );

        let gpu = GpuContext::new(window.clone()).context("failed to initialize GPU")?;
        let mut renderer = Renderer::new(&gpu, self.config.clear_color_premultiplied());

        renderer.update_stream(&gpu, ShaderVariant::Model, self.model.faces().as_slice());
        renderer.update_stream(&gpu, ShaderVariant::Mesh, self.model.wireframe().as_slice());
        renderer.update_stream(
            &gpu,
            ShaderVariant::Lines,
            self.model.bounding_box_lines(BOX_COLOR).as_slice(),
        );

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.renderer = Some(renderer);
        self.markers_dirty = true;

        Ok(())
    }

    /// Markers are camera-facing, so they follow every orbit.
    fn refresh_markers(&mut self) {
        let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) else {
            return;
        };

        let size = self.config.marker_size * self.model.extent();
        let right = self.camera.right() * size;
        let up = self.camera.up() * size;

        match self.model.corner_markers(right, up, MARKER_COLOR) {
            Ok(markers) => renderer.update_stream(gpu, ShaderVariant::Circles, markers.as_slice()),
            Err(e) => log::error!("failed to build corner markers: {}", e),
        }
        self.markers_dirty = false;
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.markers_dirty && self.draw.draw_points {
            self.refresh_markers();
        }

        let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) else {
            return;
        };

        let uniforms = self.camera.uniforms(gpu.aspect());
        if let Err(e) = renderer.draw(gpu, &uniforms, &self.draw) {
            if gpu.handle_surface_error(e.0) == SurfaceAction::Fatal {
                event_loop.exit();
            }
        }
    }

    fn toggle(&mut self, variant: ShaderVariant) {
        let on = self.draw.toggle(variant);
        log::info!("{} {}", variant, if on { "on" } else { "off" });
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("{:#}", e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Digit1) => self.toggle(ShaderVariant::Model),
                    PhysicalKey::Code(KeyCode::Digit2) => self.toggle(ShaderVariant::Mesh),
                    PhysicalKey::Code(KeyCode::Digit3) => self.toggle(ShaderVariant::Lines),
                    PhysicalKey::Code(KeyCode::Digit4) => self.toggle(ShaderVariant::Circles),
                    PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                    _ => (),
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if let (true, Some(last)) = (self.dragging, self.cursor) {
                    self.camera.rotate(position - last);
                    self.markers_dirty = true;
                }
                self.cursor = Some(position);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                self.camera.zoom(lines);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => (),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config = ViewerConfig::new();
    init_logging(config.logging.clone());

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let mut model = match &path {
        Some(path) => Model::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            log::info!("no model given, showing a cube");
            Model::cube()
        }
    };
    model.recenter();
    model.normalize();
    let model = model.with_color(config.model_color);

    let config = match &path {
        Some(path) => config.title(format!("Vista - {}", path.display())),
        None => config,
    };

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut viewer = Viewer::new(config, model);
    event_loop
        .run_app(&mut viewer)
        .context("event loop terminated with an error")?;

    Ok(())
}
