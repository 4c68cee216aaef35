use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use wave_field::config::{
    BRUSH_FORCE, BRUSH_RADIUS, CELL_SCALE, RAIN_FORCE, RAIN_PROBABILITY, RAIN_RADIUS_MAX,
    RAIN_RADIUS_MIN, STATS_INTERVAL_SECS,
};
use wave_field::simulation::WaveField;

use crate::gpu::{GpuContext, ImageTexture, RenderPipeline};

/// Mouse state used to turn drags into force
#[derive(Default)]
struct PointerState {
    /// Last cursor position in physical pixels
    position: Option<PhysicalPosition<f64>>,
    left: bool,
    right: bool,
}

impl PointerState {
    /// Brush force for the buttons currently held, if any
    fn brush_force(&self) -> Option<i32> {
        match (self.left, self.right) {
            (true, false) => Some(BRUSH_FORCE),
            (false, true) => Some(-BRUSH_FORCE),
            _ => None,
        }
    }
}

/// Application state
pub struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    image: Option<ImageTexture>,
    render_pipeline: Option<RenderPipeline>,
    bind_group: Option<wgpu::BindGroup>,
    field: WaveField,
    pointer: PointerState,
    paused: bool,
    step_once: bool,
    raining: bool,
    step_count: u64,
    fps_counter: FpsCounter,
}

impl App {
    pub fn new(field: WaveField) -> Self {
        Self {
            window: None,
            gpu: None,
            image: None,
            render_pipeline: None,
            bind_group: None,
            field,
            pointer: PointerState::default(),
            paused: false,
            step_once: false,
            raining: false,
            step_count: 0,
            fps_counter: FpsCounter::new(),
        }
    }

    /// Host side of one tick: write forces, then step unless paused
    fn advance(&mut self) {
        if let (Some(force), Some(position), Some(gpu)) =
            (self.pointer.brush_force(), self.pointer.position, self.gpu.as_ref())
        {
            let (cx, cy) = cursor_to_cell(
                position,
                gpu.size(),
                (self.field.width(), self.field.height()),
            );
            self.field.inject_disc(cx, cy, BRUSH_RADIUS, force);
        }

        if self.raining {
            let mut rng = rand::thread_rng();
            if rng.gen_bool(RAIN_PROBABILITY) {
                let x = rng.gen_range(1.0..(self.field.width() - 1) as f32);
                let y = rng.gen_range(1.0..(self.field.height() - 1) as f32);
                let radius = rng.gen_range(RAIN_RADIUS_MIN..=RAIN_RADIUS_MAX);
                let force = if rng.gen::<bool>() { RAIN_FORCE } else { -RAIN_FORCE };
                self.field.inject_disc(x, y, radius, force);
            }
        }

        if !self.paused || self.step_once {
            self.field.step();
            self.step_count += 1;
            self.step_once = false;
        }
    }

    fn render(&mut self) {
        self.advance();

        let (Some(gpu), Some(image), Some(render), Some(bind_group)) = (
            self.gpu.as_ref(),
            self.image.as_ref(),
            self.render_pipeline.as_ref(),
            self.bind_group.as_ref(),
        ) else {
            return;
        };

        image.upload(&gpu.queue, self.field.image_bytes());

        let output = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });
        render.draw(&mut encoder, &view, bind_group);
        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if let Some(fps) = self.fps_counter.tick() {
            let stats = self.field.stats();
            log::info!(
                "{:.0} FPS, step {}, displacement [{}, {}], mean |u| {:.0}, {} active cells",
                fps,
                self.step_count,
                stats.min,
                stats.max,
                stats.mean_abs,
                stats.active_cells
            );
            if let Some(window) = &self.window {
                let state = match (self.paused, self.raining) {
                    (true, _) => " [Paused]",
                    (false, true) => " [Rain]",
                    (false, false) => "",
                };
                window.set_title(&format!("Wave Field - {:.0} FPS{}", fps, state));
            }
        }
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        match key_code {
            KeyCode::Space => {
                self.paused = !self.paused;
                log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
            }
            KeyCode::KeyN => {
                if self.paused {
                    self.step_once = true;
                }
            }
            KeyCode::KeyR => {
                self.raining = !self.raining;
                log::info!("Rain: {}", if self.raining { "ON" } else { "OFF" });
            }
            KeyCode::KeyC => {
                if let Err(e) = self.field.reset() {
                    log::error!("Reset failed: {}", e);
                }
                self.step_count = 0;
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = (self.field.width() as u32, self.field.height() as u32);
        log::info!("Initializing wave field viewer...");
        log::info!("Grid size: {}x{}", width, height);

        let window_attrs = Window::default_attributes()
            .with_title("Wave Field - Initializing...")
            .with_inner_size(winit::dpi::LogicalSize::new(
                width * CELL_SCALE,
                height * CELL_SCALE,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        log::info!("Creating GPU context...");
        let gpu = pollster::block_on(GpuContext::new(window.clone()));

        let image = ImageTexture::new(&gpu.device, width, height);
        let render_pipeline = RenderPipeline::new(&gpu.device, gpu.format());
        let bind_group = render_pipeline.create_bind_group(&gpu.device, &image.view);

        log::info!("Initialization complete!");
        log::info!("Controls:");
        log::info!("  Left drag: Push the surface up");
        log::info!("  Right drag: Push the surface down");
        log::info!("  Space: Pause/resume");
        log::info!("  N: Single step while paused");
        log::info!("  R: Toggle rain");
        log::info!("  C: Clear the field");
        log::info!("  Escape: Quit");

        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(gpu);
        self.image = Some(image);
        self.render_pipeline = Some(render_pipeline);
        self.bind_group = Some(bind_group);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() && !event.repeat {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        if key_code == KeyCode::Escape {
                            log::info!("Escape pressed, exiting...");
                            event_loop.exit();
                        } else {
                            self.handle_key(key_code);
                        }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.position = Some(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer = PointerState::default();
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.pointer.left = pressed,
                    MouseButton::Right => self.pointer.right = pressed,
                    _ => {}
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    log::info!("Window resized to {}x{}", new_size.width, new_size.height);
                    gpu.resize(new_size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Map a cursor position on the surface to fractional cell coordinates
fn cursor_to_cell(
    position: PhysicalPosition<f64>,
    surface: (u32, u32),
    grid: (usize, usize),
) -> (f32, f32) {
    let sx = grid.0 as f64 / surface.0.max(1) as f64;
    let sy = grid.1 as f64 / surface.1.max(1) as f64;
    ((position.x * sx) as f32, (position.y * sy) as f32)
}

/// Simple FPS counter
struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
        }
    }

    /// Tick the counter, returns Some(fps) once per reporting interval
    fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed().as_secs_f64();

        if elapsed >= STATS_INTERVAL_SECS {
            let fps = self.frame_count as f64 / elapsed;
            self.frame_count = 0;
            self.last_update = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}
