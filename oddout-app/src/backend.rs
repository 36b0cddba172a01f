use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use oddout_core::{
    Display, ExperimentError, ItemId, Layout, PointerInput, PointerSample, Scene,
};
use oddout_experiment::ExperimentConfig;
use oddout_render::{FontVec, SkiaRenderer, Stimulus, load_stimulus};
use oddout_timing::{FrameTimings, HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use tracing::{debug, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Fullscreen, Window, WindowId},
};

const OPEN_ATTEMPTS: usize = 500;

/// Window state driven by winit callbacks while the backend pumps events.
struct Shell {
    size: (u32, u32),
    fullscreen: bool,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    cursor: Option<PhysicalPosition<f64>>,
    presses: Vec<(f32, f32)>,
    aborted: bool,
    error: Option<String>,
}

impl Shell {
    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut attributes = Window::default_attributes()
            .with_title("Odd one out")
            .with_inner_size(LogicalSize::new(self.size.0, self.size.1))
            .with_resizable(false);
        if self.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(event_loop.create_window(attributes)?);
        let physical_size = window.inner_size();
        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale_factor = window.scale_factor(),
            "Window opened"
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(self.size.0, self.size.1, surface_texture)?);
        window.set_cursor_visible(true);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn record_press(&mut self) {
        let (Some(cursor), Some(pixels)) = (self.cursor, &self.pixels) else {
            return;
        };
        match pixels.window_pos_to_pixel((cursor.x as f32, cursor.y as f32)) {
            Ok((x, y)) => self.presses.push((x as f32, y as f32)),
            Err(_) => debug!(x = cursor.x, y = cursor.y, "Press outside the frame buffer"),
        }
    }
}

impl ApplicationHandler for Shell {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                self.error = Some(format!("failed to create window and surface: {}", e));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.aborted = true,
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed()
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.aborted = true;
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor = Some(position),
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.record_press(),
            WindowEvent::Resized(size) => {
                if let Some(pixels) = &mut self.pixels {
                    if let Err(e) = pixels.resize_surface(size.width, size.height) {
                        warn!("Failed to resize surface: {}", e);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(pixels) = &self.pixels {
                    if let Err(e) = pixels.render() {
                        self.error = Some(format!("redraw failed: {}", e));
                    }
                }
            }
            _ => {}
        }
    }
}

/// winit window with a `pixels` surface, painted by the skia scene renderer.
pub struct WindowBackend {
    event_loop: EventLoop<()>,
    shell: Shell,
    renderer: SkiaRenderer,
    timer: HighPrecisionTimer,
    frame_timings: FrameTimings,
}

impl WindowBackend {
    pub fn open(config: &ExperimentConfig, font: Option<FontVec>) -> Result<Self> {
        let layout = &config.layout;
        let mut event_loop = EventLoop::new()?;
        let mut shell = Shell {
            size: (layout.width, layout.height),
            fullscreen: config.fullscreen,
            window: None,
            pixels: None,
            cursor: None,
            presses: Vec::new(),
            aborted: false,
            error: None,
        };

        for _ in 0..OPEN_ATTEMPTS {
            let status = event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut shell);
            if let Some(e) = shell.error.take() {
                return Err(anyhow!(e));
            }
            if shell.pixels.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) = status {
                return Err(anyhow!("event loop exited with code {} before the window opened", code));
            }
        }
        if shell.pixels.is_none() {
            return Err(anyhow!("window did not open"));
        }

        Ok(Self {
            event_loop,
            shell,
            renderer: SkiaRenderer::new(layout.width, layout.height, font)?,
            timer: HighPrecisionTimer::new(),
            frame_timings: FrameTimings::default(),
        })
    }

    fn pump(&mut self) -> oddout_core::Result<()> {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.shell);
        if let Some(e) = self.shell.error.take() {
            return Err(ExperimentError::Display(e));
        }
        if self.shell.aborted || matches!(status, PumpStatus::Exit(_)) {
            return Err(ExperimentError::Aborted);
        }
        Ok(())
    }
}

impl Display for WindowBackend {
    type Stimulus = Stimulus;

    fn load_stimulus(
        &mut self,
        item: ItemId,
        path: &Path,
        layout: &Layout,
    ) -> oddout_core::Result<Stimulus> {
        load_stimulus(item, path, layout.stimulus_size)
    }

    fn footprint(&self, stimulus: &Stimulus) -> (f32, f32) {
        let (w, h) = stimulus.size();
        (w as f32, h as f32)
    }

    fn present(&mut self, scene: Scene<'_, Stimulus>) -> oddout_core::Result<()> {
        self.renderer.render_scene(&scene)?;
        let pixels = self
            .shell
            .pixels
            .as_mut()
            .ok_or_else(|| ExperimentError::Display("window is closed".into()))?;
        pixels.frame_mut().copy_from_slice(self.renderer.frame());

        let start = self.timer.now();
        pixels
            .render()
            .map_err(|e| ExperimentError::Display(e.to_string()))?;
        self.frame_timings.record_frame(self.timer.elapsed(start));
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stats) = self.frame_timings.stats() {
            info!(
                frames = stats.samples,
                mean_ms = stats.average_frame_time_ns / 1e6,
                jitter_ms = stats.jitter_ns / 1e6,
                min_ms = stats.min_frame_time_ns / 1e6,
                max_ms = stats.max_frame_time_ns / 1e6,
                "Presentation timing"
            );
        }
        self.shell.pixels = None;
        self.shell.window = None;
        // Let the platform process the destroyed window.
        let _ = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.shell);
        info!("Window closed");
    }
}

impl PointerInput for WindowBackend {
    fn poll(&mut self) -> oddout_core::Result<PointerSample> {
        self.pump()?;
        Ok(PointerSample {
            presses: std::mem::take(&mut self.shell.presses),
        })
    }

    fn discard_pending(&mut self) -> oddout_core::Result<()> {
        self.pump()?;
        let stale = std::mem::take(&mut self.shell.presses);
        if !stale.is_empty() {
            debug!(presses = ?stale, "Presses before render discarded");
        }
        Ok(())
    }
}
