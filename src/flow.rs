//! Application event loop and the per-frame driver.
//!
//! Startup builds one [`GlobeApp`]: GPU context, datasets, the decorated globe,
//! the camera rig with its initial view sync, the pass chain and the overlay.
//! After that every `RedrawRequested` runs [`run_frame`] and asks for the next
//! redraw, so the loop schedules itself until the window (or page) closes.
//!
//! # Frame stages
//!
//! [`run_frame`] drives a [`FrameStages`] implementation in a fixed order:
//! 1. update the orbit controls (which may sync the point of view)
//! 2. acquire the frame; on failure the remaining stages are skipped
//! 3. render the composited pass chain into the primary target
//! 4. render the overlay above it
//! 5. submit and present

use std::{fmt::Display, iter, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::GlobeOptions,
    context::Context,
    data_structures::dataset::Datasets,
    decorator,
    render::{Composer, FrameInfo, OverlayRenderer, TargetSizes},
    scene::Scene,
    view_sync::{sync_point_of_view, update_and_sync},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// The ordered work of one frame.
pub trait FrameStages {
    type Frame;
    type Error: Display;

    fn update_controls(&mut self, dt: Duration);
    fn begin_frame(&mut self) -> Result<Self::Frame, Self::Error>;
    fn render_composited(&mut self, frame: &mut Self::Frame);
    fn render_overlay(&mut self, frame: &mut Self::Frame);
    fn present(&mut self, frame: Self::Frame);
}

/// Run one frame. The composited pass always precedes the overlay, and both
/// are skipped when no frame could be acquired.
pub fn run_frame<S: FrameStages>(stages: &mut S, dt: Duration) -> Result<(), S::Error> {
    stages.update_controls(dt);
    let mut frame = stages.begin_frame()?;
    stages.render_composited(&mut frame);
    stages.render_overlay(&mut frame);
    stages.present(frame);
    Ok(())
}

/// Everything one running globe owns.
pub struct GlobeApp {
    pub ctx: Context,
    pub scene: Scene,
    composer: Composer,
    overlay: OverlayRenderer,
    elapsed: Duration,
}

impl GlobeApp {
    pub async fn new(window: Arc<Window>, options: GlobeOptions) -> anyhow::Result<Self> {
        let ctx = Context::new(window, &options).await?;
        let datasets = Datasets::load(&options.datasets).await?;
        let globe = decorator::decorate(&datasets, &options.style);
        let mut scene = Scene::assemble(globe, &options.scene);
        sync_point_of_view(&ctx.camera.camera, &mut scene.globe);

        let composer = Composer::globe_chain(&ctx, &scene, &options);
        let overlay = OverlayRenderer::new(&ctx, &scene);
        log::info!("Globe ready at {}x{}", ctx.config.width, ctx.config.height);

        Ok(Self {
            ctx,
            scene,
            composer,
            overlay,
            elapsed: Duration::ZERO,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.ctx.resize(width, height) {
            return;
        }
        let viewport = self.ctx.viewport();
        self.composer.resize(&self.ctx.device, viewport);
        self.overlay.resize(&self.ctx, viewport);
        log::debug!("Resized to {}x{}: {:?}", viewport.width, viewport.height, self.target_sizes());
    }

    /// Sizes of the surface and every target that follows it.
    pub fn target_sizes(&self) -> TargetSizes {
        TargetSizes {
            surface: [self.ctx.config.width, self.ctx.config.height],
            depth: self.ctx.depth_texture.size(),
            composer: self.composer.buffer_sizes(),
            passes: self.composer.pass_target_sizes(),
            overlay: self.overlay.targets.overlay.size(),
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.ctx.camera.controls.handle_window_events(event)
    }

    fn frame_info(&self) -> FrameInfo {
        let elapsed_ms = self.elapsed.as_secs_f64() * 1000.0;
        FrameInfo {
            elapsed_ms,
            transform: self.scene.globe.transform_at(elapsed_ms as f32),
        }
    }
}

pub struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    info: FrameInfo,
}

impl FrameStages for GlobeApp {
    type Frame = Frame;
    type Error = wgpu::SurfaceError;

    fn update_controls(&mut self, dt: Duration) {
        self.elapsed += dt;
        let camera = &mut self.ctx.camera;
        update_and_sync(&mut camera.controls, &mut camera.camera, &mut self.scene.globe, dt);
        camera.write(&self.ctx.queue);
    }

    fn begin_frame(&mut self) -> Result<Frame, wgpu::SurfaceError> {
        let surface_texture = self.ctx.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        Ok(Frame {
            surface_texture,
            view,
            encoder,
            info: self.frame_info(),
        })
    }

    fn render_composited(&mut self, frame: &mut Frame) {
        self.composer.prepare(&self.ctx, &self.scene, &frame.info);
        self.composer.render(&self.ctx, &mut frame.encoder, &frame.view);
    }

    fn render_overlay(&mut self, frame: &mut Frame) {
        self.overlay.prepare(&self.ctx, &self.scene, &frame.info);
        self.overlay.render(&mut frame.encoder, &frame.view);
    }

    fn present(&mut self, frame: Frame) {
        self.ctx.queue.submit(iter::once(frame.encoder.finish()));
        self.ctx.window.pre_present_notify();
        frame.surface_texture.present();
    }
}

pub enum FlowEvent {
    Initialized(Box<GlobeApp>),
    Failed(String),
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    options: Option<GlobeOptions>,
    globe: Option<GlobeApp>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, options: GlobeOptions) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            options: Some(options),
            globe: None,
            last_time: Instant::now(),
        })
    }

    fn start(&mut self, globe: GlobeApp) {
        let size = globe.ctx.window.inner_size();
        let mut globe = globe;
        globe.resize(size.width, size.height);
        globe.ctx.window.request_redraw();
        self.last_time = Instant::now();
        self.globe = Some(globe);
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Only the first resume starts the globe.
        let Some(options) = self.options.take() else {
            return;
        };

        let window_attributes = Window::default_attributes().with_title(options.title.clone());
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        #[cfg(target_arch = "wasm32")]
        if let Err(e) = attach_canvas(&window, &options.container_selector) {
            log::error!("{e:#}");
            event_loop.exit();
            return;
        }

        let init_future = GlobeApp::new(window, options);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(globe) => self.start(globe),
                Err(e) => {
                    log::error!("Startup failed: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(globe) => FlowEvent::Initialized(Box::new(globe)),
                    Err(e) => FlowEvent::Failed(format!("{e:#}")),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before startup finished");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(globe) => self.start(*globe),
            FlowEvent::Failed(message) => {
                log::error!("Startup failed: {message}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let globe = match &mut self.globe {
            Some(globe) => globe,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => globe.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match run_frame(globe, dt) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = globe.ctx.window.inner_size();
                        globe.resize(size.width, size.height);
                    }
                    Err(e) => log::error!("Unable to render {e}"),
                }
                globe.ctx.window.request_redraw();
            }
            other => {
                globe.handle_window_event(&other);
            }
        }
    }
}

/// Append the winit canvas to the page container and size it to the browser window.
#[cfg(target_arch = "wasm32")]
fn attach_canvas(window: &Window, selector: &str) -> anyhow::Result<()> {
    use winit::platform::web::WindowExtWebSys;

    let web_window = web_sys::window().ok_or_else(|| anyhow::anyhow!("No browser window"))?;
    let document = web_window
        .document()
        .ok_or_else(|| anyhow::anyhow!("No document"))?;
    let container = document
        .query_selector(selector)
        .map_err(|e| anyhow::anyhow!("Invalid container selector {selector}: {e:?}"))?
        .ok_or_else(|| anyhow::anyhow!("Container element {selector} not found"))?;
    let canvas = window
        .canvas()
        .ok_or_else(|| anyhow::anyhow!("Window has no canvas"))?;
    container
        .append_child(&canvas)
        .map_err(|e| anyhow::anyhow!("Unable to append canvas: {e:?}"))?;

    let width = web_window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(800.0);
    let height = web_window.inner_height().ok().and_then(|h| h.as_f64()).unwrap_or(600.0);
    let _ = window.request_inner_size(winit::dpi::LogicalSize::new(width, height));
    Ok(())
}

pub fn run(options: GlobeOptions) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, options)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
