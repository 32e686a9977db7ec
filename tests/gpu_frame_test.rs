#[cfg(feature = "integration-tests")]
use std::sync::Arc;

#[cfg(feature = "integration-tests")]
use hexglobe::{
    GlobeOptions,
    flow::{GlobeApp, run_frame},
    pipelines::bloom,
    render::TargetSizes,
};
#[cfg(feature = "integration-tests")]
use instant::Duration;
#[cfg(feature = "integration-tests")]
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

/// Opens one window, drives the globe through a resize and a frame, then exits.
#[cfg(feature = "integration-tests")]
struct SizeCheck {
    runtime: tokio::runtime::Runtime,
    /// Window size, then target sizes after shrinking and after restoring and rendering a frame.
    outcome: Option<anyhow::Result<([u32; 2], TargetSizes, TargetSizes)>>,
}

#[cfg(feature = "integration-tests")]
impl SizeCheck {
    fn exercise(&self, window: Arc<Window>) -> anyhow::Result<([u32; 2], TargetSizes, TargetSizes)> {
        let size = window.inner_size();
        let mut globe = self.runtime.block_on(GlobeApp::new(window, GlobeOptions::default()))?;

        globe.resize((size.width / 2).max(1), (size.height / 2).max(1));
        let shrunk = globe.target_sizes();

        globe.resize(size.width, size.height);
        run_frame(&mut globe, Duration::from_millis(16)).map_err(|e| anyhow::anyhow!("{e}"))?;
        Ok(([size.width, size.height], shrunk, globe.target_sizes()))
    }
}

#[cfg(feature = "integration-tests")]
impl ApplicationHandler for SizeCheck {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.outcome.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title("hexglobe size check")
            .with_inner_size(winit::dpi::PhysicalSize::new(640, 480));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.outcome = Some(Err(e.into()));
                event_loop.exit();
                return;
            }
        };
        self.outcome = Some(self.exercise(window));
        event_loop.exit();
    }

    fn window_event(&mut self, _: &ActiveEventLoop, _: WindowId, _: WindowEvent) {}
}

#[cfg(feature = "integration-tests")]
fn assert_follows(sizes: &TargetSizes, width: u32, height: u32) {
    let full = [width, height];
    assert_eq!(sizes.surface, full);
    assert_eq!(sizes.depth, full);
    assert_eq!(sizes.composer, [full, full]);
    assert_eq!(sizes.overlay, full);

    let mips = bloom::mip_sizes(width, height);
    let expected_bloom: Vec<[u32; 2]> = std::iter::once(mips[0]).chain(mips).collect();
    assert_eq!(sizes.passes.len(), 2);
    assert!(sizes.passes[0].is_empty(), "scene pass owns no targets");
    assert_eq!(sizes.passes[1], expected_bloom);
}

#[test]
#[cfg(feature = "integration-tests")]
fn targets_follow_the_window_through_resize_and_frame() {
    #[cfg(target_os = "linux")]
    let event_loop = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        EventLoop::builder()
            .with_any_thread(true)
            .build()
            .expect("Failed to create an event loop")
    };
    #[cfg(target_os = "windows")]
    let event_loop = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        EventLoop::builder()
            .with_any_thread(true)
            .build()
            .expect("Failed to create an event loop")
    };
    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    let event_loop = EventLoop::new().expect("Failed to create an event loop");

    let mut check = SizeCheck {
        runtime: tokio::runtime::Runtime::new().expect("tokio runtime"),
        outcome: None,
    };
    event_loop.run_app(&mut check).expect("event loop runs");

    let ([width, height], shrunk, restored) = check
        .outcome
        .take()
        .expect("the globe was exercised")
        .expect("startup, resize and frame succeed");

    assert_follows(&shrunk, (width / 2).max(1), (height / 2).max(1));
    assert_follows(&restored, width, height);
}
