//! Render composition.
//!
//! A frame is drawn in two stages:
//!
//! - the [`Composer`] runs its ordered passes ([`ScenePass`] then [`BloomPass`])
//!   through two ping-pong buffers, the last pass writing to the primary surface
//! - the [`OverlayRenderer`] draws marker indicators into the overlay target and
//!   blends it over the primary surface
//!
//! Routing between passes is decided by [`route_passes`], which is pure so the
//! order can be checked without a GPU.

use crate::{
    config::GlobeOptions,
    context::Context,
    data_structures::{texture::Texture, transform::Transform},
    pipelines::{
        arcs::ArcsPipeline,
        atmosphere::AtmospherePipeline,
        bloom::{BloomConfig, BloomPipeline},
        globe::GlobePipeline,
        light::LightResources,
        model::ModelResources,
        overlay::{self, OverlayPipeline},
    },
    scene::Scene,
};

/// Drawable size in physical pixels, never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }
}

/// Sizes of every size-dependent target, as currently allocated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetSizes {
    pub surface: [u32; 2],
    pub depth: [u32; 2],
    pub composer: [[u32; 2]; 2],
    /// Internal targets of each pass, in chain order.
    pub passes: Vec<Vec<[u32; 2]>>,
    pub overlay: [u32; 2],
}

/// One of the two intermediate buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutput {
    Buffer(Slot),
    Primary,
}

/// Where a pass reads from and writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassRoute {
    pub input: Option<Slot>,
    pub output: PassOutput,
}

/// Routes for `n` chained passes: the first pass has no input, each later pass
/// reads what the previous one wrote, and the last one writes the primary target.
pub fn route_passes(n: usize) -> Vec<PassRoute> {
    let mut routes = Vec::with_capacity(n);
    let mut previous: Option<Slot> = None;
    for i in 0..n {
        let output = if i + 1 == n {
            PassOutput::Primary
        } else {
            PassOutput::Buffer(previous.map_or(Slot::A, Slot::other))
        };
        routes.push(PassRoute {
            input: previous,
            output,
        });
        if let PassOutput::Buffer(slot) = output {
            previous = Some(slot);
        }
    }
    routes
}

/// Per-frame values shared by every pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInfo {
    pub elapsed_ms: f64,
    pub transform: Transform,
}

pub trait Pass {
    fn label(&self) -> &str;

    fn resize(&mut self, _device: &wgpu::Device, _viewport: Viewport) {}

    /// Called with the buffer this pass reads whenever that buffer is (re)created.
    fn bind_input(&mut self, _device: &wgpu::Device, _input: &Texture) {}

    /// Sizes of the targets this pass owns.
    fn target_sizes(&self) -> Vec<[u32; 2]> {
        Vec::new()
    }

    /// Upload per-frame uniforms.
    fn prepare(&mut self, _ctx: &Context, _scene: &Scene, _frame: &FrameInfo) {}

    fn render(&self, ctx: &Context, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView);
}

/// Draws the globe and its children with depth testing.
pub struct ScenePass {
    clear: wgpu::Color,
    light: LightResources,
    model: ModelResources,
    globe: GlobePipeline,
    arcs: ArcsPipeline,
    atmosphere: Option<AtmospherePipeline>,
}

impl ScenePass {
    pub fn new(ctx: &Context, scene: &Scene, format: wgpu::TextureFormat) -> Self {
        let device = &ctx.device;
        let light = LightResources::new(device, scene);
        let model = ModelResources::new(device, &scene.globe.transform_at(0.0));
        let camera_layout = &ctx.camera.bind_group_layout;
        let globe = GlobePipeline::new(
            device,
            format,
            camera_layout,
            &model.bind_group_layout,
            &light.bind_group_layout,
            &scene.globe,
        );
        let arcs = ArcsPipeline::new(device, format, camera_layout, &model.bind_group_layout, &scene.globe);
        let atmosphere = AtmospherePipeline::new(
            device,
            format,
            camera_layout,
            &model.bind_group_layout,
            scene.globe.atmosphere.as_ref(),
        );
        Self {
            clear: scene.clear_colour(),
            light,
            model,
            globe,
            arcs,
            atmosphere,
        }
    }
}

impl Pass for ScenePass {
    fn label(&self) -> &str {
        "Scene Pass"
    }

    fn prepare(&mut self, ctx: &Context, scene: &Scene, frame: &FrameInfo) {
        self.light.write(&ctx.queue, scene);
        self.model.write(&ctx.queue, &frame.transform);
        self.arcs.update(&ctx.queue, &scene.globe, frame.elapsed_ms);
    }

    fn render(&self, ctx: &Context, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &ctx.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        });
        let camera = &ctx.camera.bind_group;
        let model = &self.model.bind_group;
        self.globe.draw(&mut pass, camera, model, &self.light.bind_group);
        self.arcs.draw(&mut pass, camera, model);
        // Translucent, so it goes last.
        if let Some(atmosphere) = &self.atmosphere {
            atmosphere.draw(&mut pass, camera, model);
        }
    }
}

pub struct BloomPass {
    bloom: BloomPipeline,
}

impl BloomPass {
    pub fn new(ctx: &Context, config: BloomConfig, output_format: wgpu::TextureFormat) -> Self {
        Self {
            bloom: BloomPipeline::new(
                &ctx.device,
                ctx.intermediate_format,
                output_format,
                config,
                ctx.viewport().size(),
            ),
        }
    }
}

impl Pass for BloomPass {
    fn label(&self) -> &str {
        "Bloom Pass"
    }

    fn resize(&mut self, device: &wgpu::Device, viewport: Viewport) {
        self.bloom.resize(device, viewport.size());
    }

    fn bind_input(&mut self, device: &wgpu::Device, input: &Texture) {
        self.bloom.bind_input(device, input);
    }

    fn target_sizes(&self) -> Vec<[u32; 2]> {
        self.bloom.target_sizes()
    }

    fn render(&self, _ctx: &Context, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        self.bloom.render(encoder, output);
    }
}

/// The ordered pass chain with its ping-pong buffers.
pub struct Composer {
    passes: Vec<Box<dyn Pass>>,
    routes: Vec<PassRoute>,
    buffers: [Texture; 2],
    format: wgpu::TextureFormat,
}

impl Composer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, viewport: Viewport, passes: Vec<Box<dyn Pass>>) -> Self {
        let routes = route_passes(passes.len());
        log::debug!(
            "Composer chain: {}",
            passes.iter().map(|p| p.label()).collect::<Vec<_>>().join(" -> ")
        );
        let mut composer = Self {
            passes,
            routes,
            buffers: create_buffers(device, format, viewport),
            format,
        };
        composer.bind_inputs(device);
        composer
    }

    /// Scene pass followed by bloom, each built for the format its route writes.
    pub fn globe_chain(ctx: &Context, scene: &Scene, options: &GlobeOptions) -> Self {
        let routes = route_passes(2);
        let format_for = |route: &PassRoute| match route.output {
            PassOutput::Primary => ctx.config.format,
            PassOutput::Buffer(_) => ctx.intermediate_format,
        };
        let passes: Vec<Box<dyn Pass>> = vec![
            Box::new(ScenePass::new(ctx, scene, format_for(&routes[0]))),
            Box::new(BloomPass::new(ctx, options.bloom, format_for(&routes[1]))),
        ];
        Self::new(&ctx.device, ctx.intermediate_format, ctx.viewport(), passes)
    }

    pub fn resize(&mut self, device: &wgpu::Device, viewport: Viewport) {
        self.buffers = create_buffers(device, self.format, viewport);
        for pass in &mut self.passes {
            pass.resize(device, viewport);
        }
        self.bind_inputs(device);
    }

    fn bind_inputs(&mut self, device: &wgpu::Device) {
        for (pass, route) in self.passes.iter_mut().zip(&self.routes) {
            if let Some(slot) = route.input {
                pass.bind_input(device, &self.buffers[slot.index()]);
            }
        }
    }

    pub fn buffer_sizes(&self) -> [[u32; 2]; 2] {
        [self.buffers[0].size(), self.buffers[1].size()]
    }

    pub fn pass_target_sizes(&self) -> Vec<Vec<[u32; 2]>> {
        self.passes.iter().map(|pass| pass.target_sizes()).collect()
    }

    pub fn prepare(&mut self, ctx: &Context, scene: &Scene, frame: &FrameInfo) {
        for pass in &mut self.passes {
            pass.prepare(ctx, scene, frame);
        }
    }

    /// Run every pass in order, the last one writing to `primary`.
    pub fn render(&self, ctx: &Context, encoder: &mut wgpu::CommandEncoder, primary: &wgpu::TextureView) {
        for (pass, route) in self.passes.iter().zip(&self.routes) {
            let output = match route.output {
                PassOutput::Buffer(slot) => &self.buffers[slot.index()].view,
                PassOutput::Primary => primary,
            };
            pass.render(ctx, encoder, output);
        }
    }
}

fn create_buffers(device: &wgpu::Device, format: wgpu::TextureFormat, viewport: Viewport) -> [Texture; 2] {
    [
        Texture::create_render_target(device, viewport.size(), format, "composer_buffer_a"),
        Texture::create_render_target(device, viewport.size(), format, "composer_buffer_b"),
    ]
}

/// The overlay target. The primary target is the surface texture of each frame,
/// which always has the surface's size.
pub struct RenderTargets {
    pub viewport: Viewport,
    pub overlay: Texture,
    format: wgpu::TextureFormat,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, viewport: Viewport) -> Self {
        Self {
            viewport,
            overlay: Texture::create_render_target(device, viewport.size(), format, "overlay_target"),
            format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, viewport: Viewport) {
        *self = Self::new(device, self.format, viewport);
    }
}

/// Projects marker indicators and draws them above the composited image.
pub struct OverlayRenderer {
    pipeline: OverlayPipeline,
    pub targets: RenderTargets,
}

impl OverlayRenderer {
    pub fn new(ctx: &Context, scene: &Scene) -> Self {
        let viewport = ctx.viewport();
        let mut pipeline = OverlayPipeline::new(
            &ctx.device,
            ctx.intermediate_format,
            ctx.config.format,
            viewport.size(),
            scene.globe.markers.len(),
        );
        let targets = RenderTargets::new(&ctx.device, ctx.intermediate_format, viewport);
        pipeline.bind_overlay(&ctx.device, &targets.overlay);
        Self { pipeline, targets }
    }

    pub fn resize(&mut self, ctx: &Context, viewport: Viewport) {
        self.targets.resize(&ctx.device, viewport);
        self.pipeline.bind_overlay(&ctx.device, &self.targets.overlay);
        self.pipeline.resize(&ctx.queue, viewport.size());
    }

    pub fn prepare(&mut self, ctx: &Context, scene: &Scene, frame: &FrameInfo) {
        let instances = overlay::marker_instances(
            &scene.globe,
            &frame.transform,
            ctx.camera.view_proj(),
            ctx.window().scale_factor() as f32,
        );
        self.pipeline.prepare(&ctx.device, &ctx.queue, &instances);
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, primary: &wgpu::TextureView) {
        self.pipeline.draw_markers(encoder, &self.targets.overlay.view);
        self.pipeline.composite(encoder, primary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_is_never_empty() {
        assert_eq!(Viewport::new(0, 0).size(), [1, 1]);
    }

    #[test]
    fn slots_alternate() {
        assert_eq!(Slot::A.other(), Slot::B);
        assert_eq!(Slot::B.other(), Slot::A);
    }
}
