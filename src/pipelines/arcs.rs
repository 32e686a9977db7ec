//! Dashed arc tubes that grow from the surface and animate their dashes.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        globe::GlobeObject,
        mesh::{ArcVertex, DrawMesh, Mesh, Vertex},
        texture,
    },
    resources::mesh,
};

use super::{DepthOptions, PipelineOptions};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ArcParams {
    pub dash_length: f32,
    pub dash_gap: f32,
    pub dash_translate: f32,
    pub transition: f32,
    // Uniforms are laid out in 16 byte rows.
    pub _padding: [f32; 4],
}

/// Dash offset at `elapsed_ms`, folded back by whole dash periods once every
/// initial gap has been covered so the value stays small in `f32`.
pub fn dash_translate(elapsed_ms: f64, animate_ms: f32, period: f32, max_initial_gap: f32) -> f32 {
    if animate_ms <= 0.0 {
        return 0.0;
    }
    let translate = elapsed_ms / animate_ms as f64;
    // The largest relative distance along an arc is one.
    let settled = max_initial_gap as f64 + 1.0;
    if period <= 0.0 || translate <= settled {
        return translate as f32;
    }
    (settled + (translate - settled).rem_euclid(period as f64)) as f32
}

pub struct ArcsPipeline {
    pub render_pipeline: wgpu::RenderPipeline,
    pub mesh: Option<Mesh>,
    pub params: ArcParams,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    max_initial_gap: f32,
}

impl ArcsPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        model_layout: &wgpu::BindGroupLayout,
        globe: &GlobeObject,
    ) -> Self {
        let style = &globe.style.arcs;
        let params = ArcParams {
            dash_length: style.dash_length,
            dash_gap: style.dash_gap,
            dash_translate: 0.0,
            transition: 0.0,
            _padding: [0.0; 4],
        };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Arc Params Buffer"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let params_layout = super::uniform_layout(device, "arc_params_bind_group_layout");
        let bind_group = super::uniform_bind_group(device, &params_layout, &buffer, "arc_params_bind_group");

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Arcs Pipeline Layout"),
            bind_group_layouts: &[camera_layout, model_layout, &params_layout],
            immediate_size: 0,
        });
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Arcs Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("arcs.wgsl").into()),
        };
        let render_pipeline = super::mk_render_pipeline(
            device,
            &layout,
            shader,
            PipelineOptions {
                label: "Arcs Pipeline",
                color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth: Some(DepthOptions::opaque(texture::Texture::DEPTH_FORMAT)),
                // Thin tubes are seen from inside near the camera.
                cull_mode: None,
                vertex_layouts: &[ArcVertex::desc()],
            },
        );

        let data = mesh::arcs(&globe.arcs, style.curve_segments, style.radial_segments);
        let mesh = if data.is_empty() {
            None
        } else {
            Mesh::new(device, "Arcs", &data)
        };
        let max_initial_gap = globe
            .arcs
            .iter()
            .map(|a| a.dash_initial_gap)
            .fold(0.0f32, f32::max);

        Self {
            render_pipeline,
            mesh,
            params,
            buffer,
            bind_group,
            max_initial_gap,
        }
    }

    /// Advance dashes and the grow-in transition to `elapsed_ms`.
    pub fn update(&mut self, queue: &wgpu::Queue, globe: &GlobeObject, elapsed_ms: f64) {
        let style = &globe.style.arcs;
        let transition = globe
            .arcs
            .first()
            .map_or(1.0, |arc| arc.transition_progress(elapsed_ms as f32));
        self.params.transition = transition;
        self.params.dash_translate = dash_translate(
            elapsed_ms,
            style.dash_animate_ms,
            style.dash_length + style.dash_gap,
            self.max_initial_gap,
        );
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.params]));
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, camera: &wgpu::BindGroup, model: &wgpu::BindGroup) {
        let Some(mesh) = &self.mesh else {
            return;
        };
        pass.set_pipeline(&self.render_pipeline);
        pass.set_bind_group(0, camera, &[]);
        pass.set_bind_group(1, model, &[]);
        pass.set_bind_group(2, &self.bind_group, &[]);
        pass.draw_mesh(mesh);
    }
}
