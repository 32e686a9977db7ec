//! Screen-space marker indicators.
//!
//! Markers are projected on the CPU each frame, drawn as instanced circles into
//! the transparent overlay target, and the overlay target is then blended over
//! the primary surface.

use cgmath::{Matrix4, Vector3, Vector4};

use crate::{
    camera,
    data_structures::{
        globe::GlobeObject,
        mesh::Vertex,
        texture::{self, Texture},
        transform::Transform,
    },
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MarkerInstance {
    /// Normalised device coordinates of the anchor.
    pub centre: [f32; 2],
    pub size_px: f32,
    pub radius_px: f32,
    pub colour: [f32; 4],
}

impl Vertex for MarkerInstance {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MarkerInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct OverlayUniform {
    viewport: [f32; 2],
    _padding: [f32; 2],
}

/// Whether a projected point lies between the near and far planes.
pub fn in_clip_volume(ndc: Vector3<f32>) -> bool {
    ndc.z.is_finite() && (0.0..=1.0).contains(&ndc.z)
}

/// Project every visible marker of `globe` for this frame.
///
/// Marker sizes are logical pixels; `scale_factor` converts them to the
/// physical pixels of the viewport.
pub fn marker_instances(
    globe: &GlobeObject,
    transform: &Transform,
    view_proj: Matrix4<f32>,
    scale_factor: f32,
) -> Vec<MarkerInstance> {
    let model = transform.to_matrix();
    globe
        .visible_markers(transform.rotation)
        .filter_map(|marker| {
            let anchor = marker.anchor();
            let world = model * Vector4::new(anchor.x, anchor.y, anchor.z, 1.0);
            let ndc = camera::project(view_proj, world.truncate());
            in_clip_volume(ndc).then(|| MarkerInstance {
                centre: [ndc.x, ndc.y],
                size_px: marker.size_px * scale_factor,
                radius_px: marker.radius_px * scale_factor,
                colour: marker.colour.to_linear(),
            })
        })
        .collect()
}

pub struct OverlayPipeline {
    marker_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    /// Samples the current overlay target.
    overlay_source: Option<wgpu::BindGroup>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    instance_count: u32,
}

impl OverlayPipeline {
    pub fn new(
        device: &wgpu::Device,
        overlay_format: wgpu::TextureFormat,
        target_format: wgpu::TextureFormat,
        viewport: [u32; 2],
        capacity: usize,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let uniform_layout = super::uniform_layout(device, "overlay_bind_group_layout");
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Uniform Buffer"),
            contents: bytemuck::cast_slice(&[overlay_uniform(viewport)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group =
            super::uniform_bind_group(device, &uniform_layout, &uniform_buffer, "overlay_bind_group");

        let marker_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Marker Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            immediate_size: 0,
        });
        let marker_pipeline = super::mk_render_pipeline(
            device,
            &marker_layout,
            wgpu::ShaderModuleDescriptor {
                label: Some("Marker Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("overlay.wgsl").into()),
            },
            super::PipelineOptions {
                label: "Marker Pipeline",
                color_format: overlay_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth: None,
                cull_mode: None,
                vertex_layouts: &[MarkerInstance::desc()],
            },
        );

        let texture_layout = texture::sampled_texture_layout(device, "overlay_texture_layout");
        let blit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Blit Layout"),
            bind_group_layouts: &[&texture_layout],
            immediate_size: 0,
        });
        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("blit.wgsl").into()),
        });
        // Marker colours are already multiplied by their alpha in the overlay target.
        let blit_pipeline = super::mk_fullscreen_pipeline(
            device,
            &blit_shader,
            &blit_layout,
            "fs_blit",
            target_format,
            Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            "overlay-blit",
        );

        let capacity = capacity.max(1);
        Self {
            marker_pipeline,
            blit_pipeline,
            texture_layout,
            overlay_source: None,
            uniform_buffer,
            uniform_bind_group,
            instance_buffer: create_instance_buffer(device, capacity),
            capacity,
            instance_count: 0,
        }
    }

    pub fn resize(&self, queue: &wgpu::Queue, viewport: [u32; 2]) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[overlay_uniform(viewport)]));
    }

    /// Upload this frame's instances, growing the buffer when needed.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &[MarkerInstance]) {
        if instances.len() > self.capacity {
            self.capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, self.capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
        self.instance_count = instances.len() as u32;
    }

    /// Clear `overlay` and draw the prepared markers into it.
    pub fn draw_markers(&self, encoder: &mut wgpu::CommandEncoder, overlay: &wgpu::TextureView) {
        let mut pass = super::begin_color_pass(
            encoder,
            overlay,
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            "Overlay Markers Pass",
        );
        if self.instance_count == 0 {
            return;
        }
        pass.set_pipeline(&self.marker_pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        pass.draw(0..6, 0..self.instance_count);
    }

    /// Sample `overlay` when compositing. Call again whenever the target is recreated.
    pub fn bind_overlay(&mut self, device: &wgpu::Device, overlay: &Texture) {
        self.overlay_source = match overlay.sampler.as_ref() {
            Some(sampler) => Some(texture::sampled_texture_bind_group(
                device,
                &self.texture_layout,
                &overlay.view,
                sampler,
                "overlay_source",
            )),
            None => {
                log::warn!("Overlay target has no sampler");
                None
            }
        };
    }

    /// Blend the bound overlay target over `target`, keeping what is already there.
    pub fn composite(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let Some(bind_group) = self.overlay_source.as_ref() else {
            log::warn!("No overlay target bound, skipping composite");
            return;
        };
        let mut pass = super::begin_color_pass(encoder, target, wgpu::LoadOp::Load, "Overlay Composite Pass");
        pass.set_pipeline(&self.blit_pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn overlay_uniform(viewport: [u32; 2]) -> OverlayUniform {
    OverlayUniform {
        viewport: [viewport[0].max(1) as f32, viewport[1].max(1) as f32],
        _padding: [0.0; 2],
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Marker Instance Buffer"),
        size: (capacity * std::mem::size_of::<MarkerInstance>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        camera::{Camera, Projection},
        data_structures::{colour::Colour, globe::MarkerElement},
        decorator::GlobeStyle,
    };
    use cgmath::{EuclideanSpace, Point3};

    fn marker(lat: f32, lng: f32) -> MarkerElement {
        MarkerElement {
            lat,
            lng,
            size_px: 10.0,
            radius_px: 4.0,
            colour: Colour::WHITE,
        }
    }

    #[test]
    fn instance_layout_matches_struct() {
        assert_eq!(MarkerInstance::desc().array_stride as usize, std::mem::size_of::<MarkerInstance>());
        assert_eq!(std::mem::size_of::<MarkerInstance>(), 32);
    }

    #[test]
    fn only_front_markers_are_projected() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 300.0), Point3::origin());
        let projection = Projection::new(800, 600, cgmath::Deg(50.0), 0.1, 2000.0);
        let view_proj = projection.calc_matrix() * camera.calc_matrix();

        let mut globe = GlobeObject::new(GlobeStyle::default());
        globe.markers = vec![marker(0.0, 0.0), marker(0.0, 180.0)];
        globe.set_point_of_view(camera.position, globe.position);

        let instances = marker_instances(&globe, &Transform::default(), view_proj, 1.0);
        assert_eq!(instances.len(), 1);
        assert!(instances[0].centre[0].abs() < 1e-4);
        assert!(instances[0].centre[1].abs() < 1e-4);
    }

    #[test]
    fn marker_sizes_follow_the_scale_factor() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 300.0), Point3::origin());
        let projection = Projection::new(1600, 1200, cgmath::Deg(50.0), 0.1, 2000.0);
        let view_proj = projection.calc_matrix() * camera.calc_matrix();

        let mut globe = GlobeObject::new(GlobeStyle::default());
        globe.markers = vec![marker(0.0, 0.0)];
        globe.set_point_of_view(camera.position, globe.position);

        let standard = marker_instances(&globe, &Transform::default(), view_proj, 1.0);
        let hidpi = marker_instances(&globe, &Transform::default(), view_proj, 2.0);
        assert_eq!(standard[0].size_px, 10.0);
        assert_eq!(standard[0].radius_px, 4.0);
        assert_eq!(hidpi[0].size_px, 20.0);
        assert_eq!(hidpi[0].radius_px, 8.0);
        assert_eq!(hidpi[0].centre, standard[0].centre);
    }

    #[test]
    fn points_behind_the_camera_are_clipped() {
        assert!(in_clip_volume(Vector3::new(0.0, 0.0, 0.5)));
        assert!(!in_clip_volume(Vector3::new(0.0, 0.0, 1.5)));
        assert!(!in_clip_volume(Vector3::new(0.0, 0.0, f32::INFINITY)));
    }
}
