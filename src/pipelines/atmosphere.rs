//! Fresnel glow drawn on the back faces of a shell around the globe.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        globe::AtmosphereDescriptor,
        mesh::{DrawMesh, LitVertex, Mesh, Vertex},
        texture,
    },
    geo::GLOBE_RADIUS,
    resources::mesh,
};

use super::{DepthOptions, PipelineOptions};

pub const GLOW_COEFFICIENT: f32 = 0.1;
pub const GLOW_POWER: f32 = 3.5;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AtmosphereUniform {
    pub colour: [f32; 4],
    pub coefficient: f32,
    pub power: f32,
    pub _padding: [f32; 2],
}

impl AtmosphereUniform {
    pub fn new(atmosphere: &AtmosphereDescriptor) -> Self {
        Self {
            colour: atmosphere.colour.to_linear(),
            coefficient: GLOW_COEFFICIENT,
            power: GLOW_POWER,
            _padding: [0.0; 2],
        }
    }
}

/// Glow intensity for a surface normal `normal` seen along `view_dir`, both unit length.
pub fn glow_intensity(normal: cgmath::Vector3<f32>, view_dir: cgmath::Vector3<f32>) -> f32 {
    use cgmath::InnerSpace;
    (GLOW_COEFFICIENT + normal.dot(view_dir)).max(0.0).powf(GLOW_POWER).min(1.0)
}

pub struct AtmospherePipeline {
    pub render_pipeline: wgpu::RenderPipeline,
    pub mesh: Mesh,
    #[allow(unused)]
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl AtmospherePipeline {
    /// `None` when the globe has no atmosphere.
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        model_layout: &wgpu::BindGroupLayout,
        atmosphere: Option<&AtmosphereDescriptor>,
    ) -> Option<Self> {
        let atmosphere = atmosphere?;
        let data = mesh::sphere(GLOBE_RADIUS * (1.0 + atmosphere.altitude), mesh::SPHERE_SEGMENTS);
        let mesh = Mesh::new(device, "Atmosphere", &data)?;

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Atmosphere Buffer"),
            contents: bytemuck::cast_slice(&[AtmosphereUniform::new(atmosphere)]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let glow_layout = super::uniform_layout(device, "atmosphere_bind_group_layout");
        let bind_group = super::uniform_bind_group(device, &glow_layout, &buffer, "atmosphere_bind_group");

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Atmosphere Pipeline Layout"),
            bind_group_layouts: &[camera_layout, model_layout, &glow_layout],
            immediate_size: 0,
        });
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Atmosphere Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("atmosphere.wgsl").into()),
        };
        let render_pipeline = super::mk_render_pipeline(
            device,
            &layout,
            shader,
            PipelineOptions {
                label: "Atmosphere Pipeline",
                color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth: Some(DepthOptions::translucent(texture::Texture::DEPTH_FORMAT)),
                cull_mode: Some(wgpu::Face::Front),
                vertex_layouts: &[LitVertex::desc()],
            },
        );

        Some(Self {
            render_pipeline,
            mesh,
            buffer,
            bind_group,
        })
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, camera: &wgpu::BindGroup, model: &wgpu::BindGroup) {
        pass.set_pipeline(&self.render_pipeline);
        pass.set_bind_group(0, camera, &[]);
        pass.set_bind_group(1, model, &[]);
        pass.set_bind_group(2, &self.bind_group, &[]);
        pass.draw_mesh(&self.mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    #[test]
    fn glow_fades_towards_the_shell_edge() {
        let view = Vector3::new(0.0, 0.0, -1.0);
        // Back face straight behind the globe centre.
        let centre = glow_intensity(Vector3::new(0.0, 0.0, -1.0), view);
        // Back face near the limb, almost perpendicular to the view.
        let limb = glow_intensity(Vector3::new(1.0, 0.0, -0.2).normalize(), view);
        assert!((centre - 1.0).abs() < 1e-6);
        assert!(limb < centre);
        assert!(limb > 0.0);
    }

    #[test]
    fn glow_vanishes_facing_the_camera() {
        let view = Vector3::new(0.0, 0.0, -1.0);
        assert_eq!(glow_intensity(Vector3::new(0.0, 0.0, 1.0), view), 0.0);
    }
}
