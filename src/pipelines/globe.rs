//! Lit layers of the globe: the sphere, the hex land dots and the points.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        colour::Colour,
        globe::{GlobeMaterial, GlobeObject, PointDescriptor},
        mesh::{DrawMesh, LitVertex, Mesh, Vertex},
        texture,
    },
    geo::GLOBE_RADIUS,
    resources::mesh,
};

use super::{DepthOptions, PipelineOptions};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub colour: [f32; 4],
    /// Emissive colour premultiplied by its intensity.
    pub emissive: [f32; 4],
}

impl MaterialUniform {
    pub fn lambert(colour: Colour) -> Self {
        Self {
            colour: colour.to_linear(),
            emissive: [0.0; 4],
        }
    }

    pub fn from_material(material: &GlobeMaterial) -> Self {
        let e = material.emissive.to_linear();
        let k = material.emissive_intensity;
        Self {
            colour: material.colour.to_linear(),
            emissive: [e[0] * k, e[1] * k, e[2] * k, 0.0],
        }
    }
}

/// A mesh drawn with one material.
#[derive(Debug)]
pub struct GlobeLayer {
    pub mesh: Mesh,
    pub material: MaterialUniform,
    #[allow(unused)]
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GlobeLayer {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        mesh: Mesh,
        material: MaterialUniform,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&[material]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = super::uniform_bind_group(device, layout, &buffer, "material_bind_group");
        Self {
            mesh,
            material,
            buffer,
            bind_group,
        }
    }
}

pub struct GlobePipeline {
    pub render_pipeline: wgpu::RenderPipeline,
    pub layers: Vec<GlobeLayer>,
}

impl GlobePipeline {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        model_layout: &wgpu::BindGroupLayout,
        light_layout: &wgpu::BindGroupLayout,
        globe: &GlobeObject,
    ) -> Self {
        let material_layout = super::uniform_layout(device, "material_bind_group_layout");
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Globe Pipeline Layout"),
            bind_group_layouts: &[camera_layout, model_layout, light_layout, &material_layout],
            immediate_size: 0,
        });
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Globe Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("globe.wgsl").into()),
        };
        let render_pipeline = super::mk_render_pipeline(
            device,
            &layout,
            shader,
            PipelineOptions {
                label: "Globe Pipeline",
                color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                depth: Some(DepthOptions::opaque(texture::Texture::DEPTH_FORMAT)),
                cull_mode: Some(wgpu::Face::Back),
                vertex_layouts: &[LitVertex::desc()],
            },
        );

        let style = &globe.style;
        let mut layers = Vec::new();
        let sphere = mesh::sphere(GLOBE_RADIUS, mesh::SPHERE_SEGMENTS);
        if let Some(m) = Mesh::new(device, "Globe Sphere", &sphere) {
            layers.push(GlobeLayer::new(
                device,
                &material_layout,
                m,
                MaterialUniform::from_material(&globe.material),
            ));
        }
        if !globe.hex_cells.is_empty() {
            let hexes = mesh::hex_layer(&globe.hex_cells, style.hex_polygons.altitude);
            if let Some(m) = Mesh::new(device, "Hex Polygons", &hexes) {
                layers.push(GlobeLayer::new(
                    device,
                    &material_layout,
                    m,
                    MaterialUniform::lambert(style.hex_polygons.colour),
                ));
            }
        }
        for (colour, group) in group_by_colour(&globe.points) {
            let data = mesh::points(&group, style.points.radial_segments);
            if let Some(m) = Mesh::new(device, "Points", &data) {
                layers.push(GlobeLayer::new(device, &material_layout, m, MaterialUniform::lambert(colour)));
            }
        }
        log::debug!("Globe pipeline with {} layers", layers.len());

        Self {
            render_pipeline,
            layers,
        }
    }

    /// Draw every layer. Camera, model and light are bound at groups 0, 1 and 2.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        camera: &wgpu::BindGroup,
        model: &wgpu::BindGroup,
        light: &wgpu::BindGroup,
    ) {
        pass.set_pipeline(&self.render_pipeline);
        pass.set_bind_group(0, camera, &[]);
        pass.set_bind_group(1, model, &[]);
        pass.set_bind_group(2, light, &[]);
        for layer in &self.layers {
            pass.set_bind_group(3, &layer.bind_group, &[]);
            pass.draw_mesh(&layer.mesh);
        }
    }
}

/// Points bucketed by colour so each bucket draws with a single material.
fn group_by_colour(points: &[PointDescriptor]) -> Vec<(Colour, Vec<PointDescriptor>)> {
    let mut groups: Vec<(Colour, Vec<PointDescriptor>)> = Vec::new();
    for point in points {
        match groups.iter_mut().find(|(c, _)| *c == point.colour) {
            Some((_, group)) => group.push(*point),
            None => groups.push((point.colour, vec![*point])),
        }
    }
    groups
}
