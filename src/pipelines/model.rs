use wgpu::util::DeviceExt;

use crate::data_structures::transform::{Transform, TransformRaw};

/// The globe's model transform as a uniform. Every globe child (sphere, dots,
/// arcs, atmosphere) binds the same buffer so they move together.
#[derive(Debug)]
pub struct ModelResources {
    pub raw: TransformRaw,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl ModelResources {
    pub fn new(device: &wgpu::Device, transform: &Transform) -> Self {
        let raw = transform.to_raw();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Buffer"),
            contents: bytemuck::cast_slice(&[raw]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = super::uniform_layout(device, "model_bind_group_layout");
        let bind_group = super::uniform_bind_group(device, &bind_group_layout, &buffer, "model_bind_group");
        Self {
            raw,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, transform: &Transform) {
        let raw = transform.to_raw();
        if raw != self.raw {
            self.raw = raw;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[raw]));
        }
    }
}
