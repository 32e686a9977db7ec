use wgpu::util::DeviceExt;

use crate::scene::{LightUniform, Scene};

/// Ambient and directional light, shared by every lit pipeline.
#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, scene: &Scene) -> Self {
        let uniform = scene.light_uniform();
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = super::uniform_layout(device, "light_bind_group_layout");
        let bind_group = super::uniform_bind_group(device, &bind_group_layout, &buffer, "light_bind_group");
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Upload the lights of `scene` if they changed.
    pub fn write(&mut self, queue: &wgpu::Queue, scene: &Scene) {
        let uniform = scene.light_uniform();
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}
