//! Vertex layouts and GPU meshes for the globe layers.

use wgpu::util::DeviceExt;

/// Anything that can be stored in a vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Position + normal, used by the sphere, hex dots and points.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LitVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for LitVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<LitVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// A vertex of an arc tube.
///
/// The tube is stored twice: once flattened onto the ground (`ground`) and once
/// at full altitude (`lifted`). The arc shader blends the two by the transition
/// progress, so the arcs grow out of the surface without re-uploading geometry.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ArcVertex {
    pub ground: [f32; 3],
    pub lifted: [f32; 3],
    pub colour: [f32; 4],
    /// Distance along the arc in `[0, 1]`, reversed so dashes travel start to end.
    pub rel_distance: f32,
    pub initial_gap: f32,
}

impl Vertex for ArcVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ArcVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 10]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

/// CPU-side triangle list.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
}

impl<V> Default for MeshData<V> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl<V> MeshData<V> {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append another mesh, rebasing its indices.
    pub fn extend(&mut self, other: MeshData<V>) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }
}

/// Vertex and index buffers ready to draw.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl Mesh {
    /// Upload `data`. Empty meshes are not uploaded since zero-sized buffers cannot be bound.
    pub fn new<V: bytemuck::Pod>(device: &wgpu::Device, name: &str, data: &MeshData<V>) -> Option<Self> {
        if data.is_empty() {
            log::warn!("Mesh {name} is empty and will not be drawn");
            return None;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Vertex Buffer")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Index Buffer")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some(Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: data.indices.len() as u32,
        })
    }
}

pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &Mesh);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arc_vertex_layout_matches_struct() {
        let desc = ArcVertex::desc();
        assert_eq!(desc.array_stride as usize, std::mem::size_of::<ArcVertex>());
        assert_eq!(std::mem::size_of::<ArcVertex>(), 12 * 4);
    }

    #[test]
    fn extend_rebases_indices() {
        let mut a = MeshData {
            vertices: vec![0u32, 1, 2],
            indices: vec![0, 1, 2],
        };
        a.extend(MeshData {
            vertices: vec![3, 4, 5],
            indices: vec![0, 2, 1],
        });
        assert_eq!(a.indices, vec![0, 1, 2, 3, 5, 4]);
    }
}
