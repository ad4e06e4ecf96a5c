use crate::data_structures::{geometry::GpuGeometry, material::Material};

/// Geometry buffers paired with the material that shades them.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub geometry: GpuGeometry,
    pub material: Material,
}

impl Mesh {
    pub fn new(name: impl Into<String>, geometry: GpuGeometry, material: Material) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
        }
    }

    pub fn dispose(&self) {
        self.geometry.dispose();
        self.material.dispose();
    }
}

pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &Mesh, camera_bind_group: &wgpu::BindGroup);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh, camera_bind_group: &wgpu::BindGroup) {
        self.set_pipeline(&mesh.material.pipeline);
        self.set_bind_group(0, camera_bind_group, &[]);
        self.set_bind_group(1, &mesh.material.bind_group, &[]);
        self.set_vertex_buffer(0, mesh.geometry.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        self.draw_indexed(0..mesh.geometry.num_indices, 0, 0..1);
    }
}
