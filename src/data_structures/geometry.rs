//! Plane geometry.

use cgmath::Point3;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
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
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// A subdivided rectangle in the XY plane, centred on the origin, facing +Z.
///
/// Rows are emitted top to bottom; `uv.y` grows upwards (1 on the top edge),
/// the fragment shader flips it when sampling.
#[derive(Clone, Debug)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl PlaneGeometry {
    /// `width_segments`/`height_segments` below 1 are treated as 1.
    pub fn new(width: f32, height: f32, width_segments: u16, height_segments: u16) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let grid_x1 = grid_x + 1;
        let grid_y1 = grid_y + 1;
        let segment_width = width / f32::from(grid_x);
        let segment_height = height / f32::from(grid_y);
        let half_w = width / 2.0;
        let half_h = height / 2.0;

        let mut vertices = Vec::with_capacity(usize::from(grid_x1) * usize::from(grid_y1));
        for iy in 0..grid_y1 {
            let y = f32::from(iy) * segment_height - half_h;
            for ix in 0..grid_x1 {
                let x = f32::from(ix) * segment_width - half_w;
                vertices.push(Vertex {
                    position: [x, -y, 0.0],
                    uv: [
                        f32::from(ix) / f32::from(grid_x),
                        1.0 - f32::from(iy) / f32::from(grid_y),
                    ],
                });
            }
        }

        let mut indices = Vec::with_capacity(usize::from(grid_x) * usize::from(grid_y) * 6);
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + grid_x1 * iy;
                let b = ix + grid_x1 * (iy + 1);
                let c = (ix + 1) + grid_x1 * (iy + 1);
                let d = (ix + 1) + grid_x1 * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self {
            width,
            height,
            vertices,
            indices,
        }
    }

    /// The 1x1 single-segment plane the engine draws the image on.
    pub fn unit() -> Self {
        Self::new(1.0, 1.0, 1, 1)
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f32>; 3]> + '_ {
        let corner = |i: u16| Point3::from(self.vertices[usize::from(i)].position);
        self.indices
            .chunks_exact(3)
            .map(move |tri| [corner(tri[0]), corner(tri[1]), corner(tri[2])])
    }

    pub fn upload(&self, device: &wgpu::Device, label: &str) -> GpuGeometry {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuGeometry {
            vertex_buffer,
            index_buffer,
            num_indices: self.indices.len() as u32,
        }
    }
}

#[derive(Debug)]
pub struct GpuGeometry {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl GpuGeometry {
    pub fn dispose(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    #[test]
    fn unit_plane_is_a_single_quad() {
        let plane = PlaneGeometry::unit();
        assert_eq!(plane.vertices.len(), 4);
        assert_eq!(plane.indices, vec![0, 2, 1, 2, 3, 1]);
        assert_eq!(plane.vertices[0].position, [-0.5, 0.5, 0.0]);
        assert_eq!(plane.vertices[3].position, [0.5, -0.5, 0.0]);
    }

    #[test]
    fn uvs_span_unit_square_with_v_up() {
        let plane = PlaneGeometry::unit();
        assert_eq!(plane.vertices[0].uv, [0.0, 1.0]);
        assert_eq!(plane.vertices[3].uv, [1.0, 0.0]);
        for vertex in &plane.vertices {
            assert!(vertex.uv.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn subdivided_plane_counts() {
        let plane = PlaneGeometry::new(2.0, 1.0, 4, 3);
        assert_eq!(plane.vertices.len(), 5 * 4);
        assert_eq!(plane.indices.len(), 4 * 3 * 6);
        assert_eq!(plane.triangles().count(), 24);
    }

    #[test]
    fn zero_segments_fall_back_to_one() {
        let plane = PlaneGeometry::new(1.0, 1.0, 0, 0);
        assert_eq!(plane.vertices.len(), 4);
    }

    #[test]
    fn triangles_face_the_camera() {
        for [a, b, c] in PlaneGeometry::unit().triangles() {
            let normal = (b - a).cross(c - a).normalize();
            assert!((normal - Vector3::unit_z()).magnitude() < 1e-6, "{normal:?}");
        }
    }
}
