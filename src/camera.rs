//! Fixed orthographic camera.
//!
//! The view volume is a unit square centred on the origin, so the unit plane
//! built by [`crate::data_structures::geometry::PlaneGeometry`] exactly fills
//! the viewport whatever its aspect ratio.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector2, Vector3};
use wgpu::util::DeviceExt;

use crate::pick::Ray;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Debug)]
pub struct OrthographicCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl OrthographicCamera {
    pub const HALF_EXTENT: f32 = 0.5;
    pub const NEAR: f32 = 0.1;
    pub const FAR: f32 = 1000.0;
    pub const DISTANCE: f32 = 3.0;

    /// Camera at `(0, 0, 3)` looking at the origin with a unit view volume.
    pub fn new() -> Self {
        Self {
            left: -Self::HALF_EXTENT,
            right: Self::HALF_EXTENT,
            top: Self::HALF_EXTENT,
            bottom: -Self::HALF_EXTENT,
            near: Self::NEAR,
            far: Self::FAR,
            position: Point3::new(0.0, 0.0, Self::DISTANCE),
            target: Point3::origin(),
            up: Vector3::unit_y(),
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
            * cgmath::ortho(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Casts a ray through a point given in normalized device coordinates.
    ///
    /// For an orthographic projection every ray is parallel to the view
    /// direction; only the origin on the near plane moves with the pointer.
    pub fn ray_through(&self, ndc: Vector2<f32>) -> Ray {
        let forward = (self.target - self.position).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);

        let view_x = self.left + (ndc.x + 1.0) * 0.5 * (self.right - self.left);
        let view_y = self.bottom + (ndc.y + 1.0) * 0.5 * (self.top - self.bottom);

        let origin = self.position + right * view_x + up * view_y + forward * self.near;
        Ray::new(origin, forward)
    }
}

impl Default for OrthographicCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(camera: &OrthographicCamera) -> Self {
        Self {
            view_proj: camera.view_proj().into(),
        }
    }
}

/// GPU side of the camera: uniform buffer plus the group 0 bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: OrthographicCamera,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: OrthographicCamera) -> Self {
        let uniform = CameraUniform::new(&camera);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn dispose(&self) {
        self.buffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Transform, Vector4};

    use super::*;

    fn clip(camera: &OrthographicCamera, p: Point3<f32>) -> Vector4<f32> {
        camera.view_proj() * p.to_homogeneous()
    }

    #[test]
    fn unit_plane_corners_hit_clip_space_corners() {
        let camera = OrthographicCamera::new();
        let c = clip(&camera, Point3::new(0.5, 0.5, 0.0));
        assert!((c.x - 1.0).abs() < 1e-5 && (c.y - 1.0).abs() < 1e-5, "{c:?}");
        let c = clip(&camera, Point3::new(-0.5, -0.5, 0.0));
        assert!((c.x + 1.0).abs() < 1e-5 && (c.y + 1.0).abs() < 1e-5, "{c:?}");
    }

    #[test]
    fn origin_depth_is_inside_wgpu_range() {
        let camera = OrthographicCamera::new();
        let c = clip(&camera, Point3::origin());
        assert!(c.z > 0.0 && c.z < 1.0, "depth {}", c.z);
    }

    #[test]
    fn centre_ray_points_at_origin() {
        let camera = OrthographicCamera::new();
        let ray = camera.ray_through(Vector2::new(0.0, 0.0));
        assert!((ray.origin.x).abs() < 1e-6 && (ray.origin.y).abs() < 1e-6);
        assert!((ray.origin.z - 2.9).abs() < 1e-5);
        assert!((ray.direction - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-6);
    }

    #[test]
    fn corner_ray_starts_at_view_volume_edge() {
        let camera = OrthographicCamera::new();
        let ray = camera.ray_through(Vector2::new(1.0, -1.0));
        assert!((ray.origin.x - 0.5).abs() < 1e-6, "{:?}", ray.origin);
        assert!((ray.origin.y + 0.5).abs() < 1e-6, "{:?}", ray.origin);
        let projected = camera.view_proj().transform_point(ray.origin);
        assert!((projected.x - 1.0).abs() < 1e-5 && (projected.y + 1.0).abs() < 1e-5);
    }
}
