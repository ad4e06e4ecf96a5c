//! The distortion material: primary shader pipeline, uniforms and the image.

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::{
    aspect::Resolution,
    data_structures::texture::Texture,
    pipelines::material::{material_bind_group_layout, mk_material_pipeline},
};

/// Uniform block shared by both stages of the material shaders (group 1, binding 0).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub model: [[f32; 4]; 4],
    pub resolution: [f32; 4],
    pub time: f32,
    pub progress: f32,
    // Uniform buffers are sized in multiples of 16 bytes
    pub _padding: [f32; 2],
}

impl MaterialUniform {
    /// `time = 0`, zero resolution (set by the first resize), identity model.
    pub fn new(progress: f32) -> Self {
        Self {
            model: Matrix4::identity().into(),
            resolution: [0.0; 4],
            time: 0.0,
            progress,
            _padding: [0.0; 2],
        }
    }
}

/// Shader material with a CPU copy of its uniforms and a dirty flag.
///
/// Setters only touch the CPU copy. Changes reach the GPU on the next
/// [`flush`](Self::flush) after [`mark_dirty`](Self::mark_dirty).
#[derive(Debug)]
pub struct Material {
    pub pipeline: wgpu::RenderPipeline,
    pub uniform: MaterialUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub texture: Texture,
    needs_update: bool,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        camera_layout: &wgpu::BindGroupLayout,
        texture: Texture,
        color_format: wgpu::TextureFormat,
        sample_count: u32,
        progress: f32,
    ) -> Self {
        let uniform = MaterialUniform::new(progress);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = material_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
            label: Some("material_bind_group"),
        });

        let pipeline =
            mk_material_pipeline(device, camera_layout, &layout, color_format, sample_count);

        Self {
            pipeline,
            uniform,
            buffer,
            bind_group,
            texture,
            needs_update: false,
        }
    }

    pub fn set_time(&mut self, time: f32) {
        self.uniform.time = time;
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.uniform.resolution = resolution.to_array();
    }

    pub fn set_progress(&mut self, progress: f32) {
        self.uniform.progress = progress;
    }

    pub fn set_model(&mut self, model: Matrix4<f32>) {
        self.uniform.model = model.into();
    }

    pub fn mark_dirty(&mut self) {
        self.needs_update = true;
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Uploads the uniforms if they changed. Returns whether a write happened.
    pub fn flush(&mut self, queue: &wgpu::Queue) -> bool {
        if !self.needs_update {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        self.needs_update = false;
        true
    }

    pub fn dispose(&self) {
        self.buffer.destroy();
        self.texture.destroy();
    }
}
