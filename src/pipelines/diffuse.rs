//! Post-processing pipeline sampling the previous pass as `t_diffuse`.

use crate::{
    data_structures::texture::{Texture, texture_layout_entries},
    pipelines::common::mk_render_pipeline,
};

#[derive(Debug)]
pub struct DiffusePipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl DiffusePipeline {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &texture_layout_entries(0, wgpu::ShaderStages::FRAGMENT),
            label: Some("diffuse_bind_group_layout"),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Diffuse Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex = wgpu::ShaderModuleDescriptor {
            label: Some("Diffuse Vertex Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("diffuse.vert.wgsl").into()),
        };
        let fragment = wgpu::ShaderModuleDescriptor {
            label: Some("Diffuse Fragment Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("diffuse.frag.wgsl").into()),
        };

        let pipeline = mk_render_pipeline(
            device,
            "Diffuse Pipeline",
            &layout,
            color_format,
            Some(wgpu::BlendState::REPLACE),
            1,
            &[],
            vertex,
            fragment,
        );

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    /// Binds `input` as `t_diffuse`. Built once per composer target.
    pub fn bind_input(&self, device: &wgpu::Device, input: &Texture) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&input.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&input.sampler),
                },
            ],
            label: Some("diffuse_bind_group"),
        })
    }
}
