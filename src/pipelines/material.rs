use crate::{
    data_structures::{geometry::Vertex, texture::texture_layout_entries},
    pipelines::common::mk_render_pipeline,
};

/// Group 1: material uniforms (0), image texture (1) and its sampler (2).
pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let [texture, sampler] = texture_layout_entries(1, wgpu::ShaderStages::FRAGMENT);
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture,
            sampler,
        ],
        label: Some("material_bind_group_layout"),
    })
}

pub fn mk_material_pipeline(
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Material Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout, material_bind_group_layout],
        push_constant_ranges: &[],
    });

    let vertex = wgpu::ShaderModuleDescriptor {
        label: Some("Material Vertex Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("material.vert.wgsl").into()),
    };
    let fragment = wgpu::ShaderModuleDescriptor {
        label: Some("Material Fragment Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("material.frag.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        "Material Pipeline",
        &layout,
        color_format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        sample_count,
        &[Vertex::desc()],
        vertex,
        fragment,
    )
}
