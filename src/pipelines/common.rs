/// Builds a colour-only render pipeline from separate vertex and fragment modules.
///
/// Both modules use `vs_main` / `fs_main` as entry points. No depth buffer:
/// the engine draws a single plane, ordering is by draw order.
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    sample_count: u32,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    vertex_shader: wgpu::ShaderModuleDescriptor,
    fragment_shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let vertex_shader = device.create_shader_module(vertex_shader);
    let fragment_shader = device.create_shader_module(fragment_shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &vertex_shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &fragment_shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // The plane stays visible if a transform flips it
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
