//! Post-processing composer.
//!
//! A [`Composer`] runs an ordered list of [`Pass`]es. Intermediate results
//! live in two ping-pong render targets: each pass reads the latest result and
//! writes into the other target, the last pass writes straight into the
//! caller's output view (normally the surface texture).
//!
//! The default chain is
//! 1. [`ScenePass`]: clears and draws the scene through the camera (MSAA resolved)
//! 2. [`ShaderPass`]: the diffuse shader with the previous result as `t_diffuse`

use crate::{
    camera::CameraResources,
    data_structures::{mesh::DrawMesh, scene::Scene, texture::Texture},
    pipelines::diffuse::DiffusePipeline,
};

/// Everything a pass may touch while encoding.
pub struct PassInput<'a> {
    pub scene: &'a Scene,
    pub camera: &'a CameraResources,
    /// Index of the composer target holding the previous result
    /// (unspecified content for the first pass).
    pub source: usize,
}

pub trait Pass {
    fn name(&self) -> &str;

    /// Whether the result of this pass becomes the input of the next one.
    fn needs_swap(&self) -> bool {
        true
    }

    fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32);

    /// Called whenever the composer (re)creates its ping-pong targets.
    fn bind_targets(&mut self, _device: &wgpu::Device, _targets: &[Texture; 2]) {}

    fn render(
        &mut self,
        input: &PassInput<'_>,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    );

    fn dispose(&self) {}
}

/// Draws every scene object through the camera.
///
/// Objects are only drawn once the camera is attached to the scene.
#[derive(Debug)]
pub struct ScenePass {
    clear_colour: wgpu::Color,
    format: wgpu::TextureFormat,
    sample_count: u32,
    msaa: Option<Texture>,
}

impl ScenePass {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        sample_count: u32,
        size: (u32, u32),
        clear_colour: wgpu::Color,
    ) -> Self {
        let mut pass = Self {
            clear_colour,
            format,
            sample_count,
            msaa: None,
        };
        pass.set_size(device, size.0, size.1);
        pass
    }
}

impl Pass for ScenePass {
    fn name(&self) -> &str {
        "scene"
    }

    fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.sample_count <= 1 {
            return;
        }
        if let Some(old) = self.msaa.take() {
            old.destroy();
        }
        self.msaa = Some(Texture::create_render_target(
            device,
            self.format,
            (width, height),
            self.sample_count,
            "scene_msaa_target",
        ));
    }

    fn render(
        &mut self,
        input: &PassInput<'_>,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) {
        let (view, resolve_target) = match &self.msaa {
            Some(msaa) => (&msaa.view, Some(target)),
            None => (target, None),
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        if !input.scene.has_camera() {
            return;
        }
        for object in input.scene.objects() {
            render_pass.draw_mesh(&object.mesh, &input.camera.bind_group);
        }
    }

    fn dispose(&self) {
        if let Some(msaa) = &self.msaa {
            msaa.destroy();
        }
    }
}

/// Fullscreen pass running the diffuse shader pair over the previous result.
#[derive(Debug)]
pub struct ShaderPass {
    pipeline: DiffusePipeline,
    // One per composer target, indexed like the targets
    bind_groups: Vec<wgpu::BindGroup>,
}

impl ShaderPass {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        Self {
            pipeline: DiffusePipeline::new(device, format),
            bind_groups: Vec::new(),
        }
    }
}

impl Pass for ShaderPass {
    fn name(&self) -> &str {
        "diffuse"
    }

    // Fullscreen, resolution independent
    fn set_size(&mut self, _device: &wgpu::Device, _width: u32, _height: u32) {}

    fn bind_targets(&mut self, device: &wgpu::Device, targets: &[Texture; 2]) {
        self.bind_groups = targets
            .iter()
            .map(|target| self.pipeline.bind_input(device, target))
            .collect();
    }

    fn render(
        &mut self,
        input: &PassInput<'_>,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) {
        let Some(bind_group) = self.bind_groups.get(input.source) else {
            log::warn!("diffuse pass has no input bound for target {}", input.source);
            return;
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Diffuse Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Buffer(usize),
    Output,
}

/// For every pass: which ping-pong buffer it reads and where it writes.
fn route(swaps: &[bool]) -> Vec<(usize, Target)> {
    let mut read = 0;
    let last = swaps.len().saturating_sub(1);
    swaps
        .iter()
        .enumerate()
        .map(|(i, &swap)| {
            let source = read;
            if i == last {
                return (source, Target::Output);
            }
            let write = 1 - read;
            if swap {
                read = write;
            }
            (source, Target::Buffer(write))
        })
        .collect()
}

pub struct Composer {
    passes: Vec<Box<dyn Pass>>,
    targets: [Texture; 2],
    format: wgpu::TextureFormat,
    size: (u32, u32),
}

impl Composer {
    /// Builds the default scene + diffuse chain for targets of `format`.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        sample_count: u32,
        size: (u32, u32),
        clear_colour: wgpu::Color,
    ) -> Self {
        let size = (size.0.max(1), size.1.max(1));
        let passes: Vec<Box<dyn Pass>> = vec![
            Box::new(ScenePass::new(device, format, sample_count, size, clear_colour)),
            Box::new(ShaderPass::new(device, format)),
        ];
        let mut composer = Self {
            passes,
            targets: Self::create_targets(device, format, size),
            format,
            size,
        };
        composer.bind_targets(device);
        composer
    }

    fn bind_targets(&mut self, device: &wgpu::Device) {
        for pass in &mut self.passes {
            pass.bind_targets(device, &self.targets);
        }
    }

    fn create_targets(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> [Texture; 2] {
        [
            Texture::create_render_target(device, format, size, 1, "composer_target_a"),
            Texture::create_render_target(device, format, size, 1, "composer_target_b"),
        ]
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Resizes the ping-pong targets and every pass. Returns `false` if nothing changed.
    pub fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        let size = (width.max(1), height.max(1));
        if size == self.size {
            return false;
        }
        for target in &self.targets {
            target.destroy();
        }
        self.targets = Self::create_targets(device, self.format, size);
        for pass in &mut self.passes {
            pass.set_size(device, size.0, size.1);
        }
        self.bind_targets(device);
        self.size = size;
        true
    }

    /// Flushes dirty uniforms, encodes the whole chain into `output` and submits it.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &mut Scene,
        camera: &CameraResources,
        output: &wgpu::TextureView,
    ) -> wgpu::SubmissionIndex {
        scene.flush_uniforms(queue);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Composer Encoder"),
        });
        let swaps: Vec<bool> = self.passes.iter().map(|p| p.needs_swap()).collect();
        for ((source, target), pass) in route(&swaps).into_iter().zip(self.passes.iter_mut()) {
            let input = PassInput {
                scene,
                camera,
                source,
            };
            let view = match target {
                Target::Buffer(i) => &self.targets[i].view,
                Target::Output => output,
            };
            pass.render(&input, &mut encoder, view);
        }
        queue.submit(std::iter::once(encoder.finish()))
    }

    pub fn dispose(&self) {
        for pass in &self.passes {
            pass.dispose();
        }
        for target in &self.targets {
            target.destroy();
        }
    }
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("passes", &self.pass_names())
            .field("format", &self.format)
            .field("size", &self.size)
            .finish()
    }
}
