//! Headless GPU helpers shared by the integration tests.
#![allow(dead_code)]

use std::time::Duration;

use image::{DynamicImage, Rgba, RgbaImage};
use shade_ngin::{
    camera::{CameraResources, OrthographicCamera},
    data_structures::{
        geometry::PlaneGeometry, material::Material, mesh::Mesh, scene::Scene,
        texture::Texture, transform::Transform,
    },
};

pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const SIZE: u32 = 256;

pub struct Gpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

/// `None` when the machine has no usable adapter; tests then skip.
pub fn gpu() -> Option<Gpu> {
    futures::executor::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .ok()?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .ok()?;
        Some(Gpu { device, queue })
    })
}

pub fn solid_image(colour: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba(colour)))
}

pub fn output_texture(gpu: &Gpu) -> wgpu::Texture {
    gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Output Texture"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

/// A scene holding the unit plane textured with `image`, camera attached.
pub fn image_scene(gpu: &Gpu, camera: &CameraResources, image: &DynamicImage) -> Scene {
    let texture = Texture::from_image(&gpu.device, &gpu.queue, image, Some("test image")).unwrap();
    let geometry = PlaneGeometry::unit();
    let material = Material::new(
        &gpu.device,
        &camera.bind_group_layout,
        texture,
        FORMAT,
        1,
        1.0,
    );
    let mesh = Mesh::new("test plane", geometry.upload(&gpu.device, "Test Plane"), material);
    let mut scene = Scene::new();
    scene.add(Transform::new(), geometry, mesh);
    scene.attach_camera();
    scene
}

pub fn camera(gpu: &Gpu) -> CameraResources {
    CameraResources::new(&gpu.device, OrthographicCamera::new())
}

/// Copies an RGBA8 texture back to the CPU. Widths must be multiples of 64.
pub fn read_pixels(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> RgbaImage {
    let (width, height) = (texture.width(), texture.height());
    // 64 * 4 bytes per row satisfies the copy alignment
    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        size: u64::from(4 * width * height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        label: Some("Test Readback Buffer"),
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
        },
        texture.size(),
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = output_buffer.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(3)),
        })
        .unwrap();
    futures::executor::block_on(rx.receive()).unwrap().unwrap();
    let data = buffer_slice.get_mapped_range().to_vec();
    output_buffer.unmap();
    RgbaImage::from_raw(width, height, data).unwrap()
}
