use crate::{
    aspect::Viewport, config::EngineConfig, data_structures::texture::Texture,
    error::EngineError,
};

/// Format of the offscreen output when there is no surface to ask.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Where frames end up: a window/canvas surface or an owned texture.
#[derive(Debug)]
enum Output {
    Surface(wgpu::Surface<'static>),
    Offscreen(Option<Texture>),
}

/// A texture to render the next frame into.
///
/// Surface frames must be [`present`](Frame::present)ed; offscreen frames
/// stay in [`Context::offscreen_texture`].
pub struct Frame {
    pub view: wgpu::TextureView,
    surface_texture: Option<wgpu::SurfaceTexture>,
}

impl Frame {
    pub fn present(self) {
        if let Some(surface_texture) = self.surface_texture {
            surface_texture.present();
        }
    }
}

/// GPU state bound to one output: the "renderer" of the engine.
///
/// The context does not know what the surface belongs to. Natively it is a
/// winit window, on the web an `HtmlCanvasElement`; both arrive as a
/// [`wgpu::SurfaceTarget`]. [`Context::headless`] renders into a texture
/// instead.
#[derive(Debug)]
pub struct Context {
    output: Output,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub viewport: Viewport,
    /// Sample count the scene pass renders with (4 with antialiasing, else 1).
    pub sample_count: u32,
    is_configured: bool,
}

fn create_instance() -> wgpu::Instance {
    // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        #[cfg(not(target_arch = "wasm32"))]
        backends: wgpu::Backends::PRIMARY,
        #[cfg(target_arch = "wasm32")]
        backends: wgpu::Backends::GL,
        ..Default::default()
    })
}

async fn request_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'static>>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), EngineError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await?;
    log::info!("adapter: {:?}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("shade-ngin device"),
            required_features: wgpu::Features::empty(),
            // WebGL doesn't support all of wgpu's features, so if
            // we're building for the web we'll have to disable some.
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults()
            } else {
                wgpu::Limits::default()
            },
            ..Default::default()
        })
        .await?;
    Ok((adapter, device, queue))
}

/// Falls back to 1 when the adapter cannot multisample `format`.
fn supported_sample_count(
    adapter: &wgpu::Adapter,
    format: wgpu::TextureFormat,
    requested: u32,
) -> u32 {
    if requested > 1
        && !adapter
            .get_texture_format_features(format)
            .flags
            .sample_count_supported(requested)
    {
        log::warn!("{requested}x MSAA unsupported for {format:?}, rendering without antialiasing");
        return 1;
    }
    requested
}

impl Context {
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        viewport: Viewport,
        engine_config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        log::info!("wgpu setup");
        let instance = create_instance();
        let surface = instance.create_surface(target)?;
        let (adapter, device, queue) = request_device(&instance, Some(&surface)).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The material writes linear colour; an sRGB target does the encoding.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(EngineError::NoSurfaceFormat)?;

        let alpha_mode = pick_alpha_mode(&surface_caps.alpha_modes, engine_config.transparent);
        if engine_config.transparent && alpha_mode == wgpu::CompositeAlphaMode::Opaque {
            log::warn!("surface does not support transparency, falling back to opaque");
        }

        let sample_count = supported_sample_count(&adapter, format, engine_config.sample_count());

        let (width, height) = viewport.buffer_size();
        let max = device.limits().max_texture_dimension_2d;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.min(max),
            height: height.min(max),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        Ok(Self::finish(Output::Surface(surface), device, queue, config, viewport, sample_count))
    }

    /// A context without a window: frames are rendered into an owned
    /// [`OFFSCREEN_FORMAT`] texture of the viewport's buffer size.
    pub async fn headless(
        viewport: Viewport,
        engine_config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        log::info!("wgpu setup (offscreen)");
        let instance = create_instance();
        let (adapter, device, queue) = request_device(&instance, None).await?;
        let sample_count =
            supported_sample_count(&adapter, OFFSCREEN_FORMAT, engine_config.sample_count());

        let (width, height) = viewport.buffer_size();
        let max = device.limits().max_texture_dimension_2d;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: OFFSCREEN_FORMAT,
            width: width.min(max),
            height: height.min(max),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        Ok(Self::finish(Output::Offscreen(None), device, queue, config, viewport, sample_count))
    }

    fn finish(
        output: Output,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
        viewport: Viewport,
        sample_count: u32,
    ) -> Self {
        let mut ctx = Self {
            output,
            device,
            queue,
            config,
            viewport,
            sample_count,
            is_configured: false,
        };
        ctx.resize(viewport);
        log::info!(
            "renderer ready: {:?} {}x{} (pixel ratio {}), {}x MSAA",
            ctx.config.format,
            ctx.config.width,
            ctx.config.height,
            ctx.viewport.pixel_ratio,
            ctx.sample_count
        );
        ctx
    }

    /// Reconfigures the surface (or reallocates the offscreen texture) for a new viewport.
    ///
    /// Returns `false` (and keeps the old configuration) for an empty viewport.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if viewport.is_empty() {
            return false;
        }
        let (width, height) = viewport.buffer_size();
        let max = self.device.limits().max_texture_dimension_2d;
        self.viewport = viewport;
        self.config.width = width.min(max);
        self.config.height = height.min(max);
        match &mut self.output {
            Output::Surface(surface) => surface.configure(&self.device, &self.config),
            Output::Offscreen(texture) => {
                if let Some(old) = texture.take() {
                    old.destroy();
                }
                *texture = Some(Texture::create_render_target(
                    &self.device,
                    self.config.format,
                    (self.config.width, self.config.height),
                    1,
                    "offscreen_output",
                ));
            }
        }
        self.is_configured = true;
        true
    }

    /// The texture headless frames are rendered into; `None` for a surface context.
    pub fn offscreen_texture(&self) -> Option<&wgpu::Texture> {
        match &self.output {
            Output::Offscreen(texture) => texture.as_ref().map(|t| &t.texture),
            Output::Surface(_) => None,
        }
    }

    /// Releases the offscreen texture. The surface itself goes with the context.
    pub fn dispose(&mut self) {
        if let Output::Offscreen(texture) = &mut self.output {
            if let Some(texture) = texture.take() {
                texture.destroy();
            }
        }
        self.is_configured = false;
    }

    pub fn is_configured(&self) -> bool {
        self.is_configured
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Acquires the next frame, reconfiguring the surface once if it went stale.
    ///
    /// `Ok(None)` means the frame should be skipped.
    pub fn current_frame(&mut self) -> Result<Option<Frame>, wgpu::SurfaceError> {
        if !self.is_configured {
            return Ok(None);
        }
        let surface = match &self.output {
            Output::Surface(surface) => surface,
            Output::Offscreen(texture) => {
                return Ok(texture.as_ref().map(|t| Frame {
                    view: t.texture.create_view(&wgpu::TextureViewDescriptor::default()),
                    surface_texture: None,
                }));
            }
        };
        match surface.get_current_texture() {
            Ok(surface_texture) => Ok(Some(Frame {
                view: surface_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default()),
                surface_texture: Some(surface_texture),
            })),
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, skipping frame");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Premultiplied alpha lets the page show through transparent pixels.
fn pick_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    transparent: bool,
) -> wgpu::CompositeAlphaMode {
    use wgpu::CompositeAlphaMode::*;
    let preferred: &[wgpu::CompositeAlphaMode] = if transparent {
        &[PreMultiplied, PostMultiplied, Inherit]
    } else {
        &[Opaque]
    };
    preferred
        .iter()
        .copied()
        .find(|mode| supported.contains(mode))
        .or_else(|| supported.first().copied())
        .unwrap_or(Auto)
}

#[cfg(test)]
mod tests {
    use wgpu::CompositeAlphaMode::*;

    use super::*;

    #[test]
    fn transparent_prefers_premultiplied() {
        assert_eq!(pick_alpha_mode(&[Opaque, PreMultiplied], true), PreMultiplied);
        assert_eq!(pick_alpha_mode(&[Opaque, PostMultiplied], true), PostMultiplied);
    }

    #[test]
    fn falls_back_to_first_supported_mode() {
        assert_eq!(pick_alpha_mode(&[Opaque], true), Opaque);
        assert_eq!(pick_alpha_mode(&[PreMultiplied], false), PreMultiplied);
        assert_eq!(pick_alpha_mode(&[], false), Auto);
    }
}
