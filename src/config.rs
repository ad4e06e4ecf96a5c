//! Engine configuration.

/// Everything the engine needs to know before it starts.
///
/// Only `image_src` is required; the rest defaults to the behaviour of the
/// embedding component (aspect ratio 1, pixel ratio capped at 2, antialiased,
/// transparent background).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path (native, relative to `assets/`) or URL (web) of the image.
    pub image_src: String,
    /// Width / height of the source image.
    pub image_ratio: f32,
    /// Upper bound for the device pixel ratio used for the drawing buffer.
    pub max_pixel_ratio: f64,
    /// Enables 4x multisampling on the scene pass when the format supports it.
    pub antialias: bool,
    /// Requests a premultiplied-alpha surface so the page shows through.
    pub transparent: bool,
    pub clear_colour: wgpu::Color,
    /// Initial value of the material's `progress` uniform.
    pub progress: f32,
    pub log_level: log::Level,
}

impl EngineConfig {
    pub const DEFAULT_MAX_PIXEL_RATIO: f64 = 2.0;
    pub const MSAA_SAMPLES: u32 = 4;

    pub fn new(image_src: impl Into<String>) -> Self {
        Self {
            image_src: image_src.into(),
            image_ratio: 1.0,
            max_pixel_ratio: Self::DEFAULT_MAX_PIXEL_RATIO,
            antialias: true,
            transparent: true,
            clear_colour: wgpu::Color::TRANSPARENT,
            progress: 1.0,
            log_level: log::Level::Info,
        }
    }

    /// Sets the image aspect ratio. Non-positive or non-finite values are ignored.
    pub fn with_image_ratio(mut self, ratio: f32) -> Self {
        if ratio.is_finite() && ratio > 0.0 {
            self.image_ratio = ratio;
        } else {
            log::warn!("ignoring invalid image ratio {ratio}, keeping {}", self.image_ratio);
        }
        self
    }

    pub fn with_max_pixel_ratio(mut self, ratio: f64) -> Self {
        if ratio.is_finite() && ratio >= 1.0 {
            self.max_pixel_ratio = ratio;
        } else {
            log::warn!("ignoring invalid pixel ratio cap {ratio}");
        }
        self
    }

    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }

    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        if !transparent && self.clear_colour == wgpu::Color::TRANSPARENT {
            self.clear_colour = wgpu::Color::BLACK;
        }
        self
    }

    pub fn with_clear_colour(mut self, colour: wgpu::Color) -> Self {
        self.clear_colour = colour;
        self
    }

    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_log_level(mut self, level: log::Level) -> Self {
        self.log_level = level;
        self
    }

    /// Requested sample count for the scene pass.
    pub fn sample_count(&self) -> u32 {
        if self.antialias { Self::MSAA_SAMPLES } else { 1 }
    }
}
