//! Error types for the engine.

use thiserror::Error;

use crate::stage::Stage;

/// Errors produced while bootstrapping or driving the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested canvas element does not exist in the document.
    #[error("canvas element `{0}` not found")]
    CanvasNotFound(String),

    /// The element exists but is not a `<canvas>`.
    #[error("element `{0}` is not a canvas")]
    NotACanvas(String),

    /// No browser window/document (or native window) is available.
    #[error("no window available to render into")]
    NoWindow,

    #[error("failed to create the rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to acquire a GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported texture format")]
    NoSurfaceFormat,

    /// Fetching or decoding the image, or uploading it to the GPU, failed.
    #[error("failed to load texture: {0}")]
    TextureLoad(String),

    #[error("failed to acquire the next frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),

    /// A bootstrap step was attempted out of order.
    #[error("invalid stage transition from {from} to {to}")]
    InvalidTransition { from: Stage, to: Stage },

    /// The engine was stopped and can no longer be used.
    #[error("engine has been stopped")]
    Stopped,
}

impl EngineError {
    /// Wraps any loading failure (fetch, decode, upload) as a texture error.
    pub fn texture_load(err: impl std::fmt::Display) -> Self {
        // Alternate form keeps the whole `anyhow` context chain
        Self::TextureLoad(format!("{err:#}"))
    }
}
