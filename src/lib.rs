//! shade-ngin
//!
//! A small, cross-platform engine that renders a single image through a
//! distortion shader followed by a post-processing pass. The same engine core
//! runs natively (winit window) and on the web (WASM/WebGL2 canvas).
//!
//! High-level modules
//! - `aspect`: cover-fit resolution vector and viewport sizing
//! - `camera`: fixed orthographic camera and its GPU uniform
//! - `composer`: post-processing pass chain with ping-pong render targets
//! - `config`: engine configuration
//! - `context`: GPU context (surface/device/queue) bound to a surface target
//! - `data_structures`: geometry, textures, materials, meshes and the scene
//! - `engine`: staged bootstrap, animation tick, resize/pointer handling
//! - `pick`: ray casting against scene objects
//! - `pipelines`: the material and diffuse shader pipelines
//! - `pointer`: normalized pointer position and velocity
//! - `resources`: asset loading (filesystem natively, HTTP on the web)
//! - `stage`: observable bootstrap stages
//!
//! Drivers: `app` (native, winit) and `web` + `embed` (WASM, browser events).

pub mod aspect;
pub mod camera;
pub mod clock;
pub mod composer;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod engine;
pub mod error;
pub mod logging;
pub mod pick;
pub mod pipelines;
pub mod pointer;
pub mod resources;
pub mod stage;

#[cfg(not(target_arch = "wasm32"))]
pub mod app;

#[cfg(target_arch = "wasm32")]
pub mod embed;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::EngineConfig;
pub use engine::{Engine, PendingEngine, StopSignal};
pub use error::EngineError;
pub use stage::Stage;

#[cfg(not(target_arch = "wasm32"))]
pub use app::{run, run_with};
