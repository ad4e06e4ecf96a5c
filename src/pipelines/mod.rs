//! Render pipelines and their WGSL sources.
//!
//! - `material`: the primary shader pair drawing the image plane (scene pass)
//! - `diffuse`: the fullscreen post-processing shader pair
//!
//! Bind group conventions: the camera is group 0 for the material pipeline;
//! the diffuse pipeline only has its input texture at group 0.

pub mod common;
pub mod diffuse;
pub mod material;
