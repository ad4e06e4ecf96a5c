//! Engine data structures.
//!
//! - `geometry` builds the subdivided plane and uploads it
//! - `texture` wraps the loaded image and the composer's render targets
//! - `transform` places an object in world space
//! - `material` owns the primary shader pipeline and its uniforms
//! - `mesh` pairs geometry buffers with a material
//! - `scene` is the flat list of objects the scene pass draws

pub mod geometry;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod texture;
pub mod transform;
