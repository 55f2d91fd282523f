//! Per-object vertex storage.
//!
//! Responsibilities:
//! - keep the CPU copy of positions, texture coordinates and rotation groups
//! - own the GPU buffers once allocated and re-upload them on change
//! - hold the global transform and push it as shader uniforms

mod rotation;
mod store;

pub use rotation::Rotation;
pub use store::VertexStore;
