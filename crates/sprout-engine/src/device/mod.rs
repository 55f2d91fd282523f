//! wgpu graphics backend.
//!
//! - [`Gpu`]: instance/adapter/device/queue and the window surface
//! - [`WgpuProgram`]: one sprite pipeline plus its uniform block
//! - [`WgpuContext`]: the [`GraphicsDevice`](crate::backend::GraphicsDevice) +
//!   [`Surface`](crate::backend::Surface) pair the frame driver runs on

mod context;
mod gpu;
mod init;
mod program;
mod surface;
mod texture;

pub use context::{WgpuBuffers, WgpuContext};
pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use program::WgpuProgram;
pub use surface::SurfaceErrorAction;
pub use texture::WgpuTexture;

/// Built-in sprite vertex shader (WGSL, entry point `vs_main`).
pub const SPRITE_VERTEX_WGSL: &str = include_str!("shaders/sprite_vert.wgsl");
/// Built-in sprite fragment shader (WGSL, entry point `fs_main`).
pub const SPRITE_FRAGMENT_WGSL: &str = include_str!("shaders/sprite_frag.wgsl");
