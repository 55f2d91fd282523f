//! Coordinate and geometry types shared by the codec, the vertex store and
//! the backends.
//!
//! Canonical CPU space:
//! - Logical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! Per-vertex data stays in pixels and is scaled in the vertex shader using a
//! viewport uniform. Only the global transform uniforms are pre-normalized,
//! see [`Viewport::pixel_to_ndc`].

mod color;
mod rect;
mod vec2;
mod viewport;

pub use color::ColorRgba;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
