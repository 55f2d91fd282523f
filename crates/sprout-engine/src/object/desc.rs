use std::path::PathBuf;

use crate::coords::{Rect, Vec2};

/// Which program a render object draws with.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ShaderSource {
    /// The backend's built-in sprite program.
    #[default]
    Default,
    /// Vertex and fragment sources read from disk (asset-root relative).
    Files { vertex: PathBuf, fragment: PathBuf },
}

/// Everything needed to create a render object. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDesc {
    /// Vertex capacity. Each sprite takes six.
    pub capacity: u32,
    /// Texture image path (asset-root relative).
    pub texture: PathBuf,
    pub shader: ShaderSource,
}

impl ObjectDesc {
    pub fn new(capacity: u32, texture: impl Into<PathBuf>) -> Self {
        Self {
            capacity,
            texture: texture.into(),
            shader: ShaderSource::Default,
        }
    }

    pub fn with_shader(mut self, shader: ShaderSource) -> Self {
        self.shader = shader;
        self
    }
}

/// A sprite: where it goes on screen and which texture region it shows.
///
/// `dst` is in surface pixels, `src` in texture pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SpriteQuad {
    pub dst: Rect,
    pub src: Rect,
}

impl SpriteQuad {
    #[inline]
    pub const fn new(dst: Rect, src: Rect) -> Self {
        Self { dst, src }
    }

    /// Square sprite of side `size` sampling a `tex_size` texture square.
    #[inline]
    pub const fn square(position: Vec2, size: f32, tex_origin: Vec2, tex_size: f32) -> Self {
        Self {
            dst: Rect::square(position.x, position.y, size),
            src: Rect::square(tex_origin.x, tex_origin.y, tex_size),
        }
    }
}
