//! Graphics collaborator seams.
//!
//! The render thread only talks to the graphics context through these traits:
//! - [`Surface`]: frame clear/present, input polling, close requests
//! - [`GraphicsDevice`]: programs, textures, vertex buffers, draw calls
//! - [`ShaderProgram`]: uniforms and attribute slots of one compiled program
//!
//! All methods run on the render thread. Implementations are free to be
//! `!Send`.

pub mod headless;
mod texture;

use std::path::Path;

use crate::buffers::Rotation;
use crate::coords::{ColorRgba, Viewport};
use crate::error::RenderError;

pub use texture::{Texture, TextureCache};

/// Vertex position attribute name.
pub const ATTR_POSITION: &str = "vert";
/// Texture coordinate attribute name.
pub const ATTR_TEX_COORD: &str = "verttexcoord";
/// Per-vertex rotation group attribute name.
pub const ATTR_ROTATION_GROUP: &str = "rotgroup";

/// Global rotation uniform: `(pivot_x, pivot_y, cos, sin)`, pivot in NDC units.
pub const UNIFORM_ROTATION: &str = "rot";
/// Global translation uniform, NDC units.
pub const UNIFORM_TRANSLATION: &str = "trans";
/// Surface size uniform in pixels.
pub const UNIFORM_DIMENSIONS: &str = "dim";

/// Shader location of a sprite vertex attribute.
pub fn attribute_location(name: &str) -> Option<u32> {
    match name {
        ATTR_POSITION => Some(0),
        ATTR_TEX_COORD => Some(1),
        ATTR_ROTATION_GROUP => Some(2),
        _ => None,
    }
}

/// A value accepted by [`ShaderProgram::set_uniform`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
}

impl UniformValue {
    pub fn kind(self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec4(_) => "vec4",
        }
    }
}

/// Attribute slots resolved from a program before buffers are created.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttributeSlots {
    pub position: u32,
    pub tex_coord: u32,
    pub rotation_group: u32,
}

/// Borrowed view over a vertex store's CPU arrays, uploaded as a whole.
#[derive(Debug, Copy, Clone)]
pub struct VertexArrays<'a> {
    pub positions: &'a [[f32; 2]],
    pub tex_coords: &'a [[f32; 2]],
    pub rotation_groups: &'a [Rotation],
}

/// One compiled shader program.
pub trait ShaderProgram {
    /// Makes the program current and flushes uniform changes.
    fn use_program(&mut self);

    /// Stores a uniform value; it reaches the GPU on the next `use_program`.
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), RenderError>;

    /// Resolves a vertex attribute to its slot.
    fn bind_attribute(&mut self, name: &str) -> Result<u32, RenderError>;
}

/// Window side of the graphics context.
pub trait Surface {
    /// Starts a new frame cleared to `color`.
    fn clear(&mut self, color: ColorRgba);

    /// Presents the frame recorded since `clear` and polls input.
    fn present(&mut self) -> Result<(), RenderError>;

    /// Returns `true` once the user (or the platform) asked to close.
    fn should_close(&self) -> bool;

    /// New surface size if it changed since the last call.
    fn take_resize(&mut self) -> Option<Viewport>;

    /// Destroys the window and its context. Called once, at shutdown.
    fn destroy(&mut self);
}

/// GPU side of the graphics context.
pub trait GraphicsDevice {
    /// Per-object GPU vertex buffers.
    type Buffers;
    /// Texture handle. Cloned freely by the texture cache.
    type Texture: Clone;
    /// Compiled program.
    type Program: ShaderProgram;

    /// Surface size in logical pixels.
    fn viewport(&self) -> Viewport;

    /// Built-in `(vertex, fragment)` shader sources.
    fn default_shader_sources(&self) -> (&'static str, &'static str);

    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self::Program, RenderError>;

    /// Decodes and uploads an image. Callers deduplicate through [`TextureCache`].
    fn load_texture(&mut self, path: &Path) -> Result<Texture<Self::Texture>, RenderError>;

    /// Allocates buffers for `capacity` vertices.
    fn create_buffers(
        &mut self,
        capacity: u32,
        slots: AttributeSlots,
    ) -> Result<Self::Buffers, RenderError>;

    /// Replaces the full contents of `buffers`.
    fn upload(&mut self, buffers: &Self::Buffers, arrays: VertexArrays<'_>);

    fn release_buffers(&mut self, buffers: Self::Buffers);

    /// Draws the first `vertex_count` vertices as a triangle list.
    fn draw_triangles(
        &mut self,
        buffers: &Self::Buffers,
        program: &Self::Program,
        texture: &Self::Texture,
        vertex_count: u32,
    );
}
