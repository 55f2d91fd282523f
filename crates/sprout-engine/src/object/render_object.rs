use std::path::Path;

use crate::assets;
use crate::backend::{
    GraphicsDevice, ShaderProgram, Texture, TextureCache, UniformValue, UNIFORM_DIMENSIONS,
};
use crate::buffers::{Rotation, VertexStore};
use crate::coords::{Rect, Vec2, Viewport};
use crate::error::RenderError;
use crate::geometry::{rect_tex_coords, rect_vertices, QUAD_VERTEX_COUNT};

use super::{ObjectDesc, ObjectId, ShaderSource, SpriteIndex, SpriteQuad};

/// A fixed-capacity sprite batch: one texture, one program, one vertex store.
///
/// Lives on the render thread; producers reach it through jobs.
pub struct RenderObject<D: GraphicsDevice> {
    id: ObjectId,
    used_vertices: u32,
    store: VertexStore<D::Buffers>,
    texture: Texture<D::Texture>,
    program: D::Program,
    viewport: Viewport,

    /// Global transform in pixels, re-normalized when the viewport changes.
    pivot: Vec2,
    radians: f32,
    offset: Vec2,
}

impl<D: GraphicsDevice> RenderObject<D> {
    /// Loads the texture (through `textures`), compiles the program and
    /// allocates GPU buffers for `desc.capacity` vertices.
    pub fn create(
        device: &mut D,
        textures: &mut TextureCache<D::Texture>,
        id: ObjectId,
        desc: &ObjectDesc,
    ) -> Result<Self, RenderError> {
        let texture_path = assets::resolve(&desc.texture);
        let texture = textures.get_or_load(&texture_path, |p| device.load_texture(p))?;

        let mut program = match &desc.shader {
            ShaderSource::Default => {
                let (vertex, fragment) = device.default_shader_sources();
                device.compile_program(vertex, fragment)?
            }
            ShaderSource::Files { vertex, fragment } => {
                let vertex = read_shader("vertex", vertex)?;
                let fragment = read_shader("fragment", fragment)?;
                device.compile_program(&vertex, &fragment)?
            }
        };

        let viewport = device.viewport();
        program.set_uniform(UNIFORM_DIMENSIONS, UniformValue::Vec2(viewport.to_array()))?;

        let mut store = VertexStore::new(desc.capacity);
        store.push_uniforms(&mut program)?;
        store.allocate(device, &mut program)?;

        log::debug!(
            "created render object {id}: capacity {}, texture {} ({}x{})",
            desc.capacity,
            texture_path.display(),
            texture.width,
            texture.height
        );

        Ok(Self {
            id,
            used_vertices: 0,
            store,
            texture,
            program,
            viewport,
            pivot: Vec2::zero(),
            radians: 0.0,
            offset: Vec2::zero(),
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn capacity(&self) -> u32 {
        self.store.capacity()
    }

    /// The bump cursor: vertices handed out so far.
    pub fn used_vertices(&self) -> u32 {
        self.used_vertices
    }

    pub fn store(&self) -> &VertexStore<D::Buffers> {
        &self.store
    }

    pub fn texture(&self) -> &Texture<D::Texture> {
        &self.texture
    }

    pub fn program(&self) -> &D::Program {
        &self.program
    }

    /// Appends a sprite at the bump cursor and returns its handle.
    ///
    /// Fails without touching any array when the object is full.
    pub fn append(&mut self, device: &mut D, quad: SpriteQuad) -> Result<SpriteIndex, RenderError> {
        let capacity = self.capacity();
        if self.used_vertices + QUAD_VERTEX_COUNT > capacity {
            return Err(RenderError::CapacityExceeded {
                id: self.id,
                used: self.used_vertices,
                requested: QUAD_VERTEX_COUNT,
                capacity,
            });
        }

        let index = SpriteIndex::from_first_vertex(self.used_vertices);
        let positions = rect_vertices(quad.dst);
        let tex_coords = self.texture.pixel_to_texel(rect_tex_coords(quad.src));
        self.store.update_indexed(
            device,
            &mut self.program,
            index.first_vertex(),
            &positions,
            &tex_coords,
        )?;

        self.used_vertices += QUAD_VERTEX_COUNT;
        Ok(index)
    }

    /// Square sprite, the common case.
    pub fn append_square(
        &mut self,
        device: &mut D,
        position: Vec2,
        size: f32,
        tex_origin: Vec2,
        tex_size: f32,
    ) -> Result<SpriteIndex, RenderError> {
        self.append(device, SpriteQuad::square(position, size, tex_origin, tex_size))
    }

    fn check_index(&self, index: SpriteIndex) -> Result<u32, RenderError> {
        if index.is_aligned() && index.first_vertex() < self.used_vertices {
            return Ok(index.first_vertex());
        }
        Err(RenderError::InvalidIndex {
            id: self.id,
            index: index.first_vertex(),
            used: self.used_vertices,
        })
    }

    /// Moves or resizes a sprite on screen.
    pub fn modify_vertex_region(
        &mut self,
        device: &mut D,
        index: SpriteIndex,
        dst: Rect,
    ) -> Result<(), RenderError> {
        let first = self.check_index(index)?;
        self.store
            .update_positions(device, &mut self.program, first, &rect_vertices(dst))
    }

    /// Changes the texture region a sprite shows.
    pub fn modify_tex_region(
        &mut self,
        device: &mut D,
        index: SpriteIndex,
        src: Rect,
    ) -> Result<(), RenderError> {
        let first = self.check_index(index)?;
        let tex_coords = self.texture.pixel_to_texel(rect_tex_coords(src));
        self.store
            .update_tex_coords(device, &mut self.program, first, &tex_coords)
    }

    /// Replaces both the screen and texture regions of a sprite.
    pub fn modify_region(
        &mut self,
        device: &mut D,
        index: SpriteIndex,
        quad: SpriteQuad,
    ) -> Result<(), RenderError> {
        let first = self.check_index(index)?;
        let positions = rect_vertices(quad.dst);
        let tex_coords = self.texture.pixel_to_texel(rect_tex_coords(quad.src));
        self.store
            .update_indexed(device, &mut self.program, first, &positions, &tex_coords)
    }

    /// Collapses a sprite to zero area. The slot stays allocated.
    pub fn clear(&mut self, device: &mut D, index: SpriteIndex) -> Result<(), RenderError> {
        self.modify_vertex_region(device, index, Rect::zero())
    }

    /// Rotates the whole object around `pivot` (pixels).
    pub fn rotate_around(&mut self, pivot: Vec2, radians: f32) -> Result<(), RenderError> {
        self.pivot = pivot;
        self.radians = radians;
        let pivot = self.viewport.pixel_to_ndc(pivot);
        self.store.set_global_rotation(&mut self.program, pivot, radians)
    }

    /// Translates the whole object by `offset` (pixels).
    pub fn translate(&mut self, offset: Vec2) -> Result<(), RenderError> {
        self.offset = offset;
        let offset = self.viewport.pixel_to_ndc(offset);
        self.store.set_global_translation(&mut self.program, offset)
    }

    /// Adopts a new surface size: updates `dim` and re-normalizes the global
    /// transform. Degenerate sizes (a minimized window) are ignored.
    pub fn resize(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        if !viewport.is_valid() || viewport == self.viewport {
            return Ok(());
        }
        self.viewport = viewport;
        self.program
            .set_uniform(UNIFORM_DIMENSIONS, UniformValue::Vec2(viewport.to_array()))?;
        self.rotate_around(self.pivot, self.radians)?;
        self.translate(self.offset)
    }

    /// Rotates vertices `start..=end` around `pivot` (pixels).
    ///
    /// Takes effect with the next write or `flush`.
    pub fn set_group_rotation(
        &mut self,
        pivot: Vec2,
        radians: f32,
        start: u32,
        end: u32,
    ) -> Result<(), RenderError> {
        self.store.set_group_rotation(pivot, radians, start, end)
    }

    pub fn set_all_group_rotation(&mut self, pivot: Vec2, radians: f32) {
        self.store.set_all_group_rotation(pivot, radians);
    }

    pub fn reset_group_rotation(&mut self) {
        self.store.reset_group_rotation();
    }

    pub fn group_rotation(&self, vertex: u32) -> Option<Rotation> {
        self.store.group_rotation(vertex)
    }

    /// Uploads the CPU arrays, allocating buffers if needed.
    pub fn flush(&mut self, device: &mut D) -> Result<(), RenderError> {
        self.store.upload(device, &mut self.program)
    }

    /// Draws every vertex handed out so far, cleared sprites included.
    pub fn draw(&mut self, device: &mut D) -> Result<(), RenderError> {
        if self.used_vertices == 0 {
            return Ok(());
        }
        let Some(buffers) = self.store.buffers() else {
            return Ok(());
        };

        self.store.push_uniforms(&mut self.program)?;
        self.program.use_program();
        device.draw_triangles(buffers, &self.program, &self.texture.handle, self.used_vertices);
        Ok(())
    }

    /// Frees GPU buffers. Later calls do nothing.
    pub fn release(&mut self, device: &mut D) {
        self.store.release(device);
    }
}

fn read_shader(stage: &'static str, path: &Path) -> Result<String, RenderError> {
    let path = assets::resolve(path);
    std::fs::read_to_string(&path).map_err(|e| RenderError::Shader {
        stage,
        message: format!("{}: {e}", path.display()),
    })
}
