use crate::backend::{
    AttributeSlots, GraphicsDevice, ShaderProgram, UniformValue, VertexArrays, ATTR_POSITION,
    ATTR_ROTATION_GROUP, ATTR_TEX_COORD, UNIFORM_ROTATION, UNIFORM_TRANSLATION,
};
use crate::coords::Vec2;
use crate::error::RenderError;

use super::Rotation;

/// CPU copy and GPU buffers of one render object's vertices.
///
/// All arrays are sized to `capacity` at construction and never resized, so
/// positions, texture coordinates and rotation groups always line up. Every
/// write re-uploads the whole store; batches are small enough that sub-range
/// uploads are not worth the bookkeeping yet.
///
/// Must only be touched from the render thread.
#[derive(Debug)]
pub struct VertexStore<B> {
    capacity: u32,
    positions: Vec<[f32; 2]>,
    tex_coords: Vec<[f32; 2]>,
    rotation_groups: Vec<Rotation>,

    /// Object-wide rotation, pivot in NDC units.
    rotation: Rotation,
    /// Object-wide translation, NDC units.
    translation: Vec2,

    gpu: Option<B>,
}

impl<B> VertexStore<B> {
    pub fn new(capacity: u32) -> Self {
        let len = capacity as usize;
        Self {
            capacity,
            positions: vec![[0.0; 2]; len],
            tex_coords: vec![[0.0; 2]; len],
            rotation_groups: vec![Rotation::IDENTITY; len],
            rotation: Rotation::IDENTITY,
            translation: Vec2::zero(),
            gpu: None,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_allocated(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn buffers(&self) -> Option<&B> {
        self.gpu.as_ref()
    }

    pub fn positions(&self) -> &[[f32; 2]] {
        &self.positions
    }

    pub fn tex_coords(&self) -> &[[f32; 2]] {
        &self.tex_coords
    }

    pub fn rotation_groups(&self) -> &[Rotation] {
        &self.rotation_groups
    }

    /// Rotation group of vertex `index`, if in range.
    pub fn group_rotation(&self, index: u32) -> Option<Rotation> {
        self.rotation_groups.get(index as usize).copied()
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn translation(&self) -> Vec2 {
        self.translation
    }

    fn arrays(&self) -> VertexArrays<'_> {
        VertexArrays {
            positions: &self.positions,
            tex_coords: &self.tex_coords,
            rotation_groups: &self.rotation_groups,
        }
    }

    fn check_range(&self, start: u32, len: usize) -> Result<(), RenderError> {
        let end = start as usize + len;
        if len == 0 || end <= self.capacity as usize {
            return Ok(());
        }
        Err(RenderError::InvalidRange {
            start,
            end: (end - 1) as u32,
            capacity: self.capacity,
        })
    }

    /// Allocates GPU buffers sized for `capacity` vertices and uploads the
    /// current contents.
    ///
    /// A store is allocated at most once.
    pub fn allocate<D>(
        &mut self,
        device: &mut D,
        program: &mut D::Program,
    ) -> Result<(), RenderError>
    where
        D: GraphicsDevice<Buffers = B>,
    {
        if self.gpu.is_some() {
            return Err(RenderError::AlreadyAllocated {
                capacity: self.capacity,
            });
        }

        let slots = AttributeSlots {
            position: program.bind_attribute(ATTR_POSITION)?,
            tex_coord: program.bind_attribute(ATTR_TEX_COORD)?,
            rotation_group: program.bind_attribute(ATTR_ROTATION_GROUP)?,
        };
        let buffers = device.create_buffers(self.capacity, slots)?;
        device.upload(&buffers, self.arrays());
        self.gpu = Some(buffers);
        Ok(())
    }

    /// Re-uploads everything, allocating first if needed.
    pub fn upload<D>(
        &mut self,
        device: &mut D,
        program: &mut D::Program,
    ) -> Result<(), RenderError>
    where
        D: GraphicsDevice<Buffers = B>,
    {
        match &self.gpu {
            Some(buffers) => {
                device.upload(buffers, self.arrays());
                Ok(())
            }
            None => self.allocate(device, program),
        }
    }

    /// Writes positions and texture coordinates starting at vertex `index`,
    /// then re-uploads.
    pub fn update_indexed<D>(
        &mut self,
        device: &mut D,
        program: &mut D::Program,
        index: u32,
        positions: &[[f32; 2]],
        tex_coords: &[[f32; 2]],
    ) -> Result<(), RenderError>
    where
        D: GraphicsDevice<Buffers = B>,
    {
        if positions.len() != tex_coords.len() {
            return Err(RenderError::LengthMismatch {
                what: "texture coordinates",
                expected: positions.len(),
                actual: tex_coords.len(),
            });
        }
        self.check_range(index, positions.len())?;

        let start = index as usize;
        self.positions[start..start + positions.len()].copy_from_slice(positions);
        self.tex_coords[start..start + tex_coords.len()].copy_from_slice(tex_coords);
        self.upload(device, program)
    }

    /// Writes positions only, starting at vertex `index`.
    pub fn update_positions<D>(
        &mut self,
        device: &mut D,
        program: &mut D::Program,
        index: u32,
        positions: &[[f32; 2]],
    ) -> Result<(), RenderError>
    where
        D: GraphicsDevice<Buffers = B>,
    {
        self.check_range(index, positions.len())?;
        let start = index as usize;
        self.positions[start..start + positions.len()].copy_from_slice(positions);
        self.upload(device, program)
    }

    /// Writes texture coordinates only, starting at vertex `index`.
    pub fn update_tex_coords<D>(
        &mut self,
        device: &mut D,
        program: &mut D::Program,
        index: u32,
        tex_coords: &[[f32; 2]],
    ) -> Result<(), RenderError>
    where
        D: GraphicsDevice<Buffers = B>,
    {
        self.check_range(index, tex_coords.len())?;
        let start = index as usize;
        self.tex_coords[start..start + tex_coords.len()].copy_from_slice(tex_coords);
        self.upload(device, program)
    }

    /// Replaces all three arrays. Each must hold exactly `capacity` entries.
    pub fn update_whole<D>(
        &mut self,
        device: &mut D,
        program: &mut D::Program,
        positions: Vec<[f32; 2]>,
        tex_coords: Vec<[f32; 2]>,
        rotation_groups: Vec<Rotation>,
    ) -> Result<(), RenderError>
    where
        D: GraphicsDevice<Buffers = B>,
    {
        let expected = self.capacity as usize;
        for (what, actual) in [
            ("positions", positions.len()),
            ("texture coordinates", tex_coords.len()),
            ("rotation groups", rotation_groups.len()),
        ] {
            if actual != expected {
                return Err(RenderError::LengthMismatch {
                    what,
                    expected,
                    actual,
                });
            }
        }

        self.positions = positions;
        self.tex_coords = tex_coords;
        self.rotation_groups = rotation_groups;
        self.upload(device, program)
    }

    /// Sets the object-wide rotation. `pivot` must already be in NDC units.
    pub fn set_global_rotation<P: ShaderProgram>(
        &mut self,
        program: &mut P,
        pivot: Vec2,
        radians: f32,
    ) -> Result<(), RenderError> {
        self.rotation = Rotation::around(pivot, radians);
        program.set_uniform(UNIFORM_ROTATION, UniformValue::Vec4(self.rotation.to_array()))
    }

    /// Sets the object-wide translation. `offset` must already be in NDC units.
    pub fn set_global_translation<P: ShaderProgram>(
        &mut self,
        program: &mut P,
        offset: Vec2,
    ) -> Result<(), RenderError> {
        self.translation = offset;
        program.set_uniform(UNIFORM_TRANSLATION, UniformValue::Vec2(offset.to_array()))
    }

    /// Pushes the stored global transform to `program`.
    pub fn push_uniforms<P: ShaderProgram>(&self, program: &mut P) -> Result<(), RenderError> {
        program.set_uniform(UNIFORM_ROTATION, UniformValue::Vec4(self.rotation.to_array()))?;
        program.set_uniform(UNIFORM_TRANSLATION, UniformValue::Vec2(self.translation.to_array()))
    }

    /// Rotates vertices `start..=end` around `pivot` (pixels).
    ///
    /// CPU side only; reaches the GPU with the next upload.
    pub fn set_group_rotation(
        &mut self,
        pivot: Vec2,
        radians: f32,
        start: u32,
        end: u32,
    ) -> Result<(), RenderError> {
        if start > end || end >= self.capacity {
            return Err(RenderError::InvalidRange {
                start,
                end,
                capacity: self.capacity,
            });
        }

        let rotation = Rotation::around(pivot, radians);
        self.rotation_groups[start as usize..=end as usize].fill(rotation);
        Ok(())
    }

    /// Rotates every vertex slot around `pivot` (pixels).
    pub fn set_all_group_rotation(&mut self, pivot: Vec2, radians: f32) {
        self.rotation_groups.fill(Rotation::around(pivot, radians));
    }

    /// Puts every rotation group back to identity.
    pub fn reset_group_rotation(&mut self) {
        self.rotation_groups.fill(Rotation::IDENTITY);
    }

    /// Frees the GPU buffers. The CPU copy stays readable.
    pub fn release<D>(&mut self, device: &mut D)
    where
        D: GraphicsDevice<Buffers = B>,
    {
        match self.gpu.take() {
            Some(buffers) => device.release_buffers(buffers),
            None => log::debug!("release on a store without GPU buffers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::{HeadlessBuffers, HeadlessCall, HeadlessContext, HeadlessProgram};

    fn setup(capacity: u32) -> (HeadlessContext, HeadlessProgram, VertexStore<HeadlessBuffers>) {
        let mut ctx = HeadlessContext::default();
        let program = ctx.compile_program("v", "f").unwrap();
        (ctx, program, VertexStore::new(capacity))
    }

    // ── allocation ────────────────────────────────────────────────────────

    #[test]
    fn new_store_defaults_to_identity_groups() {
        let (_, _, store) = setup(12);
        assert_eq!(store.positions().len(), 12);
        assert_eq!(store.tex_coords().len(), 12);
        assert!(store.rotation_groups().iter().all(|r| *r == Rotation::IDENTITY));
        assert!(!store.is_allocated());
    }

    #[test]
    fn allocate_twice_fails() {
        let (mut ctx, mut program, mut store) = setup(6);
        store.allocate(&mut ctx, &mut program).unwrap();
        let err = store.allocate(&mut ctx, &mut program).unwrap_err();
        assert!(matches!(err, RenderError::AlreadyAllocated { capacity: 6 }));
    }

    #[test]
    fn allocate_resolves_attribute_slots() {
        let (mut ctx, mut program, mut store) = setup(6);
        store.allocate(&mut ctx, &mut program).unwrap();
        let slots = store.buffers().unwrap().slots;
        assert_eq!((slots.position, slots.tex_coord, slots.rotation_group), (0, 1, 2));
    }

    #[test]
    fn update_indexed_allocates_lazily() {
        let (mut ctx, mut program, mut store) = setup(12);
        let probe = ctx.probe();
        store
            .update_indexed(&mut ctx, &mut program, 6, &[[1.0, 2.0]; 6], &[[0.5, 0.5]; 6])
            .unwrap();

        assert!(store.is_allocated());
        let creates =
            probe.count(|c| matches!(c, HeadlessCall::CreateBuffers { capacity: 12, .. }));
        assert_eq!(creates, 1);
        assert_eq!(store.positions()[5], [0.0, 0.0]);
        assert_eq!(store.positions()[6], [1.0, 2.0]);
        assert_eq!(store.tex_coords()[11], [0.5, 0.5]);
    }

    #[test]
    fn every_write_uploads_the_whole_store() {
        let (mut ctx, mut program, mut store) = setup(12);
        let probe = ctx.probe();
        store.allocate(&mut ctx, &mut program).unwrap();
        store.update_positions(&mut ctx, &mut program, 0, &[[3.0, 4.0]; 6]).unwrap();

        let id = store.buffers().unwrap().id;
        let snapshot = probe.last_upload(id).unwrap();
        assert_eq!(snapshot.positions.len(), 12);
        assert_eq!(snapshot.positions[0], [3.0, 4.0]);
        assert_eq!(probe.count(|c| matches!(c, HeadlessCall::Upload { .. })), 2);
    }

    // ── range checks ──────────────────────────────────────────────────────

    #[test]
    fn write_past_capacity_is_rejected_without_mutation() {
        let (mut ctx, mut program, mut store) = setup(6);
        let err = store
            .update_indexed(&mut ctx, &mut program, 3, &[[9.0, 9.0]; 6], &[[9.0, 9.0]; 6])
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidRange { start: 3, end: 8, capacity: 6 }));
        assert!(store.positions().iter().all(|p| *p == [0.0, 0.0]));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let (mut ctx, mut program, mut store) = setup(6);
        let err = store
            .update_indexed(&mut ctx, &mut program, 0, &[[0.0; 2]; 6], &[[0.0; 2]; 3])
            .unwrap_err();
        assert!(matches!(err, RenderError::LengthMismatch { expected: 6, actual: 3, .. }));
    }

    #[test]
    fn update_whole_requires_full_arrays() {
        let (mut ctx, mut program, mut store) = setup(6);
        let err = store
            .update_whole(&mut ctx, &mut program, vec![[0.0; 2]; 6], vec![[0.0; 2]; 6], vec![])
            .unwrap_err();
        assert!(matches!(err, RenderError::LengthMismatch { what: "rotation groups", .. }));

        store
            .update_whole(
                &mut ctx,
                &mut program,
                vec![[1.0; 2]; 6],
                vec![[0.5; 2]; 6],
                vec![Rotation::IDENTITY; 6],
            )
            .unwrap();
        assert!(store.positions().iter().all(|p| *p == [1.0, 1.0]));
    }

    // ── rotation groups ───────────────────────────────────────────────────

    #[test]
    fn group_rotation_range_is_inclusive() {
        let (_, _, mut store) = setup(12);
        store.set_group_rotation(Vec2::new(10.0, 10.0), 1.0, 6, 11).unwrap();

        assert_eq!(store.group_rotation(5), Some(Rotation::IDENTITY));
        let expected = Rotation::around(Vec2::new(10.0, 10.0), 1.0);
        assert_eq!(store.group_rotation(6), Some(expected));
        assert_eq!(store.group_rotation(11), Some(expected));
    }

    #[test]
    fn group_rotation_end_must_be_in_range() {
        let (_, _, mut store) = setup(12);
        let err = store.set_group_rotation(Vec2::zero(), 1.0, 0, 12).unwrap_err();
        assert!(matches!(err, RenderError::InvalidRange { end: 12, capacity: 12, .. }));
    }

    #[test]
    fn reset_returns_every_slot_to_identity() {
        let (_, _, mut store) = setup(12);
        store.set_all_group_rotation(Vec2::new(1.0, 2.0), 0.5);
        store.reset_group_rotation();
        for i in 0..12 {
            assert_eq!(store.group_rotation(i).map(Rotation::to_array), Some([0.0, 0.0, 1.0, 0.0]));
        }
        assert_eq!(store.group_rotation(12), None);
    }

    // ── global transform ──────────────────────────────────────────────────

    #[test]
    fn global_transform_is_pushed_as_uniforms() {
        let (_, mut program, mut store) = setup(6);
        store.set_global_translation(&mut program, Vec2::new(0.5, -0.25)).unwrap();
        store.set_global_rotation(&mut program, Vec2::new(1.0, 1.0), 0.0).unwrap();

        assert_eq!(program.uniform("trans"), Some(UniformValue::Vec2([0.5, -0.25])));
        assert_eq!(program.uniform("rot"), Some(UniformValue::Vec4([1.0, 1.0, 1.0, 0.0])));
        assert_eq!(store.translation(), Vec2::new(0.5, -0.25));
    }

    #[test]
    fn release_frees_buffers_once() {
        let (mut ctx, mut program, mut store) = setup(6);
        let probe = ctx.probe();
        store.allocate(&mut ctx, &mut program).unwrap();
        store.release(&mut ctx);
        store.release(&mut ctx);
        assert!(!store.is_allocated());
        assert_eq!(probe.count(|c| matches!(c, HeadlessCall::ReleaseBuffers { .. })), 1);
    }
}
