use std::collections::HashMap;

use crate::backend::{GraphicsDevice, TextureCache};
use crate::coords::Viewport;
use crate::error::RenderError;

use super::{ObjectDesc, ObjectId, RenderObject};

/// Registry of live render objects, owned by the render thread.
///
/// Objects draw in creation order. `teardown` releases everything once; the
/// world is empty (and reusable) afterwards.
pub struct World<D: GraphicsDevice> {
    objects: Vec<RenderObject<D>>,
    by_id: HashMap<ObjectId, usize>,
    textures: TextureCache<D::Texture>,
}

impl<D: GraphicsDevice> World<D> {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            by_id: HashMap::new(),
            textures: TextureCache::new(),
        }
    }

    pub fn create_object(
        &mut self,
        device: &mut D,
        id: ObjectId,
        desc: &ObjectDesc,
    ) -> Result<&mut RenderObject<D>, RenderError> {
        if self.by_id.contains_key(&id) {
            return Err(RenderError::DuplicateObject(id));
        }

        let object = RenderObject::create(device, &mut self.textures, id, desc)?;
        let slot = self.objects.len();
        self.objects.push(object);
        self.by_id.insert(id, slot);
        Ok(&mut self.objects[slot])
    }

    pub fn get(&self, id: ObjectId) -> Option<&RenderObject<D>> {
        self.by_id.get(&id).map(|&slot| &self.objects[slot])
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut RenderObject<D>, RenderError> {
        match self.by_id.get(&id) {
            Some(&slot) => Ok(&mut self.objects[slot]),
            None => Err(RenderError::UnknownObject(id)),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn textures(&self) -> &TextureCache<D::Texture> {
        &self.textures
    }

    pub fn draw_all(&mut self, device: &mut D) -> Result<(), RenderError> {
        for object in &mut self.objects {
            object.draw(device)?;
        }
        Ok(())
    }

    /// Propagates a surface size change to every object.
    pub fn resize(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        for object in &mut self.objects {
            object.resize(viewport)?;
        }
        Ok(())
    }

    /// Releases every object's GPU buffers and forgets all textures.
    pub fn teardown(&mut self, device: &mut D) {
        let count = self.objects.len();
        for mut object in self.objects.drain(..) {
            object.release(device);
        }
        self.by_id.clear();
        self.textures.clear();
        log::info!("released {count} render object(s)");
    }
}

impl<D: GraphicsDevice> Default for World<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::{HeadlessCall, HeadlessContext};
    use crate::coords::Vec2;
    use crate::object::SpriteQuad;

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut ctx = HeadlessContext::default();
        let mut world = World::new();
        world.create_object(&mut ctx, ObjectId(1), &ObjectDesc::new(6, "a.png")).unwrap();
        let err = world
            .create_object(&mut ctx, ObjectId(1), &ObjectDesc::new(6, "a.png"))
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::DuplicateObject(ObjectId(1))));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut world: World<HeadlessContext> = World::new();
        assert!(matches!(
            world.get_mut(ObjectId(9)).err(),
            Some(RenderError::UnknownObject(ObjectId(9)))
        ));
    }

    #[test]
    fn shared_texture_is_loaded_once() {
        let mut ctx = HeadlessContext::default();
        let probe = ctx.probe();
        let mut world = World::new();
        world.create_object(&mut ctx, ObjectId(1), &ObjectDesc::new(6, "a.png")).unwrap();
        world.create_object(&mut ctx, ObjectId(2), &ObjectDesc::new(6, "a.png")).unwrap();

        assert_eq!(probe.count(|c| matches!(c, HeadlessCall::LoadTexture { .. })), 1);
        assert_eq!(
            world.get(ObjectId(1)).unwrap().texture().handle,
            world.get(ObjectId(2)).unwrap().texture().handle
        );
    }

    #[test]
    fn draw_all_follows_creation_order() {
        let mut ctx = HeadlessContext::default();
        let probe = ctx.probe();
        let mut world = World::new();
        let quad = SpriteQuad::square(Vec2::zero(), 10.0, Vec2::zero(), 16.0);

        for id in [ObjectId(7), ObjectId(3)] {
            let obj = world.create_object(&mut ctx, id, &ObjectDesc::new(6, "a.png")).unwrap();
            obj.append(&mut ctx, quad).unwrap();
        }
        let expected: Vec<u64> = [ObjectId(7), ObjectId(3)]
            .iter()
            .map(|id| world.get(*id).unwrap().store().buffers().unwrap().id)
            .collect();

        world.draw_all(&mut ctx).unwrap();
        let drawn: Vec<u64> = probe
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                HeadlessCall::Draw { buffers, .. } => Some(buffers),
                _ => None,
            })
            .collect();
        assert_eq!(drawn, expected);
    }

    #[test]
    fn teardown_releases_everything() {
        let mut ctx = HeadlessContext::default();
        let probe = ctx.probe();
        let mut world = World::new();
        world.create_object(&mut ctx, ObjectId(1), &ObjectDesc::new(6, "a.png")).unwrap();
        world.create_object(&mut ctx, ObjectId(2), &ObjectDesc::new(6, "b.png")).unwrap();

        world.teardown(&mut ctx);
        assert!(world.is_empty());
        assert!(world.textures().is_empty());
        assert_eq!(probe.count(|c| matches!(c, HeadlessCall::ReleaseBuffers { .. })), 2);
    }
}
