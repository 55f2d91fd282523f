use crate::coords::{Rect, Vec2};
use crate::object::{ObjectDesc, ObjectId, SpriteIndex, SpriteQuad};

use super::Reply;

/// One mutation request, executed on the render thread.
///
/// Pixel coordinates throughout; the render object converts what it needs.
#[derive(Debug)]
pub enum Job {
    CreateObject {
        id: ObjectId,
        desc: ObjectDesc,
    },
    AppendSquare {
        object: ObjectId,
        position: Vec2,
        size: f32,
        tex_origin: Vec2,
        tex_size: f32,
        reply: Reply<SpriteIndex>,
    },
    AppendRect {
        object: ObjectId,
        quad: SpriteQuad,
        reply: Reply<SpriteIndex>,
    },
    ModifyVertex {
        object: ObjectId,
        index: SpriteIndex,
        dst: Rect,
    },
    ModifyTexcoord {
        object: ObjectId,
        index: SpriteIndex,
        src: Rect,
    },
    ModifyRegion {
        object: ObjectId,
        index: SpriteIndex,
        quad: SpriteQuad,
    },
    ClearSprite {
        object: ObjectId,
        index: SpriteIndex,
    },
    SetTranslation {
        object: ObjectId,
        offset: Vec2,
    },
    SetRotation {
        object: ObjectId,
        pivot: Vec2,
        radians: f32,
    },
    /// Inclusive vertex range.
    SetGroupRotation {
        object: ObjectId,
        pivot: Vec2,
        radians: f32,
        start: u32,
        end: u32,
    },
    SetAllGroupRotation {
        object: ObjectId,
        pivot: Vec2,
        radians: f32,
    },
    ResetGroupRotation {
        object: ObjectId,
    },
    /// Uploads the object's CPU arrays (allocating buffers if needed).
    Flush {
        object: ObjectId,
        reply: Reply<()>,
    },
}

impl Job {
    /// Object the job targets.
    pub fn object(&self) -> ObjectId {
        match self {
            Job::CreateObject { id, .. } => *id,
            Job::AppendSquare { object, .. }
            | Job::AppendRect { object, .. }
            | Job::ModifyVertex { object, .. }
            | Job::ModifyTexcoord { object, .. }
            | Job::ModifyRegion { object, .. }
            | Job::ClearSprite { object, .. }
            | Job::SetTranslation { object, .. }
            | Job::SetRotation { object, .. }
            | Job::SetGroupRotation { object, .. }
            | Job::SetAllGroupRotation { object, .. }
            | Job::ResetGroupRotation { object }
            | Job::Flush { object, .. } => *object,
        }
    }

    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Job::CreateObject { .. } => "create-object",
            Job::AppendSquare { .. } => "append-square",
            Job::AppendRect { .. } => "append-rect",
            Job::ModifyVertex { .. } => "modify-vertex",
            Job::ModifyTexcoord { .. } => "modify-texcoord",
            Job::ModifyRegion { .. } => "modify-region",
            Job::ClearSprite { .. } => "clear-sprite",
            Job::SetTranslation { .. } => "set-translation",
            Job::SetRotation { .. } => "set-rotation",
            Job::SetGroupRotation { .. } => "set-group-rotation",
            Job::SetAllGroupRotation { .. } => "set-all-group-rotation",
            Job::ResetGroupRotation { .. } => "reset-group-rotation",
            Job::Flush { .. } => "flush",
        }
    }
}
