//! Render objects and the registry that owns them.
//!
//! A render object is a fixed-capacity batch of sprites sharing one texture
//! and one shader program. Sprites are bump-allocated six vertices at a time
//! and never reclaimed; `clear` only collapses a sprite to zero area.

mod desc;
mod ids;
mod render_object;
mod world;

pub use desc::{ObjectDesc, ShaderSource, SpriteQuad};
pub use ids::{ObjectId, SpriteIndex};
pub use render_object::RenderObject;
pub use world::World;
