use core::fmt;

use crate::geometry::QUAD_VERTEX_COUNT;

/// Identifier of a render object.
///
/// Allocated on the producer side so a handle can be returned before the
/// render thread has created the object.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to one sprite inside a render object, as returned by `append`.
///
/// Wraps the sprite's first vertex index (0, 6, 12, ...).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SpriteIndex(u32);

impl SpriteIndex {
    #[inline]
    pub const fn from_first_vertex(first_vertex: u32) -> Self {
        Self(first_vertex)
    }

    /// Handle of the `n`-th sprite appended to an object.
    #[inline]
    pub const fn nth(n: u32) -> Self {
        Self(n * QUAD_VERTEX_COUNT)
    }

    #[inline]
    pub const fn first_vertex(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn is_aligned(self) -> bool {
        self.0 % QUAD_VERTEX_COUNT == 0
    }
}

impl fmt::Display for SpriteIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nth_sprite_starts_six_vertices_apart() {
        assert_eq!(SpriteIndex::nth(0).first_vertex(), 0);
        assert_eq!(SpriteIndex::nth(2).first_vertex(), 12);
        assert_eq!(SpriteIndex::nth(3), SpriteIndex::from_first_vertex(18));
    }

    #[test]
    fn alignment() {
        assert!(SpriteIndex::from_first_vertex(6).is_aligned());
        assert!(!SpriteIndex::from_first_vertex(7).is_aligned());
    }
}
