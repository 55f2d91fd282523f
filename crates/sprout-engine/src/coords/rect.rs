use super::Vec2;

/// Axis-aligned rectangle in pixels (top-left origin).
///
/// Used both for screen regions and for texture regions; texture regions are in
/// texture pixels until converted with `geometry::pixel_to_texel`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Square with its top-left corner at `(x, y)`.
    #[inline]
    pub const fn square(x: f32, y: f32, size: f32) -> Self {
        Self::new(x, y, size, size)
    }

    /// Zero-area rectangle at the origin. Drawn as degenerate triangles.
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_has_equal_sides() {
        let r = Rect::square(3.0, 4.0, 10.0);
        assert_eq!(r, Rect::new(3.0, 4.0, 10.0, 10.0));
    }

    #[test]
    fn zero_has_no_area() {
        let r = Rect::zero();
        assert_eq!(r.origin, Vec2::zero());
        assert_eq!(r.size, Vec2::zero());
    }
}
