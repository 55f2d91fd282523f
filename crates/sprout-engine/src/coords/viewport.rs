use super::Vec2;

/// Surface size in logical pixels.
///
/// Renderers treat this as the basis for converting pixel positions to NDC.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Scales a pixel offset into normalized device units.
    ///
    /// `nx = x / (width / 2)`, `ny = y / (height / 2)`. The mapping is linear and
    /// keeps the origin fixed; the shader re-centers it. Only used for global
    /// transform uniforms (translation, rotation pivot).
    #[inline]
    pub fn pixel_to_ndc(self, p: Vec2) -> Vec2 {
        Vec2::new(p.x / (self.width / 2.0), p.y / (self.height / 2.0))
    }

    /// Returns the viewport as a `[width, height]` uniform value.
    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.width, self.height]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VP: Viewport = Viewport::new(800.0, 600.0);

    #[test]
    fn origin_maps_to_origin() {
        assert_eq!(VP.pixel_to_ndc(Vec2::zero()), Vec2::zero());
    }

    #[test]
    fn half_extent_maps_to_one() {
        assert_eq!(VP.pixel_to_ndc(Vec2::new(400.0, 300.0)), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn full_extent_maps_to_two() {
        assert_eq!(VP.pixel_to_ndc(Vec2::new(800.0, 600.0)), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn conversion_is_linear() {
        let a = Vec2::new(120.0, -45.0);
        let b = Vec2::new(-30.0, 210.0);
        let sum = VP.pixel_to_ndc(a + b);
        let parts = VP.pixel_to_ndc(a) + VP.pixel_to_ndc(b);
        assert!((sum.x - parts.x).abs() < 1e-6);
        assert!((sum.y - parts.y).abs() < 1e-6);
    }

    #[test]
    fn is_valid_rejects_zero_size() {
        assert!(!Viewport::new(0.0, 600.0).is_valid());
        assert!(VP.is_valid());
    }
}
