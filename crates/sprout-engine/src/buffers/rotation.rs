use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;

/// Rotation descriptor `(pivot_x, pivot_y, cos θ, sin θ)`.
///
/// Uploaded as-is: one entry per vertex for group rotations, and as the `rot`
/// uniform for the object-wide rotation.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Rotation {
    pub pivot: [f32; 2],
    pub cos: f32,
    pub sin: f32,
}

impl Rotation {
    /// No rotation: `(0, 0, 1, 0)`.
    pub const IDENTITY: Rotation = Rotation {
        pivot: [0.0, 0.0],
        cos: 1.0,
        sin: 0.0,
    };

    /// Rotation by `radians` around `pivot`.
    #[inline]
    pub fn around(pivot: Vec2, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            pivot: pivot.to_array(),
            cos,
            sin,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.pivot[0], self.pivot[1], self.cos, self.sin]
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_angle_is_identity_rotation() {
        let r = Rotation::around(Vec2::zero(), 0.0);
        assert_eq!(r, Rotation::IDENTITY);
    }

    #[test]
    fn quarter_turn() {
        let r = Rotation::around(Vec2::new(5.0, 6.0), std::f32::consts::FRAC_PI_2);
        assert_eq!(r.pivot, [5.0, 6.0]);
        assert!(r.cos.abs() < 1e-6);
        assert!((r.sin - 1.0).abs() < 1e-6);
    }

    #[test]
    fn array_order_matches_shader_layout() {
        assert_eq!(Rotation::IDENTITY.to_array(), [0.0, 0.0, 1.0, 0.0]);
    }
}
