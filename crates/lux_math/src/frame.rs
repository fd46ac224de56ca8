//! Local shading frames.
//!
//! All BSDF math runs in a frame where the shading normal is +Z. A direction
//! `w` in that frame has `w.z == cos(theta)` with respect to the normal, and
//! the sign of `w.z` tells which side of the surface it lies on.

use crate::Vec3;

/// Orthonormal basis `(x, y, z)` with `z` equal to the shading normal.
///
/// Built per shading point and thrown away afterwards.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadingFrame {
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl ShadingFrame {
    /// Build a frame around the normal `n`.
    ///
    /// The helper vector is `n` with its smallest-magnitude component forced
    /// to 1, so it can never be parallel to `n`.
    pub fn from_normal(n: Vec3) -> Self {
        let z = n.normalize();

        let mut helper = n;
        let (ax, ay, az) = (n.x.abs(), n.y.abs(), n.z.abs());
        if ax <= ay && ax <= az {
            helper.x = 1.0;
        } else if ay <= ax && ay <= az {
            helper.y = 1.0;
        } else {
            helper.z = 1.0;
        }

        let y = helper.cross(z).normalize();
        let x = z.cross(y).normalize();

        Self { x, y, z }
    }

    /// Express a world-space direction in this frame.
    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.x), v.dot(self.y), v.dot(self.z))
    }

    /// Bring a local direction back to world space.
    #[inline]
    pub fn to_world(&self, v: Vec3) -> Vec3 {
        v.x * self.x + v.y * self.y + v.z * self.z
    }
}

// =============================================================================
// Local-frame trigonometry
// =============================================================================

#[inline]
pub fn cos_theta(w: Vec3) -> f32 {
    w.z
}

#[inline]
pub fn abs_cos_theta(w: Vec3) -> f32 {
    w.z.abs()
}

#[inline]
pub fn cos2_theta(w: Vec3) -> f32 {
    w.z * w.z
}

#[inline]
pub fn sin2_theta(w: Vec3) -> f32 {
    (1.0 - cos2_theta(w)).max(0.0)
}

#[inline]
pub fn sin_theta(w: Vec3) -> f32 {
    sin2_theta(w).sqrt()
}

/// Squared tangent of the polar angle. Infinite for grazing directions.
#[inline]
pub fn tan2_theta(w: Vec3) -> f32 {
    sin2_theta(w) / cos2_theta(w)
}
