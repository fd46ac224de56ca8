//! Sample warping helpers.
//!
//! The generator is always supplied by the caller; nothing in this crate owns
//! one.

use lux_math::{Vec2, Vec3};
use rand::{Rng, RngCore};
use std::f32::consts::PI;

/// Two independent uniforms in `[0, 1)`.
#[inline]
pub fn uniform_2d(rng: &mut dyn RngCore) -> Vec2 {
    Vec2::new(rng.gen::<f32>(), rng.gen::<f32>())
}

/// Returns true with probability `p`.
#[inline]
pub fn coin_flip(rng: &mut dyn RngCore, p: f32) -> bool {
    rng.gen::<f32>() < p
}

/// Map `u` to a point on the unit disk (uniform by area).
pub fn unit_disk(u: Vec2) -> Vec2 {
    let r = u.x.sqrt();
    let theta = 2.0 * PI * u.y;
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Cosine-weighted direction on the +Z hemisphere and its pdf `cos(theta) / pi`.
pub fn cosine_hemisphere(u: Vec2) -> (Vec3, f32) {
    let d = unit_disk(u);
    let z = (1.0 - d.x * d.x - d.y * d.y).max(0.0).sqrt();
    (Vec3::new(d.x, d.y, z), z / PI)
}
