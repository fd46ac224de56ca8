use crate::Vec3;

/// RGB radiance / reflectance value (linear, non-negative).
///
/// glam's `Vec3` already provides per-channel add, multiply and divide.
pub type Spectrum = Vec3;

/// Luminance of a spectrum (Rec. 709).
#[inline]
pub fn luminance(s: Spectrum) -> f32 {
    0.2126 * s.x + 0.7152 * s.y + 0.0722 * s.z
}
