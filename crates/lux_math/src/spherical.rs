//! Equirectangular sphere parameterization.
//!
//! `theta` is the polar angle measured from +Y, `phi` the azimuth in
//! `[0, 2pi]`. The trigonometry runs in `f64` so that a direction survives
//! `dir -> (theta, phi) -> dir` even next to the poles, where `acos` is
//! badly conditioned in single precision.

use crate::{DVec3, Vec2, Vec3};
use std::f64::consts::PI;

/// Convert a direction to `(theta, phi)`. The direction need not be unit length.
pub fn dir_to_theta_phi(dir: Vec3) -> Vec2 {
    let d = dir.as_dvec3().normalize();
    let theta = d.y.clamp(-1.0, 1.0).acos();
    let phi = (-d.z).atan2(d.x) + PI;
    Vec2::new(theta as f32, phi as f32)
}

/// Convert `(theta, phi)` back to a unit direction.
pub fn theta_phi_to_dir(theta_phi: Vec2) -> Vec3 {
    let theta = theta_phi.x as f64;
    let phi = theta_phi.y as f64;

    let sin_theta = theta.sin();
    let d = DVec3::new(
        (phi - PI).cos() * sin_theta,
        theta.cos(),
        -(phi - PI).sin() * sin_theta,
    );
    d.as_vec3()
}
