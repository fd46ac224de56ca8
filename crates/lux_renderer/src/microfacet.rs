//! Rough conductor BRDF.
//!
//! Cook-Torrance with the Beckmann normal distribution:
//!
//! ```text
//!     f(wo, wi) = F(wi) * G(wo, wi) * D(h) / (4 * cos(theta_o) * cos(theta_i))
//! ```
//!
//! where `h` is the normalized half vector, `G` the height-correlated Smith
//! shadowing-masking term and `F` the unpolarized Fresnel reflectance of a
//! conductor with complex index of refraction `eta + i k`.

use lux_math::frame::{cos2_theta, cos_theta, tan2_theta};
use lux_math::{Spectrum, Vec3};
use rand::RngCore;
use std::f32::consts::PI;

use crate::bsdf::{Bsdf, BsdfSample};
use crate::sampling::uniform_2d;

#[derive(Debug, Clone)]
pub struct MicrofacetBsdf {
    eta: Spectrum,
    k: Spectrum,
    alpha: f32,
}

impl MicrofacetBsdf {
    /// Create a rough conductor.
    ///
    /// - `eta`, `k`: Real and imaginary index of refraction, per channel
    /// - `alpha`: Beckmann roughness (RMS microfacet slope)
    pub fn new(eta: Spectrum, k: Spectrum, alpha: f32) -> Self {
        Self { eta, k, alpha }
    }

    /// Beckmann normal distribution.
    #[allow(non_snake_case, reason = "physics convention")]
    fn D(&self, h: Vec3) -> f32 {
        if cos_theta(h) <= 0.0 {
            return 0.0;
        }
        let a2 = self.alpha * self.alpha;
        let cos4 = cos2_theta(h) * cos2_theta(h);
        (-tan2_theta(h) / a2).exp() / (PI * a2 * cos4)
    }

    /// Beckmann Smith shadowing function.
    ///
    /// Evaluates the Beckmann closed form
    /// `(erf(a) - 1) / 2 + exp(-a^2) / (2 a sqrt(pi))` through the rational
    /// fit of Walter et al. 2007, the form pbrt's Beckmann distribution uses.
    /// The masking term `1 / (1 + lambda)` stays within 0.35% of exact and
    /// lambda vanishes for `a >= 1.6`.
    fn lambda(&self, w: Vec3) -> f32 {
        let abs_tan = tan2_theta(w).sqrt();
        if abs_tan.is_infinite() {
            return 0.0;
        }
        let a = 1.0 / (self.alpha * abs_tan);
        if a >= 1.6 {
            return 0.0;
        }
        (1.0 - 1.259 * a + 0.396 * a * a) / (3.535 * a + 2.181 * a * a)
    }

    #[allow(non_snake_case, reason = "physics convention")]
    fn G(&self, wo: Vec3, wi: Vec3) -> f32 {
        1.0 / (1.0 + self.lambda(wi) + self.lambda(wo))
    }

    /// Unpolarized Fresnel reflectance of the conductor, per channel.
    #[allow(non_snake_case, reason = "physics convention")]
    fn F(&self, wi: Vec3) -> Spectrum {
        let cos = cos_theta(wi);
        let cos2 = cos * cos;
        let eta_k2 = self.eta * self.eta + self.k * self.k;
        let two_eta_cos = 2.0 * cos * self.eta;

        let rs = (eta_k2 - two_eta_cos + Spectrum::splat(cos2))
            / (eta_k2 + two_eta_cos + Spectrum::splat(cos2));
        let rp = (eta_k2 * cos2 - two_eta_cos + Spectrum::ONE)
            / (eta_k2 * cos2 + two_eta_cos + Spectrum::ONE);

        (rs + rp) / 2.0
    }

    /// Density of the half vector `h`, per unit solid angle.
    ///
    /// With `p(theta, phi) = p(theta) / (2 pi)` the spherical density of the
    /// sampling routine, this is `p(theta, phi) / sin(theta)`, which reduces
    /// to `D(h) * cos(theta_h)`.
    fn half_vector_pdf(&self, h: Vec3) -> f32 {
        self.D(h) * cos_theta(h)
    }
}

impl Bsdf for MicrofacetBsdf {
    fn evaluate(&self, wo: Vec3, wi: Vec3) -> Spectrum {
        let (cos_o, cos_i) = (cos_theta(wo), cos_theta(wi));
        if cos_o <= 0.0 || cos_i <= 0.0 {
            return Spectrum::ZERO;
        }

        let h = (wo + wi).normalize();
        self.F(wi) * self.G(wo, wi) * self.D(h) / (4.0 * cos_o * cos_i)
    }

    fn sample(&self, wo: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        let u = uniform_2d(rng);

        let theta_h = (-(self.alpha * self.alpha) * (1.0 - u.x).ln()).sqrt().atan();
        let phi_h = 2.0 * PI * u.y;

        let (sin_t, cos_t) = theta_h.sin_cos();
        let (sin_p, cos_p) = phi_h.sin_cos();
        let h = Vec3::new(cos_p * sin_t, sin_p * sin_t, cos_t);

        let wo_dot_h = wo.dot(h);
        let wi = 2.0 * wo_dot_h * h - wo;

        if cos_theta(wo) <= 0.0 || cos_theta(wi) <= 0.0 {
            return BsdfSample::rejected(wi);
        }

        // Jacobian of the half-vector reflection
        let pdf = self.half_vector_pdf(h) / (4.0 * wo_dot_h.abs());

        BsdfSample {
            wi,
            pdf,
            value: self.evaluate(wo, wi),
        }
    }
}
