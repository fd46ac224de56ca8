//! BSDF trait and the specular surface models.
//!
//! Every routine works in the local shading frame: the normal is +Z, and
//! `wo` / `wi` point away from the surface. A positive `z` means the
//! direction is on the same side as the outward normal.

use lux_core::Material;
use lux_math::frame::abs_cos_theta;
use lux_math::{Spectrum, Vec3};
use rand::RngCore;

use crate::microfacet::MicrofacetBsdf;
use crate::sampling::{coin_flip, cosine_hemisphere, uniform_2d};

/// Result of importance-sampling a BSDF.
///
/// The Monte Carlo contribution is `value * |cos(wi)| / pdf`. For delta
/// lobes `pdf` is a probability mass rather than a density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsdfSample {
    /// Sampled incident direction (local frame)
    pub wi: Vec3,
    /// Density (or mass) of `wi`; zero means the sample contributes nothing
    pub pdf: f32,
    /// BSDF value for `(wo, wi)`
    pub value: Spectrum,
}

impl BsdfSample {
    /// A sample that carries no energy.
    pub fn rejected(wi: Vec3) -> Self {
        Self {
            wi,
            pdf: 0.0,
            value: Spectrum::ZERO,
        }
    }

    /// False when the caller must not divide by `pdf`.
    pub fn is_valid(&self) -> bool {
        self.pdf > 0.0 && self.pdf.is_finite() && self.value.is_finite()
    }
}

/// Scattering behaviour of a surface.
///
/// Implementations are immutable and hold no random state, so a single
/// instance can be shared across render threads.
pub trait Bsdf: Send + Sync {
    /// BSDF value for the pair `(wo, wi)`.
    ///
    /// Delta lobes cannot be hit by an arbitrary direction and return zero.
    fn evaluate(&self, wo: Vec3, wi: Vec3) -> Spectrum;

    /// Draw an incident direction for `wo`.
    fn sample(&self, wo: Vec3, rng: &mut dyn RngCore) -> BsdfSample;

    /// Radiance emitted by the surface itself.
    fn emission(&self) -> Spectrum {
        Spectrum::ZERO
    }

    /// True if every lobe is a delta distribution (mirror, smooth glass).
    fn is_delta(&self) -> bool {
        false
    }
}

/// Build the runtime BSDF for a material description.
pub fn bsdf_from_material(material: &Material) -> Box<dyn Bsdf> {
    match *material {
        Material::Mirror { reflectance } => Box::new(MirrorBsdf::new(reflectance)),
        Material::Microfacet { eta, k, alpha } => Box::new(MicrofacetBsdf::new(eta, k, alpha)),
        Material::Refraction { transmittance, ior } => {
            Box::new(RefractionBsdf::new(transmittance, ior))
        }
        Material::Glass {
            reflectance,
            transmittance,
            ior,
        } => Box::new(GlassBsdf::new(reflectance, transmittance, ior)),
        Material::Emission { radiance } => Box::new(EmissionBsdf::new(radiance)),
    }
}

// =============================================================================
// Mirror
// =============================================================================

/// Perfect specular reflector.
#[derive(Debug, Clone)]
pub struct MirrorBsdf {
    reflectance: Spectrum,
}

impl MirrorBsdf {
    pub fn new(reflectance: Spectrum) -> Self {
        Self { reflectance }
    }
}

impl Bsdf for MirrorBsdf {
    fn evaluate(&self, _wo: Vec3, _wi: Vec3) -> Spectrum {
        Spectrum::ZERO
    }

    fn sample(&self, wo: Vec3, _rng: &mut dyn RngCore) -> BsdfSample {
        let wi = reflect(wo);
        BsdfSample {
            wi,
            pdf: 1.0,
            value: specular_value(self.reflectance, wi),
        }
    }

    fn is_delta(&self) -> bool {
        true
    }
}

// =============================================================================
// Refraction
// =============================================================================

/// Transmission-only lobe.
///
/// Kept as a building block for glass; on its own it scatters nothing.
#[derive(Debug, Clone)]
pub struct RefractionBsdf {
    transmittance: Spectrum,
    ior: f32,
}

impl RefractionBsdf {
    pub fn new(transmittance: Spectrum, ior: f32) -> Self {
        Self { transmittance, ior }
    }

    pub fn transmittance(&self) -> Spectrum {
        self.transmittance
    }

    pub fn ior(&self) -> f32 {
        self.ior
    }
}

impl Bsdf for RefractionBsdf {
    fn evaluate(&self, _wo: Vec3, _wi: Vec3) -> Spectrum {
        Spectrum::ZERO
    }

    fn sample(&self, wo: Vec3, _rng: &mut dyn RngCore) -> BsdfSample {
        let wi = refract(wo, self.ior).unwrap_or_else(|| reflect(wo));
        BsdfSample::rejected(wi)
    }

    fn is_delta(&self) -> bool {
        true
    }
}

// =============================================================================
// Glass
// =============================================================================

/// Smooth dielectric: reflects or refracts, chosen by Schlick's Fresnel.
#[derive(Debug, Clone)]
pub struct GlassBsdf {
    reflectance: Spectrum,
    /// Transmitted lobe; its index of refraction is the glass's
    refraction: RefractionBsdf,
}

impl GlassBsdf {
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(reflectance: Spectrum, transmittance: Spectrum, ior: f32) -> Self {
        Self {
            reflectance,
            refraction: RefractionBsdf::new(transmittance, ior),
        }
    }

    /// Schlick's approximation for reflectance
    fn schlick(&self, cos_theta: f32) -> f32 {
        let ior = self.refraction.ior();
        let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cos_theta).powi(5)
    }
}

impl Bsdf for GlassBsdf {
    fn evaluate(&self, _wo: Vec3, _wi: Vec3) -> Spectrum {
        Spectrum::ZERO
    }

    fn sample(&self, wo: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        let ior = self.refraction.ior();
        let Some(refracted) = refract(wo, ior) else {
            // Total internal reflection
            let wi = reflect(wo);
            return BsdfSample {
                wi,
                pdf: 1.0,
                value: specular_value(self.reflectance, wi),
            };
        };

        let r = self.schlick(abs_cos_theta(wo));

        if coin_flip(rng, r) {
            let wi = reflect(wo);
            BsdfSample {
                wi,
                pdf: r,
                value: r * specular_value(self.reflectance, wi),
            }
        } else {
            // Radiance is compressed or expanded by eta^2 across the interface
            let eta = if wo.z >= 0.0 { 1.0 / ior } else { ior };
            let transmitted = specular_value(self.refraction.transmittance(), refracted);
            BsdfSample {
                wi: refracted,
                pdf: 1.0 - r,
                value: (1.0 - r) * transmitted / (eta * eta),
            }
        }
    }

    fn is_delta(&self) -> bool {
        true
    }
}

// =============================================================================
// Emission
// =============================================================================

/// Light-emitting surface. Reflects nothing.
#[derive(Debug, Clone)]
pub struct EmissionBsdf {
    radiance: Spectrum,
}

impl EmissionBsdf {
    pub fn new(radiance: Spectrum) -> Self {
        Self { radiance }
    }
}

impl Bsdf for EmissionBsdf {
    fn evaluate(&self, _wo: Vec3, _wi: Vec3) -> Spectrum {
        Spectrum::ZERO
    }

    fn sample(&self, _wo: Vec3, rng: &mut dyn RngCore) -> BsdfSample {
        let (wi, pdf) = cosine_hemisphere(uniform_2d(rng));
        BsdfSample {
            wi,
            pdf,
            value: Spectrum::ZERO,
        }
    }

    fn emission(&self) -> Spectrum {
        self.radiance
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Mirror `wo` about the +Z normal.
#[inline]
pub fn reflect(wo: Vec3) -> Vec3 {
    Vec3::new(-wo.x, -wo.y, wo.z)
}

/// Refract `wo` through the surface using Snell's law.
///
/// `ior` is the index inside the surface relative to outside; the ratio is
/// inverted when `wo` starts inside (`wo.z < 0`). Returns `None` on total
/// internal reflection.
pub fn refract(wo: Vec3, ior: f32) -> Option<Vec3> {
    let factor = if wo.z >= 0.0 { 1.0 / ior } else { ior };
    let cos2_t = 1.0 - factor * factor * (1.0 - wo.z * wo.z);
    if cos2_t < 0.0 {
        return None;
    }

    let cos_t = cos2_t.sqrt();
    let z = if wo.z >= 0.0 { -cos_t } else { cos_t };
    Some(Vec3::new(-factor * wo.x, -factor * wo.y, z))
}

/// `s / |cos(wi)|`, or zero for a grazing `wi` where the quotient blows up.
#[inline]
fn specular_value(s: Spectrum, wi: Vec3) -> Spectrum {
    let cos = abs_cos_theta(wi);
    if cos > 0.0 {
        s / cos
    } else {
        Spectrum::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hemisphere_dirs() -> Vec<Vec3> {
        let mut dirs = vec![Vec3::Z, Vec3::X, Vec3::new(0.0, 1.0, 0.0)];
        for i in 0..16 {
            let phi = i as f32 * 0.39;
            for cos in [0.05f32, 0.3, 0.7, 0.99] {
                let sin = (1.0 - cos * cos).sqrt();
                dirs.push(Vec3::new(sin * phi.cos(), sin * phi.sin(), cos));
            }
        }
        dirs
    }

    #[test]
    fn test_reflect() {
        let wo = Vec3::new(0.3, -0.4, 0.866);
        assert_eq!(reflect(wo), Vec3::new(-0.3, 0.4, 0.866));
    }

    #[test]
    fn test_mirror_sample() {
        let mirror = MirrorBsdf::new(Spectrum::new(0.9, 0.8, 0.7));
        let mut rng = StdRng::seed_from_u64(0);

        for wo in hemisphere_dirs() {
            let s = mirror.sample(wo, &mut rng);
            assert_eq!(s.wi.z, wo.z);
            assert_eq!(s.wi.x, -wo.x);
            assert_eq!(s.wi.y, -wo.y);
            assert_eq!(s.pdf, 1.0);
            assert!(s.value.is_finite());
        }

        // value * cos / pdf recovers the reflectance
        let wo = Vec3::new(0.6, 0.0, 0.8);
        let s = mirror.sample(wo, &mut rng);
        let weight = s.value * s.wi.z.abs() / s.pdf;
        assert!((weight - Spectrum::new(0.9, 0.8, 0.7)).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_mirror_evaluate_is_zero() {
        let mirror = MirrorBsdf::new(Spectrum::ONE);
        let wo = Vec3::new(0.6, 0.0, 0.8);
        assert_eq!(mirror.evaluate(wo, reflect(wo)), Spectrum::ZERO);
        assert!(mirror.is_delta());
    }

    #[test]
    fn test_refract_tir_boundary() {
        let ior = 1.5;
        for i in 0..=200 {
            // Sweep from straight up to grazing, from inside the glass
            let cos = -(i as f32) / 200.0;
            let sin = (1.0 - cos * cos).max(0.0).sqrt();
            let wo = Vec3::new(sin, 0.0, cos);

            let factor = if wo.z >= 0.0 { 1.0 / ior } else { ior };
            let tir = 1.0 - factor * factor * (1.0 - wo.z * wo.z) < 0.0;
            assert_eq!(refract(wo, ior).is_none(), tir, "wo={:?}", wo);
        }
    }

    #[test]
    fn test_refract_entering_never_tir() {
        for wo in hemisphere_dirs() {
            assert!(refract(wo, 1.5).is_some());
        }
    }

    #[test]
    fn test_refract_unit_and_opposite_side() {
        for wo in hemisphere_dirs() {
            let wi = refract(wo, 1.5).unwrap();
            assert!((wi.length() - 1.0).abs() < 1e-5, "wi={:?}", wi);
            assert!(wi.z < 0.0);
        }
    }

    #[test]
    fn test_refract_reversible() {
        // Skip grazing directions, where the return trip sits right at the TIR edge
        for wo in hemisphere_dirs().into_iter().filter(|w| w.z > 0.01) {
            let wi = refract(wo, 1.5).unwrap();
            // Coming back out from inside flips the ratio automatically
            let back = refract(wi, 1.5).unwrap();
            assert!((back - wo).length() < 1e-4, "wo={:?} back={:?}", wo, back);
        }
    }

    #[test]
    fn test_refract_snell() {
        let wo = Vec3::new(0.5, 0.0, 0.75f32.sqrt());
        let wi = refract(wo, 1.5).unwrap();
        // sin(theta_t) = sin(theta_i) / ior
        let sin_t = (wi.x * wi.x + wi.y * wi.y).sqrt();
        assert!((sin_t - 0.5 / 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_glass_normal_incidence_ratio() {
        let glass = GlassBsdf::new(Spectrum::ONE, Spectrum::ONE, 1.5);
        let mut rng = StdRng::seed_from_u64(42);
        let wo = Vec3::Z;

        let n = 100_000;
        let mut reflected = 0;
        for _ in 0..n {
            let s = glass.sample(wo, &mut rng);
            if s.wi.z > 0.0 {
                assert_eq!(s.wi, Vec3::Z);
                reflected += 1;
            } else {
                assert_eq!(s.wi, -Vec3::Z);
            }
        }

        let r0 = ((1.0f32 - 1.5) / (1.0 + 1.5)).powi(2);
        let fraction = reflected as f32 / n as f32;
        assert!((fraction - r0).abs() < 0.005, "fraction={} r0={}", fraction, r0);
    }

    #[test]
    fn test_glass_branch_pdfs() {
        let glass = GlassBsdf::new(Spectrum::ONE, Spectrum::ONE, 1.5);
        let mut rng = StdRng::seed_from_u64(5);
        let wo = Vec3::new(0.6, 0.0, 0.8);
        let r = glass.schlick(0.8);

        for _ in 0..200 {
            let s = glass.sample(wo, &mut rng);
            if s.wi.z > 0.0 {
                assert!((s.pdf - r).abs() < 1e-6);
                // value / pdf = reflectance / cos
                assert!((s.value.x / s.pdf - 1.0 / 0.8).abs() < 1e-5);
            } else {
                assert!((s.pdf - (1.0 - r)).abs() < 1e-6);
                // Entering glass: eta = 1/1.5, so the 1/eta^2 factor is 2.25
                let expected = 2.25 / s.wi.z.abs();
                assert!((s.value.x / s.pdf - expected).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_glass_total_internal_reflection() {
        let glass = GlassBsdf::new(Spectrum::splat(0.5), Spectrum::ONE, 1.5);
        let mut rng = StdRng::seed_from_u64(9);
        // Inside the glass at a grazing angle
        let wo = Vec3::new(0.9, 0.0, -(1.0f32 - 0.81).sqrt());
        assert!(refract(wo, 1.5).is_none());

        for _ in 0..50 {
            let s = glass.sample(wo, &mut rng);
            assert_eq!(s.wi, reflect(wo));
            assert_eq!(s.pdf, 1.0);
            assert!((s.value.x - 0.5 / wo.z.abs()).abs() < 1e-5);
        }
    }

    #[test]
    fn test_glass_refracted_value_uses_transmittance() {
        let tint = Spectrum::new(0.2, 0.4, 0.6);
        let glass = GlassBsdf::new(Spectrum::ONE, tint, 1.5);
        let mut rng = StdRng::seed_from_u64(31);
        let r = glass.schlick(1.0);

        let s = (0..100)
            .map(|_| glass.sample(Vec3::Z, &mut rng))
            .find(|s| s.wi.z < 0.0)
            .unwrap();
        assert_eq!(s.wi, -Vec3::Z);
        // Entering the denser medium scales radiance by ior^2
        let expected = (1.0 - r) * tint * 1.5 * 1.5;
        assert!((s.value - expected).abs().max_element() < 1e-5, "value={:?}", s.value);
    }

    #[test]
    fn test_refraction_stub() {
        let bsdf = RefractionBsdf::new(Spectrum::ONE, 1.5);
        let mut rng = StdRng::seed_from_u64(0);
        let s = bsdf.sample(Vec3::Z, &mut rng);
        assert_eq!(s.pdf, 0.0);
        assert_eq!(s.value, Spectrum::ZERO);
        assert!(!s.is_valid());
        assert_eq!(bsdf.evaluate(Vec3::Z, -Vec3::Z), Spectrum::ZERO);
    }

    #[test]
    fn test_emission() {
        let bsdf = EmissionBsdf::new(Spectrum::splat(3.0));
        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(bsdf.emission(), Spectrum::splat(3.0));
        assert_eq!(bsdf.evaluate(Vec3::Z, Vec3::Z), Spectrum::ZERO);

        for _ in 0..100 {
            let s = bsdf.sample(Vec3::Z, &mut rng);
            assert!(s.wi.z >= 0.0);
            assert!((s.pdf - s.wi.z / std::f32::consts::PI).abs() < 1e-6);
            assert_eq!(s.value, Spectrum::ZERO);
        }
    }

    #[test]
    fn test_from_material() {
        let json = r#"[
            { "type": "mirror" },
            { "type": "glass", "ior": 1.33 },
            { "type": "refraction" },
            { "type": "microfacet", "eta": [0.2, 0.9, 1.1], "k": [3.9, 2.4, 2.2], "alpha": 0.3 },
            { "type": "emission", "radiance": [5.0, 5.0, 5.0] }
        ]"#;
        let materials: Vec<Material> = serde_json::from_str(json).unwrap();
        let bsdfs: Vec<Box<dyn Bsdf>> = materials.iter().map(bsdf_from_material).collect();

        let delta: Vec<bool> = bsdfs.iter().map(|b| b.is_delta()).collect();
        assert_eq!(delta, vec![true, true, true, false, false]);
        assert_eq!(bsdfs[4].emission(), Spectrum::splat(5.0));
        assert_eq!(bsdfs[0].emission(), Spectrum::ZERO);
    }
}
