//! Lux Renderer - local light transport for a CPU path tracer.
//!
//! Provides the pieces an integrator strings together:
//!
//! - The BSDF family (mirror, rough conductor, glass, refraction, emission),
//!   all evaluated and sampled in a local shading frame with the normal on +Z
//! - An environment light that importance-samples an equirectangular HDR
//!   image proportionally to radiance times solid angle
//!
//! Everything here is immutable after construction. Random numbers come in
//! through an explicit `&mut dyn RngCore`, so one BSDF or light can be shared
//! by any number of render threads.

mod bsdf;
mod environment_light;
mod microfacet;
pub mod sampling;

pub use bsdf::{
    bsdf_from_material, reflect, refract, Bsdf, BsdfSample, EmissionBsdf, GlassBsdf, MirrorBsdf,
    RefractionBsdf,
};
pub use environment_light::{EnvironmentLight, LightError, LightSample};
pub use microfacet::MicrofacetBsdf;

/// Re-export common math types from lux_math
pub use lux_math::{ShadingFrame, Spectrum, Vec2, Vec3};
