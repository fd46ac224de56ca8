//! Material descriptions.
//!
//! `Material` carries BSDF parameters as they appear in a scene file. The
//! renderer turns each description into a runtime BSDF.

use lux_math::Spectrum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum MaterialError {
    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("{field} must be non-negative and finite, got {value:?}")]
    InvalidSpectrum { field: &'static str, value: Spectrum },
}

/// BSDF parameters for each supported surface model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Material {
    /// Perfect specular reflector.
    Mirror {
        #[serde(default = "white")]
        reflectance: Spectrum,
    },

    /// Rough conductor (Cook-Torrance, Beckmann distribution).
    Microfacet {
        /// Real part of the complex index of refraction, per channel
        eta: Spectrum,
        /// Imaginary part (absorption), per channel
        k: Spectrum,
        /// Beckmann roughness
        #[serde(default = "default_alpha")]
        alpha: f32,
    },

    /// Transmission-only placeholder.
    Refraction {
        #[serde(default = "white")]
        transmittance: Spectrum,
        #[serde(default = "default_ior")]
        ior: f32,
    },

    /// Smooth dielectric that both reflects and refracts.
    Glass {
        #[serde(default = "white")]
        reflectance: Spectrum,
        #[serde(default = "white")]
        transmittance: Spectrum,
        #[serde(default = "default_ior")]
        ior: f32,
    },

    /// Area light surface.
    Emission { radiance: Spectrum },
}

fn white() -> Spectrum {
    Spectrum::ONE
}

fn default_ior() -> f32 {
    1.5
}

fn default_alpha() -> f32 {
    0.5
}

impl Material {
    /// Check that every parameter is physically meaningful.
    pub fn validate(&self) -> Result<(), MaterialError> {
        match self {
            Material::Mirror { reflectance } => check_spectrum("reflectance", *reflectance),
            Material::Microfacet { eta, k, alpha } => {
                check_spectrum("eta", *eta)?;
                check_spectrum("k", *k)?;
                check_positive("alpha", *alpha)
            }
            Material::Refraction { transmittance, ior } => {
                check_spectrum("transmittance", *transmittance)?;
                check_positive("ior", *ior)
            }
            Material::Glass {
                reflectance,
                transmittance,
                ior,
            } => {
                check_spectrum("reflectance", *reflectance)?;
                check_spectrum("transmittance", *transmittance)?;
                check_positive("ior", *ior)
            }
            Material::Emission { radiance } => check_spectrum("radiance", *radiance),
        }
    }
}

fn check_positive(field: &'static str, value: f32) -> Result<(), MaterialError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MaterialError::NonPositive { field, value })
    }
}

fn check_spectrum(field: &'static str, value: Spectrum) -> Result<(), MaterialError> {
    if value.is_finite() && value.min_element() >= 0.0 {
        Ok(())
    } else {
        Err(MaterialError::InvalidSpectrum { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_glass_defaults() {
        let mat: Material = serde_json::from_str(r#"{ "type": "glass" }"#).unwrap();
        assert_eq!(
            mat,
            Material::Glass {
                reflectance: Spectrum::ONE,
                transmittance: Spectrum::ONE,
                ior: 1.5,
            }
        );
        assert!(mat.validate().is_ok());
    }

    #[test]
    fn test_parse_microfacet() {
        // Gold
        let json = r#"{
            "type": "microfacet",
            "eta": [0.143, 0.374, 1.442],
            "k": [3.983, 2.385, 1.603],
            "alpha": 0.25
        }"#;
        let mat: Material = serde_json::from_str(json).unwrap();
        match mat {
            Material::Microfacet { eta, k, alpha } => {
                assert_eq!(eta, Spectrum::new(0.143, 0.374, 1.442));
                assert_eq!(k.x, 3.983);
                assert_eq!(alpha, 0.25);
            }
            other => panic!("expected microfacet, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_emission_requires_radiance() {
        assert!(serde_json::from_str::<Material>(r#"{ "type": "emission" }"#).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(serde_json::from_str::<Material>(r#"{ "type": "velvet" }"#).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let glass = Material::Glass {
            reflectance: Spectrum::ONE,
            transmittance: Spectrum::ONE,
            ior: 0.0,
        };
        assert_eq!(
            glass.validate(),
            Err(MaterialError::NonPositive {
                field: "ior",
                value: 0.0
            })
        );

        let mirror = Material::Mirror {
            reflectance: Spectrum::new(1.0, -0.5, 1.0),
        };
        assert!(matches!(
            mirror.validate(),
            Err(MaterialError::InvalidSpectrum {
                field: "reflectance",
                ..
            })
        ));

        let rough = Material::Microfacet {
            eta: Spectrum::ONE,
            k: Spectrum::ONE,
            alpha: f32::NAN,
        };
        assert!(rough.validate().is_err());
    }

    #[test]
    fn test_serialize_roundtrip_tag() {
        let mat = Material::Emission {
            radiance: Spectrum::splat(4.0),
        };
        let json = serde_json::to_string(&mat).unwrap();
        assert!(json.contains(r#""type":"emission""#));
    }
}
