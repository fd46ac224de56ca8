//! Lux Core - Inputs consumed by the light-transport core.
//!
//! This crate provides:
//!
//! - **HDR images**: `HdrImage`, the equirectangular radiance grid that
//!   backs an environment light
//! - **Material descriptions**: `Material`, serde-deserializable BSDF
//!   parameters
//!
//! # Example
//!
//! ```ignore
//! use lux_core::{HdrImage, Material};
//!
//! let sky = HdrImage::load("sky.hdr")?;
//! println!("Loaded {}x{} environment", sky.width(), sky.height());
//!
//! let glass: Material = serde_json::from_str(r#"{ "type": "glass", "ior": 1.5 }"#)?;
//! glass.validate()?;
//! ```

pub mod hdr;
pub mod material;

// Re-export commonly used types
pub use hdr::{HdrImage, ImageError, ImageResult};
pub use material::{Material, MaterialError};
