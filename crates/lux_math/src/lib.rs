// Re-export glam for convenience
pub use glam::*;

// Lux math types
pub mod frame;
pub mod spectrum;
pub mod spherical;

pub use frame::ShadingFrame;
pub use spectrum::{luminance, Spectrum};
pub use spherical::{dir_to_theta_phi, theta_phi_to_dir};
