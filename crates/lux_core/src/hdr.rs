//! HDR image loading for environment maps.
//!
//! An `HdrImage` is a row-major grid of linear RGB radiance. For an
//! environment map, row `j` maps to polar angle `theta = pi * j / height`
//! and column `i` to azimuth `phi = 2 * pi * i / width`.

use std::path::Path;

use image::{ColorType, DynamicImage};
use lux_math::Spectrum;
use thiserror::Error;

/// Errors that can occur while building or loading an HDR image.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to load image {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Image has zero size ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("Pixel count {actual} does not match {width}x{height}")]
    DimensionMismatch { width: u32, height: u32, actual: usize },

    #[error("Pixel ({x}, {y}) has a negative or non-finite value")]
    InvalidPixel { x: u32, y: u32 },
}

pub type ImageResult<T> = Result<T, ImageError>;

/// A linear radiance grid, read-only once built.
#[derive(Clone, Debug)]
pub struct HdrImage {
    width: u32,
    height: u32,
    pixels: Vec<Spectrum>,
}

impl HdrImage {
    /// Create an image from row-major pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<Spectrum>) -> ImageResult<Self> {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty { width, height });
        }
        if pixels.len() != width as usize * height as usize {
            return Err(ImageError::DimensionMismatch {
                width,
                height,
                actual: pixels.len(),
            });
        }
        if let Some(idx) = pixels
            .iter()
            .position(|p| !p.is_finite() || p.min_element() < 0.0)
        {
            return Err(ImageError::InvalidPixel {
                x: (idx % width as usize) as u32,
                y: (idx / width as usize) as u32,
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        f: impl Fn(u32, u32) -> Spectrum,
    ) -> ImageResult<Self> {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self::new(width, height, pixels)
    }

    /// Create an image with every pixel set to `value`.
    pub fn constant(width: u32, height: u32, value: Spectrum) -> ImageResult<Self> {
        Self::new(width, height, vec![value; width as usize * height as usize])
    }

    /// Load an image from disk.
    ///
    /// Float formats (Radiance `.hdr`, OpenEXR) are taken as linear radiance;
    /// integer formats are assumed to be sRGB encoded and linearized.
    pub fn load(path: impl AsRef<Path>) -> ImageResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| ImageError::Load {
            path: path.display().to_string(),
            source,
        })?;

        let image = Self::from_dynamic(img)?;

        log::debug!(
            "Loaded HDR image: {} ({}x{}, {:.1} KB)",
            path.display(),
            image.width,
            image.height,
            image.size_bytes() as f32 / 1024.0
        );

        Ok(image)
    }

    /// Convert a decoded image into linear radiance.
    pub fn from_dynamic(img: DynamicImage) -> ImageResult<Self> {
        let is_float = matches!(img.color(), ColorType::Rgb32F | ColorType::Rgba32F);
        let rgb = img.into_rgb32f();
        let (width, height) = rgb.dimensions();

        let pixels = rgb
            .pixels()
            .map(|p| {
                let c = Spectrum::new(p[0], p[1], p[2]);
                if is_float {
                    // Some encoders write tiny negative values
                    c.max(Spectrum::ZERO)
                } else {
                    Spectrum::new(srgb_to_linear(c.x), srgb_to_linear(c.y), srgb_to_linear(c.z))
                }
            })
            .collect();

        Self::new(width, height, pixels)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get pixel at integer coordinates.
    ///
    /// Panics if `(x, y)` is outside the image.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Spectrum {
        debug_assert!(x < self.width && y < self.height);
        self.pixels[(y * self.width + x) as usize]
    }

    /// Row-major pixel data.
    pub fn pixels(&self) -> &[Spectrum] {
        &self.pixels
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<Spectrum>()
    }
}

/// Convert an sRGB-encoded value in [0, 1] to linear.
fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
