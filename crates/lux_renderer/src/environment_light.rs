//! Importance-sampled environment light.
//!
//! The light wraps an equirectangular HDR image and builds, once, a discrete
//! 2D distribution over its pixels proportional to
//! `luminance * sin(theta)`: a marginal CDF over rows and one conditional
//! CDF over columns per row. Sampling inverts both CDFs with binary
//! searches, so a render thread only ever reads the tables.
//!
//! Image coordinates: `x = phi / (2 pi) * width`, `y = theta / pi * height`,
//! with pixel `(i, j)` sitting at the integer coordinate `(i, j)`.

use std::f32::consts::PI;
use std::path::Path;

use image::{Rgba, RgbaImage};
use lux_core::HdrImage;
use lux_math::{dir_to_theta_phi, luminance, theta_phi_to_dir, Spectrum, Vec2, Vec3};
use rand::RngCore;
use thiserror::Error;

use crate::sampling::uniform_2d;

#[derive(Error, Debug)]
pub enum LightError {
    #[error("Failed to write probability debug image {path}: {source}")]
    DebugImage {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// A direction drawn from a light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Direction towards the light (world space)
    pub wi: Vec3,
    /// Distance to the light; infinite for the environment
    pub distance: f32,
    /// Solid-angle density of `wi`
    pub pdf: f32,
    /// Radiance arriving along `wi`
    pub radiance: Spectrum,
}

/// Infinitely distant light backed by an equirectangular HDR image.
pub struct EnvironmentLight {
    env_map: HdrImage,
    /// Probability mass of each pixel, sums to one
    pdf_envmap: Vec<f32>,
    /// Cumulative mass of rows `0..=j`
    marginal_y: Vec<f32>,
    /// Per-row cumulative column mass, divided by the row's mass
    conds_y: Vec<f32>,
}

impl EnvironmentLight {
    /// Build the light and its importance tables.
    ///
    /// Does no I/O; call [`save_probability_debug`](Self::save_probability_debug)
    /// explicitly to inspect the tables.
    pub fn new(env_map: HdrImage) -> Self {
        let w = env_map.width() as usize;
        let h = env_map.height() as usize;

        // Luminance weighted by the solid angle each row covers
        let row_sin: Vec<f64> = (0..h)
            .map(|j| (std::f64::consts::PI * (j as f64 + 0.5) / h as f64).sin())
            .collect();

        let mut weights: Vec<f64> = env_map
            .pixels()
            .iter()
            .enumerate()
            .map(|(idx, &p)| luminance(p) as f64 * row_sin[idx / w])
            .collect();
        let mut sum: f64 = weights.iter().sum();

        if !(sum > 0.0 && sum.is_finite()) {
            log::warn!(
                "Environment map {}x{} has no energy; sampling by solid angle only",
                w,
                h
            );
            for (idx, weight) in weights.iter_mut().enumerate() {
                *weight = row_sin[idx / w];
            }
            sum = weights.iter().sum();
        }

        let pdf_envmap: Vec<f32> = weights.iter().map(|&wt| (wt / sum) as f32).collect();

        // Rows, then columns within each row, as running prefix sums
        let mut marginal_y = Vec::with_capacity(h);
        let mut conds_y = Vec::with_capacity(w * h);
        let mut cumulative_rows = 0.0f64;
        let mut empty_rows = 0;

        for row in weights.chunks_exact(w) {
            let row_mass: f64 = row.iter().map(|&wt| wt / sum).sum();
            cumulative_rows += row_mass;
            marginal_y.push(cumulative_rows as f32);

            if row_mass > 0.0 {
                let mut cumulative = 0.0f64;
                for &wt in row {
                    cumulative += wt / sum;
                    conds_y.push((cumulative / row_mass) as f32);
                }
            } else {
                // Never selected by the marginal; keep the CDF well formed
                empty_rows += 1;
                conds_y.extend((0..w).map(|i| (i + 1) as f32 / w as f32));
            }
        }

        if empty_rows > 0 {
            log::warn!(
                "Environment map has {} of {} rows with zero probability",
                empty_rows,
                h
            );
        }

        log::info!(
            "Environment light initialized: {}x{}, marginal total {:.6}",
            w,
            h,
            cumulative_rows
        );

        Self {
            env_map,
            pdf_envmap,
            marginal_y,
            conds_y,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.env_map.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.env_map.height()
    }

    /// The image backing this light.
    pub fn env_map(&self) -> &HdrImage {
        &self.env_map
    }

    /// Probability mass per pixel, row-major.
    pub fn pdf_envmap(&self) -> &[f32] {
        &self.pdf_envmap
    }

    /// Marginal CDF over rows.
    pub fn marginal_y(&self) -> &[f32] {
        &self.marginal_y
    }

    /// Conditional CDFs over columns, one row of `width` entries per image row.
    pub fn conds_y(&self) -> &[f32] {
        &self.conds_y
    }

    /// Environment lights cover the whole sphere.
    pub fn is_delta_light(&self) -> bool {
        false
    }

    /// Draw a direction towards the environment, proportional to radiance.
    ///
    /// The direction is the one of the chosen pixel's integer coordinate.
    /// Its pdf is the pixel's mass over the solid angle of the cell centered
    /// on that direction (see [`pdf`](Self::pdf)). On every row this is the
    /// exact form of `mass * w * h / (2 pi^2 sin(theta))`, which it matches
    /// to first order in the pixel size, and it stays finite on the top row
    /// where the direction is the pole.
    ///
    /// The shading point `_p` is unused: the light is infinitely far away.
    pub fn sample_direction(&self, _p: Vec3, rng: &mut dyn RngCore) -> LightSample {
        let w = self.env_map.width() as usize;
        let h = self.env_map.height() as usize;
        let u = uniform_2d(rng);

        // First entry strictly greater than the uniform
        let y = self.marginal_y.partition_point(|&m| m <= u.x).min(h - 1);
        let row = &self.conds_y[y * w..(y + 1) * w];
        let x = row.partition_point(|&c| c <= u.y).min(w - 1);

        let xy = Vec2::new(x as f32, y as f32);
        let wi = theta_phi_to_dir(self.xy_to_theta_phi(xy));

        LightSample {
            wi,
            distance: f32::INFINITY,
            pdf: self.pixel_pdf(x, y),
            radiance: self.bilerp(xy),
        }
    }

    /// Radiance seen along `direction`, for rays that escape the scene.
    pub fn radiance_along(&self, direction: Vec3) -> Spectrum {
        self.bilerp(self.theta_phi_to_xy(dir_to_theta_phi(direction)))
    }

    /// Solid-angle density with which `sample_direction` covers `direction`.
    ///
    /// Pixel `(i, j)` owns the cell `[i - 1/2, i + 1/2) x [j - 1/2, j + 1/2)`
    /// in image coordinates, clipped to the poles, so every direction
    /// `sample_direction` returns gets back exactly the pdf it was drawn
    /// with. All pixels of the top row collapse onto the pole and share the
    /// polar cap, which carries the row's average density.
    pub fn pdf(&self, direction: Vec3) -> f32 {
        let w = self.env_map.width() as i64;
        let h = self.env_map.height() as i64;
        let xy = self.theta_phi_to_xy(dir_to_theta_phi(direction));

        let x = (xy.x.round() as i64).rem_euclid(w) as usize;
        let y = (xy.y.round() as i64).clamp(0, h - 1) as usize;
        self.pixel_pdf(x, y)
    }

    /// Convert a pixel's probability mass into a solid-angle density.
    fn pixel_pdf(&self, x: usize, y: usize) -> f32 {
        let w = self.env_map.width() as usize;
        let mass = if y == 0 {
            self.marginal_y[0] / w as f32
        } else {
            self.pdf_envmap[x + y * w]
        };
        mass / self.cell_solid_angle(y)
    }

    /// Solid angle of one pixel cell in row `y`.
    ///
    /// Rows span `[y - 1/2, y + 1/2)`, except that the first starts at the
    /// north pole and the last ends at the south pole.
    fn cell_solid_angle(&self, y: usize) -> f32 {
        let w = self.env_map.width() as f32;
        let h = self.env_map.height() as usize;

        let top = if y == 0 { 0.0 } else { y as f32 - 0.5 };
        let bottom = if y + 1 == h { h as f32 } else { y as f32 + 0.5 };
        let (theta_a, theta_b) = (top / h as f32 * PI, bottom / h as f32 * PI);

        // cos(a) - cos(b), written to stay accurate for the thin polar cap
        let band = 2.0 * (0.5 * (theta_a + theta_b)).sin() * (0.5 * (theta_b - theta_a)).sin();
        2.0 * PI / w * band
    }

    fn theta_phi_to_xy(&self, theta_phi: Vec2) -> Vec2 {
        let w = self.env_map.width() as f32;
        let h = self.env_map.height() as f32;
        Vec2::new(theta_phi.y / (2.0 * PI) * w, theta_phi.x / PI * h)
    }

    fn xy_to_theta_phi(&self, xy: Vec2) -> Vec2 {
        let w = self.env_map.width() as f32;
        let h = self.env_map.height() as f32;
        Vec2::new(xy.y / h * PI, xy.x / w * 2.0 * PI)
    }

    /// Bilinear lookup at image coordinate `xy`.
    ///
    /// Columns wrap around the `phi = 0 / 2 pi` seam. Rows do not wrap: past
    /// the last row the lookup clamps to it.
    fn bilerp(&self, xy: Vec2) -> Spectrum {
        let w = self.env_map.width() as i64;
        let h = self.env_map.height() as i64;

        let x0 = xy.x.floor();
        let fx = xy.x - x0;
        let left = (x0 as i64).rem_euclid(w);
        let right = (left + 1) % w;

        let y0 = xy.y.max(0.0).floor();
        let (top, bottom, fy) = if y0 as i64 >= h - 1 {
            (h - 1, h - 1, 0.0)
        } else {
            (y0 as i64, y0 as i64 + 1, xy.y.max(0.0) - y0)
        };

        let px = |x: i64, y: i64| self.env_map.pixel(x as u32, y as u32);

        let upper = px(left, top) * (1.0 - fx) + px(right, top) * fx;
        let lower = px(left, bottom) * (1.0 - fx) + px(right, bottom) * fx;
        upper * (1.0 - fy) + lower * fy
    }

    /// Heatmap of the importance tables.
    ///
    /// Red encodes `marginal_y` of the pixel's row, green the row's
    /// conditional CDF at the pixel.
    pub fn probability_debug_image(&self) -> RgbaImage {
        let w = self.env_map.width();
        let to_byte = |v: f32| (255.0 * v.clamp(0.0, 1.0)) as u8;

        RgbaImage::from_fn(w, self.env_map.height(), |i, j| {
            let marginal = self.marginal_y[j as usize];
            let conditional = self.conds_y[(j * w + i) as usize];
            Rgba([to_byte(marginal), to_byte(conditional), 0, 255])
        })
    }

    /// Write [`probability_debug_image`](Self::probability_debug_image) to disk.
    pub fn save_probability_debug(&self, path: impl AsRef<Path>) -> Result<(), LightError> {
        let path = path.as_ref();
        self.probability_debug_image()
            .save(path)
            .map_err(|source| LightError::DebugImage {
                path: path.display().to_string(),
                source,
            })?;

        log::info!("Saved probability debug image to {}", path.display());
        Ok(())
    }
}
