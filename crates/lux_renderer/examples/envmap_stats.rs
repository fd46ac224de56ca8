//! Example: Build an environment light and check its sampling distribution.
//!
//! Run with: cargo run --example envmap_stats -- [path-to-hdr] [samples]
//!
//! Without a path a synthetic sky (bright sun over a dim gradient) is used.

use std::env;

use anyhow::{Context, Result};
use lux_core::HdrImage;
use lux_math::{dir_to_theta_phi, ShadingFrame, Spectrum, Vec3};
use lux_renderer::{Bsdf, EnvironmentLight, GlassBsdf};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn synthetic_sky() -> Result<HdrImage> {
    let (w, h) = (256, 128);
    HdrImage::from_fn(w, h, |x, y| {
        let t = y as f32 / h as f32;
        let sky = Spectrum::new(0.4, 0.6, 1.0) * (1.0 - t) + Spectrum::splat(0.05) * t;
        let (dx, dy) = (x as i32 - 64, y as i32 - 30);
        if dx * dx + dy * dy < 9 {
            Spectrum::splat(5000.0)
        } else {
            sky
        }
    })
    .context("Failed to build synthetic sky")
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();

    let image = match args.get(1) {
        Some(path) => {
            println!("Loading environment map: {}", path);
            HdrImage::load(path)?
        }
        None => {
            println!("No environment map given, using a synthetic sky");
            synthetic_sky()?
        }
    };
    let samples: usize = match args.get(2) {
        Some(n) => n.parse().context("Sample count must be an integer")?,
        None => 100_000,
    };

    let light = EnvironmentLight::new(image);
    let (w, h) = (light.width(), light.height());
    println!("\n=== Environment light {}x{} ===", w, h);

    let mut rng = StdRng::seed_from_u64(0);
    let mut row_hits = vec![0usize; h as usize];
    let mut estimate = Spectrum::ZERO;

    for _ in 0..samples {
        let s = light.sample_direction(Vec3::ZERO, &mut rng);
        let theta = dir_to_theta_phi(s.wi).x;
        let row = ((theta / std::f32::consts::PI * h as f32).round() as usize).min(h as usize - 1);
        row_hits[row] += 1;
        if s.pdf > 0.0 {
            estimate += s.radiance / s.pdf;
        }
    }
    estimate /= samples as f32;

    println!("Estimated total power (sum L dw): {:?}", estimate);

    println!("\n--- Row histogram (observed vs expected) ---");
    let marginal = light.marginal_y();
    let step = (h as usize / 16).max(1);
    for j in (0..h as usize).step_by(step) {
        let expected = if j == 0 { marginal[0] } else { marginal[j] - marginal[j - 1] };
        let observed = row_hits[j] as f32 / samples as f32;
        println!("  row {:4}: {:.5} vs {:.5}", j, observed, expected);
    }

    // Glass seen head-on reflects about 4% of the light
    let glass = GlassBsdf::new(Spectrum::ONE, Spectrum::ONE, 1.5);
    let normal = Vec3::new(0.3, 0.9, -0.3).normalize();
    let frame = ShadingFrame::from_normal(normal);
    let wo = frame.to_local(normal);
    let reflected = (0..samples)
        .filter(|_| {
            let wi = frame.to_world(glass.sample(wo, &mut rng).wi);
            wi.dot(normal) > 0.0
        })
        .count();
    println!(
        "\nGlass reflection fraction at normal incidence: {:.4}",
        reflected as f32 / samples as f32
    );

    let out = env::temp_dir().join("envmap_probability.png");
    light.save_probability_debug(&out)?;
    println!("Probability debug image: {}", out.display());

    Ok(())
}
