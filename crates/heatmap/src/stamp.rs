//! Soft-edged disc ("blob") drawn once per point.
//!
//! The stamp is an alpha-only square image: an anti-aliased disc of
//! `radius` at its center, softened by a gaussian blur with standard
//! deviation `blur / 2` so alpha falls off over roughly `blur` pixels past
//! the disc edge. It is rebuilt only when radius or blur change.

use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Largest usable radius or blur; keeps the stamp within 1024px on a side.
pub const MAX_EXTENT: f64 = 256.0;

/// Blur widths below this are drawn as a hard disc.
pub const MIN_BLUR: f64 = 0.01;

/// Cached alpha blob for a given (radius, blur).
#[derive(Debug, Clone)]
pub struct Stamp {
    radius: f64,
    blur: f64,
    alpha: GrayImage,
}

impl Stamp {
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn blur(&self) -> f64 {
        self.blur
    }

    /// Side length in pixels.
    pub fn side(&self) -> u32 {
        self.alpha.width()
    }

    /// Distance from the stamp's center to its edge.
    pub fn half_size(&self) -> f64 {
        self.side() as f64 / 2.0
    }

    /// Alpha channel, one byte per pixel.
    pub fn alpha(&self) -> &GrayImage {
        &self.alpha
    }

    /// Whether this stamp was built for the given parameters.
    pub fn matches(&self, radius: f64, blur: f64) -> bool {
        self.radius.to_bits() == radius.to_bits() && self.blur.to_bits() == blur.to_bits()
    }

    /// Top-left pixel at which the stamp lands when centered on (x, y).
    #[inline]
    pub fn origin_for(&self, x: f64, y: f64) -> (i64, i64) {
        let half = self.half_size();
        ((x - half).round() as i64, (y - half).round() as i64)
    }
}

/// Build the stamp for a radius and blur width.
///
/// Never fails: a non-positive radius gives an empty blob and a blur below
/// [`MIN_BLUR`] skips the softening pass. Both are capped at [`MAX_EXTENT`],
/// and the side is at least 1px.
pub fn build_stamp(radius: f64, blur: f64) -> Stamp {
    let r = if radius.is_finite() { radius.clamp(0.0, MAX_EXTENT) } else { 0.0 };
    let b = if blur.is_finite() { blur.clamp(0.0, MAX_EXTENT) } else { 0.0 };

    let side = (2.0 * (r + b)).ceil().max(1.0) as u32;
    let center = side as f64 / 2.0;

    // Coverage of each pixel center by the disc, with a one-pixel AA ramp
    let disc = GrayImage::from_fn(side, side, |x, y| {
        if r <= 0.0 {
            return Luma([0]);
        }
        let dx = x as f64 + 0.5 - center;
        let dy = y as f64 + 0.5 - center;
        let coverage = (r - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
        Luma([(coverage * 255.0).round() as u8])
    });

    let sigma = (b / 2.0) as f32;
    let alpha = if b >= MIN_BLUR && r > 0.0 && sigma > 0.0 {
        gaussian_blur_f32(&disc, sigma)
    } else {
        disc
    };

    tracing::debug!(radius = r, blur = b, side, "Built stamp");

    Stamp {
        radius,
        blur,
        alpha,
    }
}
