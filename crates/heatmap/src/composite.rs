//! Heat accumulation, normalization and colorization.
//!
//! The pipeline for one frame:
//!
//! 1. Clear an f32 accumulation buffer covering the target [`Region`].
//! 2. Stamp every point with alpha `max(1/N, min_alpha)` using repeated
//!    source-over compositing (`a = s + a * (1 - s)`).
//! 3. Rescale alpha so the hottest pixel of the frame becomes 255. A frame
//!    with no heat stays fully transparent.
//! 4. Replace RGB of every non-zero pixel with the gradient table entry
//!    indexed by its normalized alpha.

use image::{GrayImage, RgbaImage};
use rayon::prelude::*;

use crate::gradient::GradientTable;
use crate::point::Point;
use crate::stamp::Stamp;

/// Minimum pixels to benefit from parallel passes
pub(crate) const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

/// Axis-aligned pixel rectangle in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region anchored at the world origin.
    pub const fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether a `side`-pixel square with top-left `(ox, oy)` touches the region.
    #[inline]
    fn overlaps_square(&self, ox: i64, oy: i64, side: i64) -> bool {
        ox.saturating_add(side) > self.x
            && oy.saturating_add(side) > self.y
            && ox < self.x.saturating_add(self.width as i64)
            && oy < self.y.saturating_add(self.height as i64)
    }
}

/// Per-point compositing alpha for a frame of `count` points.
pub fn point_alpha(count: usize, min_alpha: f64) -> f32 {
    let floor = if min_alpha.is_finite() { min_alpha } else { 0.0 };
    let share = if count == 0 { 1.0 } else { 1.0 / count as f64 };
    share.max(floor).clamp(0.0, 1.0) as f32
}

/// Keep only points whose stamp touches `region`.
///
/// Stamp placement is snapped to whole pixels, so this test is exact: a
/// dropped point would not have written a single pixel of the region.
pub fn cull_points<'a>(
    points: impl IntoIterator<Item = &'a Point>,
    stamp: &Stamp,
    region: &Region,
) -> Vec<Point> {
    let side = stamp.side() as i64;
    points
        .into_iter()
        .filter(|p| p.is_finite())
        .filter(|p| {
            let (ox, oy) = stamp.origin_for(p.x, p.y);
            region.overlaps_square(ox, oy, side)
        })
        .copied()
        .collect()
}

/// Stamp `points` into a fresh accumulation buffer covering `region`.
///
/// `alpha` is the per-point compositing alpha; see [`point_alpha`]. It is
/// passed in rather than derived from `points` so culled subsets composite
/// exactly like the full set.
pub fn accumulate<'a>(
    points: impl IntoIterator<Item = &'a Point>,
    stamp: &Stamp,
    alpha: f32,
    region: &Region,
) -> Vec<f32> {
    let mut acc = vec![0.0f32; region.pixel_count()];
    if region.is_empty() || alpha <= 0.0 {
        return acc;
    }

    let side = stamp.side() as i64;
    let blob = stamp.alpha().as_raw();
    let width = region.width as i64;
    let height = region.height as i64;

    for p in points.into_iter().filter(|p| p.is_finite()) {
        let (ox, oy) = stamp.origin_for(p.x, p.y);
        // Stamp origin relative to the region; saturates for far-off points
        let (lx, ly) = (ox.saturating_sub(region.x), oy.saturating_sub(region.y));

        let x0 = lx.max(0);
        let x1 = lx.saturating_add(side).min(width);
        let y0 = ly.max(0);
        let y1 = ly.saturating_add(side).min(height);
        if x0 >= x1 || y0 >= y1 {
            continue;
        }

        for y in y0..y1 {
            let src_row = ((y - ly) * side) as usize;
            let dst_row = (y * width) as usize;
            for x in x0..x1 {
                let s = blob[src_row + (x - lx) as usize];
                if s == 0 {
                    continue;
                }
                let s = s as f32 / 255.0 * alpha;
                let dst = &mut acc[dst_row + x as usize];
                *dst = s + *dst * (1.0 - s);
            }
        }
    }

    acc
}

/// Normalized heat for one frame: alpha rescaled so the hottest pixel is 255.
#[derive(Debug, Clone)]
pub struct HeatLayer {
    region: Region,
    intensity: GrayImage,
    peak: f32,
}

impl HeatLayer {
    /// Normalize an accumulation buffer produced by [`accumulate`].
    ///
    /// A buffer whose maximum is not positive yields an all-zero layer;
    /// there is no division by the maximum in that case.
    pub fn normalize(acc: &[f32], region: Region) -> Self {
        debug_assert_eq!(acc.len(), region.pixel_count());

        let peak = if acc.len() >= PARALLEL_THRESHOLD {
            acc.par_iter().copied().reduce(|| 0.0f32, f32::max)
        } else {
            acc.iter().copied().fold(0.0f32, f32::max)
        };

        let mut intensity = GrayImage::new(region.width, region.height);
        if peak > 0.0 {
            let scale = 255.0 / peak;
            let out: &mut [u8] = &mut intensity;
            let normalize_one = |(dst, src): (&mut u8, &f32)| {
                *dst = (src * scale).round().clamp(0.0, 255.0) as u8;
            };
            if acc.len() >= PARALLEL_THRESHOLD {
                out.par_iter_mut().zip(acc.par_iter()).for_each(normalize_one);
            } else {
                out.iter_mut().zip(acc.iter()).for_each(normalize_one);
            }
        }

        tracing::trace!(
            width = region.width,
            height = region.height,
            peak,
            "Normalized heat layer"
        );

        Self {
            region,
            intensity,
            peak,
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Normalized alpha per pixel (0 = no heat, 255 = hottest pixel).
    pub fn intensity(&self) -> &GrayImage {
        &self.intensity
    }

    /// Maximum accumulated alpha before normalization, in [0, 1].
    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn is_blank(&self) -> bool {
        self.peak <= 0.0
    }

    /// Map normalized alpha through the gradient table.
    ///
    /// A pixel's color depends only on its normalized alpha: RGB comes from
    /// `table[alpha]`, alpha is kept. Zero-alpha pixels stay transparent black.
    pub fn colorize(&self, table: &GradientTable) -> RgbaImage {
        let mut out = RgbaImage::new(self.region.width, self.region.height);
        if self.is_blank() {
            return out;
        }

        let src = self.intensity.as_raw();
        let dst: &mut [u8] = &mut out;
        let colorize_one = |(px, &n): (&mut [u8], &u8)| {
            if n != 0 {
                let c = table.get(n);
                px.copy_from_slice(&[c.r, c.g, c.b, n]);
            }
        };
        if src.len() >= PARALLEL_THRESHOLD {
            dst.par_chunks_exact_mut(4)
                .zip(src.par_iter())
                .for_each(colorize_one);
        } else {
            dst.chunks_exact_mut(4).zip(src.iter()).for_each(colorize_one);
        }
        out
    }
}

/// Render `points` into a `width`×`height` RGBA heat layer anchored at the origin.
pub fn render(
    points: &[Point],
    stamp: &Stamp,
    table: &GradientTable,
    width: u32,
    height: u32,
    min_alpha: f64,
) -> RgbaImage {
    let region = Region::sized(width, height);
    let alpha = point_alpha(points.len(), min_alpha);
    let acc = accumulate(points, stamp, alpha, &region);
    HeatLayer::normalize(&acc, region).colorize(table)
}
