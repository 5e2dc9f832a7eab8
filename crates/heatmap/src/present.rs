//! Final frame assembly: background and heat layer resampled onto the display.

use image::RgbaImage;
use rayon::prelude::*;

use crate::background::{source_over, Backdrop};
use crate::composite::{Region, PARALLEL_THRESHOLD};
use crate::point::Point;
use crate::transform::Affine;

/// Compose a `width`×`height` display frame.
///
/// `heat` is the colorized heat layer covering `region` in world space and
/// `view` maps world to display. Each display pixel samples the world pixel
/// under its center (nearest neighbour), so under the identity view the
/// heat layer is copied pixel for pixel.
pub fn present(
    heat: &RgbaImage,
    region: Region,
    backdrop: &Backdrop<'_>,
    view: &Affine,
    width: u32,
    height: u32,
) -> RgbaImage {
    let mut frame = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return frame;
    }

    let inverse = match view.invert() {
        Some(inv) => inv,
        None => {
            tracing::warn!("View transform is singular; presenting fill only");
            let fill = backdrop.fill.to_rgba();
            frame.pixels_mut().for_each(|p| p.0 = fill);
            return frame;
        }
    };

    let present_row = |(y, row): (usize, &mut [u8])| {
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let world = inverse.apply(Point::new(x as f64 + 0.5, y as f64 + 0.5));
            let wx = world.x.floor() as i64;
            let wy = world.y.floor() as i64;

            let under = backdrop.sample(wx, wy);
            let lx = wx.saturating_sub(region.x);
            let ly = wy.saturating_sub(region.y);
            let over = if lx >= 0
                && ly >= 0
                && lx < region.width as i64
                && ly < region.height as i64
            {
                heat.get_pixel(lx as u32, ly as u32).0
            } else {
                [0, 0, 0, 0]
            };

            px.copy_from_slice(&source_over(over, under));
        }
    };

    let row_bytes = width as usize * 4;
    let pixels: &mut [u8] = &mut frame;
    if width as usize * height as usize >= PARALLEL_THRESHOLD {
        pixels
            .par_chunks_exact_mut(row_bytes)
            .enumerate()
            .for_each(present_row);
    } else {
        pixels.chunks_exact_mut(row_bytes).enumerate().for_each(present_row);
    }

    frame
}
