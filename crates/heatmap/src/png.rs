//! PNG encoding for rendered frames and heat layers.
//!
//! Two encodings:
//! - **Indexed PNG (color type 3)**: a heat layer never has more than 256
//!   colors (pixel color is a function of normalized alpha), so it is written
//!   with the gradient table as palette and intensities as indices. Frames
//!   with ≤256 unique colors also take this path.
//! - **RGBA PNG (color type 6)**: fallback for frames with more colors.

use std::collections::HashMap;
use std::io::Write;

use image::RgbaImage;
use rayon::prelude::*;

use crate::composite::HeatLayer;
use crate::error::{HeatmapError, HeatmapResult};
use crate::gradient::GradientTable;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

type Palette = Vec<(u8, u8, u8, u8)>;

/// Encode a heat layer as an indexed PNG.
///
/// No palette extraction is needed: the palette is the gradient table with
/// alpha equal to the index, and the indices are the layer's intensities.
pub fn encode_heat_layer(layer: &HeatLayer, table: &GradientTable) -> HeatmapResult<Vec<u8>> {
    let intensity = layer.intensity();
    encode_indexed(
        intensity.width(),
        intensity.height(),
        &table.heat_palette(),
        intensity.as_raw(),
    )
}

/// Encode a frame, choosing indexed PNG when it has ≤256 unique colors.
pub fn encode_frame(frame: &RgbaImage) -> HeatmapResult<Vec<u8>> {
    let pixels = frame.as_raw();
    let palette_result = if pixels.len() / 4 >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    match palette_result {
        Some((palette, indices)) => {
            encode_indexed(frame.width(), frame.height(), &palette, &indices)
        }
        None => encode_rgba(frame),
    }
}

/// Pack RGBA bytes into a u32 for faster hashing and comparison
#[inline(always)]
fn pack_color(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

#[inline(always)]
fn unpack_color(packed: u32) -> (u8, u8, u8, u8) {
    let [r, g, b, a] = packed.to_le_bytes();
    (r, g, b, a)
}

fn extract_palette_sequential(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let packed = pack_color(px);
        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push(unpack_color(packed));
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Collect unique colors per chunk in parallel, merge, then map pixels to
/// palette indices in parallel.
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let chunk_px = (pixels.len() / 4 / rayon::current_num_threads()).max(256);

    let unique: Vec<u32> = pixels
        .par_chunks(chunk_px * 4)
        .flat_map_iter(|chunk| {
            let mut local: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for px in chunk.chunks_exact(4) {
                local.insert(pack_color(px), ());
                // Too many colors already; the merge will reject this
                if local.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local.into_keys()
        })
        .collect();

    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    for packed in unique {
        if !color_to_index.contains_key(&packed) {
            if palette.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            color_to_index.insert(packed, palette.len() as u8);
            palette.push(unpack_color(packed));
        }
    }

    let indices: Vec<u8> = pixels
        .par_chunks_exact(4)
        .map(|px| color_to_index.get(&pack_color(px)).copied().unwrap_or(0))
        .collect();

    Some((palette, indices))
}

/// Write an indexed PNG (color type 3) from palette and indices.
pub fn encode_indexed(
    width: u32,
    height: u32,
    palette: &[(u8, u8, u8, u8)],
    indices: &[u8],
) -> HeatmapResult<Vec<u8>> {
    let expected = width as usize * height as usize;
    if indices.len() != expected {
        return Err(HeatmapError::BufferSize {
            expected,
            actual: indices.len(),
        });
    }
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(HeatmapError::Encode(format!(
            "palette must have 1..=256 entries, got {}",
            palette.len()
        )));
    }

    let mut png = Vec::with_capacity(expected / 2 + 1024);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    // tRNS only when some entry is not opaque
    if palette.iter().any(|&(_, _, _, a)| a < 255) {
        let trns: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width as usize, height as usize)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write an RGBA PNG (color type 6).
pub fn encode_rgba(frame: &RgbaImage) -> HeatmapResult<Vec<u8>> {
    let (width, height) = frame.dimensions();

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));

    let idat = deflate_scanlines(frame.as_raw(), width as usize * 4, height as usize)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn ihdr(width: u32, height: u32, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&width.to_be_bytes());
    data[4..8].copy_from_slice(&height.to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each `row_bytes`-wide row with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize, rows: usize) -> HeatmapResult<Vec<u8>> {
    let mut raw = Vec::with_capacity(rows * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes.max(1)).take(rows) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&raw)
        .and_then(|_| encoder.finish())
        .map_err(|e| HeatmapError::Encode(format!("IDAT compression failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_extract_palette_simple() {
        let pixels = [
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            0, 0, 255, 255, // blue
            255, 0, 0, 255, // red again
        ];

        let (palette, indices) = extract_palette_sequential(&pixels).unwrap();
        assert_eq!(palette.len(), 3);
        assert_eq!(indices, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_extract_palette_parallel_agrees_with_sequential() {
        let mut pixels = Vec::with_capacity(128 * 128 * 4);
        for y in 0..128u32 {
            for x in 0..128u32 {
                let n = ((x / 8 + y / 8) % 50) as u8;
                pixels.extend_from_slice(&[n * 5, 100 + n * 3, 200 - n * 2, 255]);
            }
        }

        let (palette, indices) = extract_palette_parallel(&pixels).unwrap();
        assert_eq!(palette.len(), 50);
        assert_eq!(indices.len(), 128 * 128);
        for (px, &idx) in pixels.chunks_exact(4).zip(&indices) {
            let (r, g, b, a) = palette[idx as usize];
            assert_eq!([r, g, b, a], [px[0], px[1], px[2], px[3]]);
        }
    }

    #[test]
    fn test_too_many_colors_falls_back_to_rgba() {
        let frame = RgbaImage::from_fn(300, 1, |x, _| Rgba([(x % 256) as u8, (x / 256) as u8, 0, 255]));
        assert!(extract_palette_sequential(frame.as_raw()).is_none());

        let png = encode_frame(&frame).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
        // IHDR color type byte
        assert_eq!(png[25], 6);
    }

    #[test]
    fn test_indexed_rejects_wrong_index_count() {
        let err = encode_indexed(2, 2, &[(0, 0, 0, 255)], &[0, 0, 0]).unwrap_err();
        assert!(matches!(err, HeatmapError::BufferSize { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_chunk_crc() {
        let mut out = Vec::new();
        write_chunk(&mut out, b"IEND", &[]);
        // Well-known IEND CRC
        assert_eq!(&out[8..12], &[0xAE, 0x42, 0x60, 0x82]);
    }
}
