//! Box blur.
//!
//! A direct neighborhood average: every output pixel visits all
//! `(2 * size + 1)²` neighbors, so the cost is `O(width * height * size²)`.
//! That is fine for preview-sized frames. Full-resolution bitmaps would need a
//! separable or summed-area implementation.

use super::buffer::{CHANNELS, PixelBuffer};
use rayon::prelude::*;

/// Neighborhood half-width for a requested radius. Never less than 1.
pub fn blur_size(radius: f32) -> u32 {
    if radius.is_finite() && radius >= 1.0 {
        radius.floor() as u32
    } else {
        1
    }
}

/// Average all four channels (alpha included) over the clipped neighborhood.
///
/// Edge pixels average only the samples that fall inside the image; there is
/// no wraparound and no mirroring. A radius below 1, including 0, still blurs
/// with a 3×3 window.
pub fn box_blur(buf: &PixelBuffer, radius: f32) -> PixelBuffer {
    let size = blur_size(radius) as i64;
    let (width, height) = (buf.width() as i64, buf.height() as i64);
    let src = buf.as_bytes();
    let stride = buf.row_stride();

    let mut out = vec![0u8; src.len()];
    if stride == 0 {
        return buf.with_data(out);
    }

    out.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i64;
            let y0 = (y - size).max(0);
            let y1 = (y + size).min(height - 1);
            for x in 0..width {
                let x0 = (x - size).max(0);
                let x1 = (x + size).min(width - 1);

                let mut sums = [0u32; CHANNELS];
                for sy in y0..=y1 {
                    let base = sy as usize * stride;
                    for sx in x0..=x1 {
                        let i = base + sx as usize * CHANNELS;
                        for (c, sum) in sums.iter_mut().enumerate() {
                            *sum += src[i + c] as u32;
                        }
                    }
                }

                let count = ((y1 - y0 + 1) * (x1 - x0 + 1)) as f32;
                let o = x as usize * CHANNELS;
                for (c, sum) in sums.iter().enumerate() {
                    row[o + c] = (*sum as f32 / count).round() as u8;
                }
            }
        });

    buf.with_data(out)
}
