//! Tonal and color adjustments: brightness, contrast, saturation.
//!
//! All three take an amount in `[-100, 100]` (values outside are clamped),
//! touch only the RGB channels, and leave alpha as-is. An amount of `0` is
//! the identity.

use super::buffer::{PixelBuffer, to_channel};

/// Rec. 601 luma weights used for the saturation gray point.
const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// Shift every RGB channel by `amount * 2.55`.
pub fn brightness(buf: &PixelBuffer, amount: f32) -> PixelBuffer {
    let offset = amount.clamp(-100.0, 100.0) * 2.55;
    buf.map_pixels(|[r, g, b, a]| {
        [
            to_channel(r as f32 + offset),
            to_channel(g as f32 + offset),
            to_channel(b as f32 + offset),
            a,
        ]
    })
}

/// Contrast factor for an amount in `[-100, 100]`.
///
/// The formula has a pole at `amount * 2.55 == 259`; clamping the amount to
/// 100 keeps the denominator at 4 or more.
pub fn contrast_factor(amount: f32) -> f32 {
    let c = amount.clamp(-100.0, 100.0) * 2.55;
    259.0 * (c + 255.0) / (255.0 * (259.0 - c))
}

/// Stretch (positive) or compress (negative) channel values around mid-gray.
pub fn contrast(buf: &PixelBuffer, amount: f32) -> PixelBuffer {
    let factor = contrast_factor(amount);
    let apply = |v: u8| to_channel(factor * (v as f32 - 128.0) + 128.0);
    buf.map_pixels(|[r, g, b, a]| [apply(r), apply(g), apply(b), a])
}

/// Move each channel toward (negative) or away from (positive) the pixel's luma.
pub fn saturation(buf: &PixelBuffer, amount: f32) -> PixelBuffer {
    let adjustment = 1.0 + amount.clamp(-100.0, 100.0) / 100.0;
    buf.map_pixels(|[r, g, b, a]| {
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let gray = LUMA[0] * rf + LUMA[1] * gf + LUMA[2] * bf;
        [
            to_channel(gray + adjustment * (rf - gray)),
            to_channel(gray + adjustment * (gf - gray)),
            to_channel(gray + adjustment * (bf - gray)),
            a,
        ]
    })
}
