//! Intensity blend: fade a processed frame back toward its original.

use super::buffer::{PixelBuffer, PixelError};

/// Linear interpolation `original * (1 - t) + processed * t` over every byte,
/// alpha included. `intensity` is clamped to `[0, 1]`.
///
/// At `t == 0` the original is returned unchanged and at `t == 1` the
/// processed frame is, with no rounding drift at either end.
pub fn blend(
    original: &PixelBuffer,
    processed: &PixelBuffer,
    intensity: f32,
) -> Result<PixelBuffer, PixelError> {
    if original.dimensions() != processed.dimensions() {
        return Err(PixelError::DimensionMismatch {
            left: original.dimensions(),
            right: processed.dimensions(),
        });
    }

    let t = if intensity.is_nan() {
        0.0
    } else {
        intensity.clamp(0.0, 1.0)
    };
    if t == 0.0 {
        return Ok(original.clone());
    }
    if t == 1.0 {
        return Ok(processed.clone());
    }

    let data = original
        .as_bytes()
        .iter()
        .zip(processed.as_bytes())
        .map(|(&o, &p)| (o as f32 * (1.0 - t) + p as f32 * t).round() as u8)
        .collect();
    Ok(original.with_data(data))
}
