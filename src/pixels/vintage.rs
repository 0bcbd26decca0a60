//! Sepia toning with a warm/cool color bias.

use super::buffer::{PixelBuffer, to_channel};

/// Classic sepia matrix, one row per output channel.
const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Channel shift at `warmth = ±100`.
const WARMTH_SHIFT: f32 = 20.0;

/// Blend each pixel toward sepia, then bias the color temperature.
///
/// * `intensity` - sepia mix in `[0, 100]`; 0 keeps the original colors
/// * `warmth` - signed temperature bias in `[-100, 100]`. Positive values lift
///   red and green and pull blue down. Negative values only lift blue.
///
/// Alpha is left unchanged.
pub fn vintage(buf: &PixelBuffer, intensity: f32, warmth: f32) -> PixelBuffer {
    let k = intensity.clamp(0.0, 100.0) / 100.0;
    let w = warmth.clamp(-100.0, 100.0) / 100.0;

    buf.map_pixels(|[r, g, b, a]| {
        let src = [r as f32, g as f32, b as f32];
        let mut out = [0.0f32; 3];
        for (ch, row) in SEPIA.iter().enumerate() {
            let toned = row[0] * src[0] + row[1] * src[1] + row[2] * src[2];
            out[ch] = src[ch] * (1.0 - k) + toned * k;
        }

        if w > 0.0 {
            out[0] += WARMTH_SHIFT * w;
            out[1] += WARMTH_SHIFT * 0.5 * w;
            out[2] -= WARMTH_SHIFT * w;
        } else if w < 0.0 {
            out[2] -= WARMTH_SHIFT * w;
        }

        [to_channel(out[0]), to_channel(out[1]), to_channel(out[2]), a]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_intensity_and_warmth_is_identity() {
        let buf = PixelBuffer::from_fn(8, 8, |x, y| [(x * 30) as u8, (y * 30) as u8, 90, 128]);
        assert_eq!(vintage(&buf, 0.0, 0.0), buf);
    }

    #[test]
    fn full_sepia_on_gray() {
        let buf = PixelBuffer::filled(1, 1, [100, 100, 100, 255]);
        // rows sum to 1.351, 1.203, 0.937
        assert_eq!(vintage(&buf, 100.0, 0.0).pixel(0, 0), Some([135, 120, 94, 255]));
    }

    #[test]
    fn half_intensity_mixes_original_and_sepia() {
        let buf = PixelBuffer::filled(1, 1, [100, 100, 100, 255]);
        // halfway between 100 and 135.1 / 120.3 / 93.7
        assert_eq!(vintage(&buf, 50.0, 0.0).pixel(0, 0), Some([118, 110, 97, 255]));
    }

    #[test]
    fn positive_warmth_warms() {
        let buf = PixelBuffer::filled(1, 1, [100, 100, 100, 255]);
        assert_eq!(vintage(&buf, 0.0, 100.0).pixel(0, 0), Some([120, 110, 80, 255]));
    }

    #[test]
    fn negative_warmth_only_touches_blue() {
        let buf = PixelBuffer::filled(1, 1, [100, 100, 100, 255]);
        assert_eq!(vintage(&buf, 0.0, -100.0).pixel(0, 0), Some([100, 100, 120, 255]));
    }

    #[test]
    fn out_of_range_arguments_are_clamped() {
        let buf = PixelBuffer::filled(1, 1, [100, 100, 100, 40]);
        assert_eq!(vintage(&buf, 500.0, 900.0), vintage(&buf, 100.0, 100.0));
    }

    #[test]
    fn saturates_at_white() {
        let buf = PixelBuffer::filled(1, 1, [250, 250, 250, 255]);
        let [r, g, _, _] = vintage(&buf, 100.0, 100.0).pixel(0, 0).unwrap();
        assert_eq!((r, g), (255, 255));
    }
}
