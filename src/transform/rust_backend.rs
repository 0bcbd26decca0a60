//! Pure Rust transform backend on top of the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::ImageReader` with format sniffing |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Filter | [`filter_file`]: RGBA8 into a [`PixelBuffer`], then [`apply_filter`] |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality honored) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless, quality ignored) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless, quality ignored) |

use super::backend::{BackendError, ManipulationResult, TransformBackend};
use super::calculations::{calculate_resize_dimensions, crop_fits};
use super::params::{CropParams, EncodeParams, OutputFormat, Quality, ResizeParams};
use crate::pixels::PixelBuffer;
use crate::presets::{FilterState, apply_filter};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Backend that reads and writes image files with the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
pub fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode `img` to `path` in the given format.
pub fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    quality: u32,
) -> Result<(), BackendError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    let encoded = match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality.clamp(1, 100) as u8);
            rgb.write_with_encoder(encoder)
        }
        OutputFormat::Png => img.write_with_encoder(image::codecs::png::PngEncoder::new(writer)),
        OutputFormat::Webp => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(image::codecs::webp::WebPEncoder::new_lossless(writer))
        }
    };
    encoded.map_err(|e| {
        BackendError::ProcessingFailed(format!("{} encode failed: {}", format, e))
    })
}

fn finish(
    img: &DynamicImage,
    output: &Path,
    format: OutputFormat,
    quality: u32,
) -> Result<ManipulationResult, BackendError> {
    save_image(img, output, format, quality)?;
    Ok(ManipulationResult {
        uri: output.to_string_lossy().into_owned(),
        width: img.width(),
        height: img.height(),
        format,
    })
}

/// Decode `source`, run a filter state over it, and write `output`.
///
/// The output format follows the output path's extension.
pub fn filter_file(
    source: &Path,
    output: &Path,
    state: &FilterState,
    quality: Quality,
) -> Result<ManipulationResult, BackendError> {
    let format = OutputFormat::from_path(output).ok_or_else(|| {
        BackendError::ProcessingFailed(format!(
            "Cannot infer output format from {}",
            output.display()
        ))
    })?;
    let buffer = PixelBuffer::from(load_image(source)?.to_rgba8());
    let filtered = apply_filter(&buffer, state);
    let img = DynamicImage::ImageRgba8(filtered.into());
    finish(&img, output, format, quality.value())
}

impl TransformBackend for RustBackend {
    fn resize(&self, params: &ResizeParams) -> Result<ManipulationResult, BackendError> {
        let img = load_image(&params.source)?;
        let (w, h) = calculate_resize_dimensions(img.dimensions(), params.width, params.height)
            .ok_or_else(|| {
                BackendError::ProcessingFailed("Resize needs a non-zero width or height".into())
            })?;
        let resized = img.resize_exact(w, h, FilterType::Lanczos3);
        finish(&resized, &params.output, params.format, params.quality.value())
    }

    fn crop(&self, params: &CropParams) -> Result<ManipulationResult, BackendError> {
        let img = load_image(&params.source)?;
        let (img_w, img_h) = img.dimensions();
        if !crop_fits((img_w, img_h), params.x, params.y, params.width, params.height) {
            return Err(BackendError::OutOfBounds {
                x: params.x,
                y: params.y,
                width: params.width,
                height: params.height,
                image_width: img_w,
                image_height: img_h,
            });
        }
        let cropped = img.crop_imm(params.x, params.y, params.width, params.height);
        finish(&cropped, &params.output, params.format, params.quality.value())
    }

    fn compress(&self, params: &EncodeParams) -> Result<ManipulationResult, BackendError> {
        let img = load_image(&params.source)?;
        finish(&img, &params.output, params.format, params.quality.value())
    }

    fn convert(&self, params: &EncodeParams) -> Result<ManipulationResult, BackendError> {
        let img = load_image(&params.source)?;
        finish(&img, &params.output, params.format, params.quality.value())
    }
}
