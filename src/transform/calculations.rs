//! Pure calculation functions for transform geometry and output naming.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::OutputFormat;
use std::path::{Path, PathBuf};

/// Target dimensions for a resize.
///
/// With both sides given the result is exactly that size. With one side the
/// other is derived from the source aspect ratio (rounded, at least 1).
/// Returns `None` when neither side is given or a side is zero.
///
/// # Examples
/// ```
/// # use darkroom::transform::calculate_resize_dimensions;
/// assert_eq!(calculate_resize_dimensions((2000, 1500), Some(800), None), Some((800, 600)));
/// assert_eq!(calculate_resize_dimensions((2000, 1500), None, Some(300)), Some((400, 300)));
/// ```
pub fn calculate_resize_dimensions(
    source: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    match (width, height) {
        (Some(0), _) | (_, Some(0)) => None,
        (Some(w), Some(h)) => Some((w, h)),
        (Some(w), None) => {
            if src_w == 0 {
                return None;
            }
            let h = (w as f64 * src_h as f64 / src_w as f64).round().max(1.0) as u32;
            Some((w, h))
        }
        (None, Some(h)) => {
            if src_h == 0 {
                return None;
            }
            let w = (h as f64 * src_w as f64 / src_h as f64).round().max(1.0) as u32;
            Some((w, h))
        }
        (None, None) => None,
    }
}

/// Whether a crop rectangle lies entirely inside an image of `source` size.
pub fn crop_fits(source: (u32, u32), x: u32, y: u32, width: u32, height: u32) -> bool {
    let (src_w, src_h) = source;
    width > 0
        && height > 0
        && x.checked_add(width).is_some_and(|right| right <= src_w)
        && y.checked_add(height).is_some_and(|bottom| bottom <= src_h)
}

/// Output path next to `source`: `<stem>-<suffix>.<ext>`.
///
/// ```
/// # use darkroom::transform::{derive_output_path, OutputFormat};
/// # use std::path::Path;
/// assert_eq!(
///     derive_output_path(Path::new("/photos/dawn.jpg"), "800x600", OutputFormat::Webp),
///     Path::new("/photos/dawn-800x600.webp"),
/// );
/// ```
pub fn derive_output_path(source: &Path, suffix: &str, format: OutputFormat) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let name = format!("{}-{}.{}", stem, suffix, format.extension());
    match source.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
