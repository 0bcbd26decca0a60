//! Transform backend trait and shared types.
//!
//! The [`TransformBackend`] trait defines the four operations the batch
//! orchestrator delegates: resize, crop, compress and convert. Each takes a
//! parameter struct and returns a [`ManipulationResult`] describing the
//! written output, or a [`BackendError`].
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` in this module.

use super::params::{CropParams, EncodeParams, OutputFormat, ResizeParams};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Crop {width}x{height}+{x}+{y} exceeds image bounds {image_width}x{image_height}")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
}

/// What a backend wrote for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManipulationResult {
    /// Location of the written image.
    pub uri: String,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

/// Trait for image transform backends.
///
/// `Sync` because the orchestrator calls one backend from several rayon
/// workers at once.
pub trait TransformBackend: Sync {
    /// Resize to the requested dimensions.
    fn resize(&self, params: &ResizeParams) -> Result<ManipulationResult, BackendError>;

    /// Cut out a rectangle.
    fn crop(&self, params: &CropParams) -> Result<ManipulationResult, BackendError>;

    /// Re-encode in the source format at the given quality.
    fn compress(&self, params: &EncodeParams) -> Result<ManipulationResult, BackendError>;

    /// Re-encode in another format.
    fn convert(&self, params: &EncodeParams) -> Result<ManipulationResult, BackendError>;
}
