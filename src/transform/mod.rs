//! Image transforms delegated by the batch orchestrator.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Validate** | [`validate_uri`]: scheme + extension check |
//! | **Resize** | Lanczos3 via `image` |
//! | **Crop** | `crop_imm` via `image` |
//! | **Compress / Convert** | JPEG, PNG, WebP encoders via `image` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math and output naming (unit testable)
//! - **Parameters**: Data structures describing transform operations
//! - **Backend**: [`TransformBackend`] trait + [`RustBackend`]
//! - **URI**: validation and URI → path mapping

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;
mod uri;

pub use backend::{BackendError, ManipulationResult, TransformBackend};
pub use calculations::{calculate_resize_dimensions, crop_fits, derive_output_path};
pub use params::{CropParams, EncodeParams, OutputFormat, Quality, ResizeParams};
pub use rust_backend::{RustBackend, filter_file};
pub use uri::{SUPPORTED_EXTENSIONS, UriValidation, uri_to_path, validate_uri};
