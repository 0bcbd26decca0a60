//! Image URI validation.
//!
//! Batch operations identify images by URI. Accepted forms are plain
//! filesystem paths and `file://` URIs whose extension names a format the
//! [`RustBackend`](super::RustBackend) can decode.

use serde::Serialize;
use std::path::PathBuf;

/// Extensions whose decoders are compiled in.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

const FILE_SCHEME: &str = "file://";

/// Outcome of [`validate_uri`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UriValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UriValidation {
    fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(reason.into()),
        }
    }
}

/// Check that `uri` is non-empty, uses a supported scheme, and names a supported image type.
pub fn validate_uri(uri: &str) -> UriValidation {
    let uri = uri.trim();
    if uri.is_empty() {
        return UriValidation::invalid("URI is empty");
    }
    if uri.contains("://") && !uri.starts_with(FILE_SCHEME) {
        return UriValidation::invalid(format!("Unsupported URI scheme: {uri}"));
    }

    let path = uri_to_path(uri);
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return UriValidation::invalid(format!("Missing file extension: {uri}"));
    };
    if !SUPPORTED_EXTENSIONS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(ext))
    {
        return UriValidation::invalid(format!("Unsupported image type: .{ext}"));
    }
    UriValidation::ok()
}

/// Filesystem path for a URI: strips a leading `file://`, otherwise uses it as-is.
pub fn uri_to_path(uri: &str) -> PathBuf {
    let uri = uri.trim();
    PathBuf::from(uri.strip_prefix(FILE_SCHEME).unwrap_or(uri))
}
