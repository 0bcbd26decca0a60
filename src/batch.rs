//! Batch transform orchestration.
//!
//! Applies a list of [`BatchOperation`]s through a [`TransformBackend`] with
//! bounded parallelism, isolating failures per item.
//!
//! ## Execution model
//!
//! ```text
//! operations: [a b c | d e f | g]      concurrency = 3
//!              chunk 1  chunk 2  chunk 3
//! ```
//!
//! - Operations are split into consecutive chunks of `concurrency` items.
//! - Each chunk runs in parallel on rayon's pool, so at most `concurrency`
//!   backend calls are in flight at any instant.
//! - Chunks run strictly in sequence: chunk *k + 1* starts only after every
//!   item of chunk *k* has finished.
//! - Once a chunk resolves, the orchestrating thread walks its results in
//!   order. A failure is recorded in [`BatchProcessingResult::failed`] and
//!   announced with [`BatchEvent::Failed`]; then the `completed` counter is
//!   bumped and [`BatchEvent::Progress`] is sent. Exactly one progress event
//!   is sent per item.
//!
//! An item failure (invalid URI, unknown type, bad params, backend error or
//! backend panic) never aborts the batch; [`process_batch`] always returns a
//! result.
//!
//! There is no per-item timeout: a backend call that never returns blocks
//! its chunk.
//!
//! ## Operation format
//!
//! ```json
//! {"uri": "/photos/dawn.jpg", "type": "resize", "params": {"width": 800}}
//! {"uri": "/photos/dawn.jpg", "type": "crop", "params": {"x": 0, "y": 0, "width": 400, "height": 300}}
//! {"uri": "/photos/dawn.jpg", "type": "compress", "params": {"quality": 70}}
//! {"uri": "/photos/dawn.jpg", "type": "convert", "params": {"format": "webp"},
//!  "options": {"output": "/web/dawn.webp"}}
//! ```
//!
//! `options` may carry `output` (explicit output path), `format` and
//! `quality` (encoding overrides).

use crate::transform::{
    BackendError, CropParams, EncodeParams, ManipulationResult, OutputFormat, Quality,
    ResizeParams, TransformBackend, derive_output_path, uri_to_path, validate_uri,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Default number of operations in flight.
pub const DEFAULT_CONCURRENCY: usize = 3;

#[derive(Error, Debug)]
pub enum BatchItemError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Unknown operation type: {0}")]
    UnknownOperationType(String),
    #[error("Manipulation failed: {0}")]
    ManipulationFailed(#[from] BackendError),
}

impl BatchItemError {
    /// Stable error code for machine consumers.
    pub fn code(&self) -> &'static str {
        match self {
            BatchItemError::Validation(_) => "VALIDATION_ERROR",
            BatchItemError::UnknownOperationType(_) => "UNKNOWN_OPERATION_TYPE",
            BatchItemError::ManipulationFailed(_) => "MANIPULATION_FAILED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Resize,
    Crop,
    Compress,
    Convert,
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Resize => "resize",
            OperationType::Crop => "crop",
            OperationType::Compress => "compress",
            OperationType::Convert => "convert",
        }
    }
}

impl FromStr for OperationType {
    type Err = BatchItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resize" => Ok(OperationType::Resize),
            "crop" => Ok(OperationType::Crop),
            "compress" => Ok(OperationType::Compress),
            "convert" => Ok(OperationType::Convert),
            other => Err(BatchItemError::UnknownOperationType(other.to_string())),
        }
    }
}

/// One unit of batch work. The `uri` is the operation's only identity.
///
/// `type` is kept as a string so an unrecognized type fails that item alone
/// instead of rejecting the whole batch at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOperation {
    pub uri: String,
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

impl BatchOperation {
    pub fn new(uri: impl Into<String>, op_type: OperationType, params: Map<String, Value>) -> Self {
        Self {
            uri: uri.into(),
            op_type: op_type.as_str().to_string(),
            params,
            options: None,
        }
    }

    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = Some(options);
        self
    }
}

/// A validated operation, ready for a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedOperation {
    Resize(ResizeParams),
    Crop(CropParams),
    Compress(EncodeParams),
    Convert(EncodeParams),
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSuccess {
    pub uri: String,
    pub result: ManipulationResult,
}

#[derive(Debug, Serialize)]
pub struct BatchFailure {
    pub uri: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: BatchItemError,
}

fn serialize_display<S: Serializer>(err: &BatchItemError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

/// Outcome of a batch.
///
/// `success_count + failure_count == total_processed == operations.len()`,
/// and every operation appears in exactly one of `successful` / `failed`.
#[derive(Debug, Default, Serialize)]
pub struct BatchProcessingResult {
    pub successful: Vec<BatchSuccess>,
    pub failed: Vec<BatchFailure>,
    pub total_processed: usize,
    pub success_count: usize,
    pub failure_count: usize,
}

/// Per-item notifications sent while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// An item finished (successfully or not).
    Progress {
        completed: usize,
        total: usize,
        uri: String,
    },
    /// An item failed. Always followed by that item's `Progress`.
    Failed { uri: String, error: String },
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum operations in flight. 0 is treated as 1.
    pub concurrency: usize,
    /// Encoding quality when neither params nor options give one.
    pub quality: Quality,
    /// Receives progress and failure events.
    pub events: Option<Sender<BatchEvent>>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            quality: Quality::default(),
            events: None,
        }
    }
}

impl BatchOptions {
    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening
            let _ = tx.send(event);
        }
    }
}

// ============================================================================
// Planning
// ============================================================================

fn get_u32(map: &Map<String, Value>, key: &str) -> Result<Option<u32>, BatchItemError> {
    let Some(value) = map.get(key) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let n = value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
        .ok_or_else(|| {
            BatchItemError::Validation(format!("{key} must be a non-negative number"))
        })?;
    u32::try_from(n)
        .map(Some)
        .map_err(|_| BatchItemError::Validation(format!("{key} is too large")))
}

fn get_str<'a>(map: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>, BatchItemError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(BatchItemError::Validation(format!("{key} must be a string"))),
    }
}

fn get_format(map: &Map<String, Value>) -> Result<Option<OutputFormat>, BatchItemError> {
    get_str(map, "format")?
        .map(|s| s.parse().map_err(BatchItemError::Validation))
        .transpose()
}

fn get_quality(map: &Map<String, Value>) -> Result<Option<Quality>, BatchItemError> {
    match get_u32(map, "quality")? {
        Some(q) if !(1..=100).contains(&q) => Err(BatchItemError::Validation(format!(
            "quality must be 1-100, got {q}"
        ))),
        q => Ok(q.map(Quality::new)),
    }
}

/// Encoding overrides and output location shared by every operation type.
struct Target {
    source: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
    quality: Quality,
}

impl Target {
    fn output_or(&self, suffix: &str, format: OutputFormat) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derive_output_path(&self.source, suffix, format))
    }
}

fn target(op: &BatchOperation, source: &Path, default_quality: Quality) -> Result<Target, BatchItemError> {
    let empty = Map::new();
    let options = op.options.as_ref().unwrap_or(&empty);
    let format = match get_format(options)? {
        Some(f) => f,
        None => OutputFormat::from_path(source).unwrap_or(OutputFormat::Jpeg),
    };
    let quality = get_quality(&op.params)?
        .or(get_quality(options)?)
        .unwrap_or(default_quality);
    Ok(Target {
        source: source.to_path_buf(),
        output: get_str(options, "output")?.map(uri_to_path),
        format,
        quality,
    })
}

/// Validate an operation and turn it into backend parameters.
pub fn plan_operation(
    op: &BatchOperation,
    default_quality: Quality,
) -> Result<PlannedOperation, BatchItemError> {
    let validation = validate_uri(&op.uri);
    if !validation.is_valid {
        return Err(BatchItemError::Validation(
            validation.error.unwrap_or_else(|| "invalid URI".to_string()),
        ));
    }
    let op_type: OperationType = op.op_type.parse()?;
    let source = uri_to_path(&op.uri);
    let t = target(op, &source, default_quality)?;
    let params = &op.params;

    let planned = match op_type {
        OperationType::Resize => {
            let width = get_u32(params, "width")?;
            let height = get_u32(params, "height")?;
            let suffix = match (width, height) {
                (Some(0), _) | (_, Some(0)) => {
                    return Err(BatchItemError::Validation(
                        "resize dimensions must be greater than zero".into(),
                    ));
                }
                (Some(w), Some(h)) => format!("{w}x{h}"),
                (Some(w), None) => format!("w{w}"),
                (None, Some(h)) => format!("h{h}"),
                (None, None) => {
                    return Err(BatchItemError::Validation(
                        "resize requires width or height".into(),
                    ));
                }
            };
            PlannedOperation::Resize(ResizeParams {
                output: t.output_or(&suffix, t.format),
                source: t.source.clone(),
                width,
                height,
                format: t.format,
                quality: t.quality,
            })
        }
        OperationType::Crop => {
            let x = get_u32(params, "x")?.unwrap_or(0);
            let y = get_u32(params, "y")?.unwrap_or(0);
            let (Some(width), Some(height)) = (get_u32(params, "width")?, get_u32(params, "height")?)
            else {
                return Err(BatchItemError::Validation(
                    "crop requires width and height".into(),
                ));
            };
            if width == 0 || height == 0 {
                return Err(BatchItemError::Validation(
                    "crop dimensions must be greater than zero".into(),
                ));
            }
            PlannedOperation::Crop(CropParams {
                output: t.output_or(&format!("crop-{width}x{height}"), t.format),
                source: t.source.clone(),
                x,
                y,
                width,
                height,
                format: t.format,
                quality: t.quality,
            })
        }
        OperationType::Compress => PlannedOperation::Compress(EncodeParams {
            output: t.output_or("compressed", t.format),
            source: t.source.clone(),
            format: t.format,
            quality: t.quality,
        }),
        OperationType::Convert => {
            let format = get_format(params)?.ok_or_else(|| {
                BatchItemError::Validation("convert requires a target format".into())
            })?;
            PlannedOperation::Convert(EncodeParams {
                output: t.output_or("converted", format),
                source: t.source.clone(),
                format,
                quality: t.quality,
            })
        }
    };
    Ok(planned)
}

/// Hand a planned operation to the backend.
pub fn execute(
    backend: &impl TransformBackend,
    planned: &PlannedOperation,
) -> Result<ManipulationResult, BackendError> {
    match planned {
        PlannedOperation::Resize(p) => backend.resize(p),
        PlannedOperation::Crop(p) => backend.crop(p),
        PlannedOperation::Compress(p) => backend.compress(p),
        PlannedOperation::Convert(p) => backend.convert(p),
    }
}

fn run_operation(
    backend: &impl TransformBackend,
    op: &BatchOperation,
    default_quality: Quality,
) -> Result<ManipulationResult, BatchItemError> {
    let planned = plan_operation(op, default_quality)?;
    // A panicking backend call fails its own item only
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| execute(backend, &planned)))
        .unwrap_or_else(|payload| {
            Err(BackendError::ProcessingFailed(format!(
                "backend panicked: {}",
                panic_message(payload.as_ref())
            )))
        });
    Ok(outcome?)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

// ============================================================================
// Orchestration
// ============================================================================

/// Run every operation, `options.concurrency` at a time.
///
/// See the [module docs](self) for ordering and event guarantees.
pub fn process_batch(
    backend: &impl TransformBackend,
    operations: &[BatchOperation],
    options: &BatchOptions,
) -> BatchProcessingResult {
    let total = operations.len();
    let mut result = BatchProcessingResult::default();
    if total == 0 {
        return result;
    }

    let chunk_size = options.concurrency.max(1);
    let quality = options.quality;
    let mut completed = 0;

    for chunk in operations.chunks(chunk_size) {
        let outcomes: Vec<_> = chunk
            .par_iter()
            .map(|op| run_operation(backend, op, quality))
            .collect();

        for (op, outcome) in chunk.iter().zip(outcomes) {
            match outcome {
                Ok(manipulation) => result.successful.push(BatchSuccess {
                    uri: op.uri.clone(),
                    result: manipulation,
                }),
                Err(error) => {
                    options.emit(BatchEvent::Failed {
                        uri: op.uri.clone(),
                        error: error.to_string(),
                    });
                    result.failed.push(BatchFailure {
                        uri: op.uri.clone(),
                        error,
                    });
                }
            }
            completed += 1;
            options.emit(BatchEvent::Progress {
                completed,
                total,
                uri: op.uri.clone(),
            });
        }
    }

    result.total_processed = completed;
    result.success_count = result.successful.len();
    result.failure_count = result.failed.len();
    result
}

/// Resize every URI to the given width and/or height.
pub fn resize_batch<S: AsRef<str>>(
    backend: &impl TransformBackend,
    uris: &[S],
    width: Option<u32>,
    height: Option<u32>,
    options: &BatchOptions,
) -> BatchProcessingResult {
    let mut params = Map::new();
    if let Some(w) = width {
        params.insert("width".into(), w.into());
    }
    if let Some(h) = height {
        params.insert("height".into(), h.into());
    }
    let operations: Vec<_> = uris
        .iter()
        .map(|uri| BatchOperation::new(uri.as_ref(), OperationType::Resize, params.clone()))
        .collect();
    process_batch(backend, &operations, options)
}

/// Re-encode every URI in its own format at `quality`.
pub fn compress_batch<S: AsRef<str>>(
    backend: &impl TransformBackend,
    uris: &[S],
    quality: u32,
    options: &BatchOptions,
) -> BatchProcessingResult {
    let mut params = Map::new();
    params.insert("quality".into(), quality.into());
    let operations: Vec<_> = uris
        .iter()
        .map(|uri| BatchOperation::new(uri.as_ref(), OperationType::Compress, params.clone()))
        .collect();
    process_batch(backend, &operations, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::backend::tests::{MockBackend, RecordedOp};
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::time::Duration;

    fn op(value: Value) -> BatchOperation {
        serde_json::from_value(value).unwrap()
    }

    fn resize_ops(uris: &[&str]) -> Vec<BatchOperation> {
        uris.iter()
            .map(|u| op(json!({"uri": u, "type": "resize", "params": {"width": 100}})))
            .collect()
    }

    fn options_with_events(concurrency: usize) -> (BatchOptions, mpsc::Receiver<BatchEvent>) {
        let (tx, rx) = mpsc::channel();
        let options = BatchOptions {
            concurrency,
            events: Some(tx),
            ..BatchOptions::default()
        };
        (options, rx)
    }

    // =========================================================================
    // Planning
    // =========================================================================

    #[test]
    fn parse_operation_json() {
        let operation = op(json!({
            "uri": "/in/a.jpg",
            "type": "convert",
            "params": {"format": "png"},
            "options": {"output": "/out/a.png"}
        }));
        assert_eq!(operation.op_type, "convert");
        assert!(operation.options.is_some());
    }

    #[test]
    fn plan_resize_width_only() {
        let planned = plan_operation(
            &op(json!({"uri": "/in/a.jpg", "type": "resize", "params": {"width": 800}})),
            Quality::default(),
        )
        .unwrap();
        assert_eq!(
            planned,
            PlannedOperation::Resize(ResizeParams {
                source: "/in/a.jpg".into(),
                output: "/in/a-w800.jpg".into(),
                width: Some(800),
                height: None,
                format: OutputFormat::Jpeg,
                quality: Quality::default(),
            })
        );
    }

    #[test]
    fn plan_resize_requires_a_dimension() {
        let err = plan_operation(
            &op(json!({"uri": "/in/a.jpg", "type": "resize", "params": {}})),
            Quality::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BatchItemError::Validation(_)));
    }

    #[test]
    fn plan_crop_defaults_origin() {
        let planned = plan_operation(
            &op(json!({"uri": "file:///in/a.png", "type": "crop",
                       "params": {"width": 40, "height": 30}})),
            Quality::default(),
        )
        .unwrap();
        let PlannedOperation::Crop(p) = planned else {
            panic!("expected crop");
        };
        assert_eq!((p.x, p.y, p.width, p.height), (0, 0, 40, 30));
        assert_eq!(p.source, PathBuf::from("/in/a.png"));
        assert_eq!(p.output, PathBuf::from("/in/a-crop-40x30.png"));
        assert_eq!(p.format, OutputFormat::Png);
    }

    #[test]
    fn plan_crop_rejects_negative_values() {
        let err = plan_operation(
            &op(json!({"uri": "/in/a.png", "type": "crop",
                       "params": {"x": -5, "width": 40, "height": 30}})),
            Quality::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BatchItemError::Validation(msg) if msg.contains('x')));
    }

    #[test]
    fn plan_compress_quality_precedence() {
        let from_params = plan_operation(
            &op(json!({"uri": "/in/a.jpg", "type": "compress", "params": {"quality": 40},
                       "options": {"quality": 70}})),
            Quality::default(),
        )
        .unwrap();
        assert!(matches!(from_params, PlannedOperation::Compress(p) if p.quality == Quality::new(40)));

        let from_options = plan_operation(
            &op(json!({"uri": "/in/a.jpg", "type": "compress", "options": {"quality": 70}})),
            Quality::default(),
        )
        .unwrap();
        assert!(matches!(from_options, PlannedOperation::Compress(p) if p.quality == Quality::new(70)));

        let from_default = plan_operation(
            &op(json!({"uri": "/in/a.jpg", "type": "compress"})),
            Quality::new(55),
        )
        .unwrap();
        assert!(matches!(from_default, PlannedOperation::Compress(p) if p.quality == Quality::new(55)));
    }

    #[test]
    fn plan_convert_uses_target_format_and_output_option() {
        let planned = plan_operation(
            &op(json!({"uri": "/in/a.jpg", "type": "convert", "params": {"format": "webp"},
                       "options": {"output": "file:///out/a.webp"}})),
            Quality::default(),
        )
        .unwrap();
        let PlannedOperation::Convert(p) = planned else {
            panic!("expected convert");
        };
        assert_eq!(p.format, OutputFormat::Webp);
        assert_eq!(p.output, PathBuf::from("/out/a.webp"));
    }

    #[test]
    fn plan_convert_requires_known_format() {
        for params in [json!({}), json!({"format": "gif"}), json!({"format": 3})] {
            let err = plan_operation(
                &op(json!({"uri": "/in/a.jpg", "type": "convert", "params": params})),
                Quality::default(),
            )
            .unwrap_err();
            assert_eq!(err.code(), "VALIDATION_ERROR");
        }
    }

    #[test]
    fn plan_unknown_type() {
        let err = plan_operation(
            &op(json!({"uri": "/in/a.jpg", "type": "rotate"})),
            Quality::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BatchItemError::UnknownOperationType(t) if t == "rotate"));
    }

    #[test]
    fn plan_invalid_uri() {
        let err = plan_operation(
            &op(json!({"uri": "", "type": "resize", "params": {"width": 1}})),
            Quality::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BatchItemError::Validation(_)));
    }

    // =========================================================================
    // process_batch
    // =========================================================================

    #[test]
    fn empty_batch_returns_zero_totals() {
        let backend = MockBackend::new();
        let (options, rx) = options_with_events(3);
        let result = process_batch(&backend, &[], &options);
        assert_eq!(result.total_processed, 0);
        assert_eq!(result.success_count, 0);
        assert_eq!(result.failure_count, 0);
        assert!(backend.get_operations().is_empty());
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn counts_add_up_and_uris_partition() {
        let backend = MockBackend::failing_on(&["/in/b.jpg", "/in/e.jpg"]);
        let mut ops = resize_ops(&["/in/a.jpg", "/in/b.jpg", "/in/c.jpg", "/in/d.jpg", "/in/e.jpg"]);
        ops.push(op(json!({"uri": "/in/f.jpg", "type": "sharpen"})));
        ops.push(op(json!({"uri": "/in/g.gif", "type": "resize", "params": {"width": 1}})));

        let result = process_batch(&backend, &ops, &BatchOptions::default());

        assert_eq!(result.total_processed, ops.len());
        assert_eq!(result.success_count + result.failure_count, result.total_processed);
        assert_eq!(result.success_count, 3);
        assert_eq!(result.failure_count, 4);

        let ok: HashSet<_> = result.successful.iter().map(|s| s.uri.as_str()).collect();
        let failed: HashSet<_> = result.failed.iter().map(|f| f.uri.as_str()).collect();
        assert!(ok.is_disjoint(&failed));
        for operation in &ops {
            assert!(ok.contains(operation.uri.as_str()) || failed.contains(operation.uri.as_str()));
        }
    }

    #[test]
    fn failure_kinds_are_preserved() {
        let backend = MockBackend::failing_on(&["/in/bad.jpg"]);
        let ops = vec![
            op(json!({"uri": "/in/bad.jpg", "type": "compress"})),
            op(json!({"uri": "/in/ok.jpg", "type": "flip"})),
            op(json!({"uri": "ftp://host/x.jpg", "type": "compress"})),
        ];
        let result = process_batch(&backend, &ops, &BatchOptions::default());
        let codes: Vec<_> = result.failed.iter().map(|f| f.error.code()).collect();
        assert_eq!(
            codes,
            vec!["MANIPULATION_FAILED", "UNKNOWN_OPERATION_TYPE", "VALIDATION_ERROR"]
        );
        // Only the valid operation reached the backend
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn sequential_batch_reports_progress_in_order() {
        let backend = MockBackend::new();
        let (options, rx) = options_with_events(1);
        let ops = resize_ops(&["a.jpg", "b.jpg", "c.jpg"]);

        process_batch(&backend, &ops, &options);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                BatchEvent::Progress {
                    completed: 1,
                    total: 3,
                    uri: "a.jpg".into()
                },
                BatchEvent::Progress {
                    completed: 2,
                    total: 3,
                    uri: "b.jpg".into()
                },
                BatchEvent::Progress {
                    completed: 3,
                    total: 3,
                    uri: "c.jpg".into()
                },
            ]
        );

        let sources: Vec<_> = backend
            .get_operations()
            .into_iter()
            .map(|op| match op {
                RecordedOp::Resize { source, .. } => source,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(sources, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn failure_emits_error_then_progress() {
        let backend = MockBackend::failing_on(&["b.jpg"]);
        let (options, rx) = options_with_events(2);
        let ops = resize_ops(&["a.jpg", "b.jpg"]);

        let result = process_batch(&backend, &ops, &options);
        assert_eq!(result.failure_count, 1);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[1], BatchEvent::Failed { uri, error }
            if uri == "b.jpg" && error.contains("mock failure")));
        assert!(matches!(&events[2], BatchEvent::Progress { completed: 2, uri, .. } if uri == "b.jpg"));
    }

    #[test]
    fn one_progress_event_per_item() {
        let backend = MockBackend::failing_on(&["c.jpg"]);
        let (options, rx) = options_with_events(3);
        let uris: Vec<String> = (0..10).map(|i| format!("{i}.jpg")).collect();
        let mut ops: Vec<_> = uris
            .iter()
            .map(|u| op(json!({"uri": u, "type": "compress"})))
            .collect();
        ops.push(op(json!({"uri": "c.jpg", "type": "compress"})));

        process_batch(&backend, &ops, &options);

        let progress: Vec<_> = rx
            .try_iter()
            .filter_map(|e| match e {
                BatchEvent::Progress { completed, total, .. } => Some((completed, total)),
                BatchEvent::Failed { .. } => None,
            })
            .collect();
        let expected: Vec<_> = (1..=11).map(|c| (c, 11)).collect();
        assert_eq!(progress, expected);
    }

    #[test]
    fn never_exceeds_concurrency() {
        for k in [1, 2, 3] {
            let backend = MockBackend::with_delay(Duration::from_millis(20));
            let uris: Vec<String> = (0..7).map(|i| format!("{i}.png")).collect();
            let options = BatchOptions {
                concurrency: k,
                ..BatchOptions::default()
            };
            let result = resize_batch(&backend, &uris, Some(10), None, &options);

            assert_eq!(result.success_count, 7);
            assert!(backend.max_in_flight() >= 1);
            assert!(
                backend.max_in_flight() <= k,
                "concurrency {k} saw {} in flight",
                backend.max_in_flight()
            );
        }
    }

    #[test]
    fn chunk_items_overlap() {
        for k in [2, 3] {
            // Own pool so other tests cannot hold the workers
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(k)
                .build()
                .unwrap();
            let backend = MockBackend::with_delay(Duration::from_millis(100));
            let uris: Vec<String> = (0..6).map(|i| format!("{i}.png")).collect();
            let options = BatchOptions {
                concurrency: k,
                ..BatchOptions::default()
            };
            pool.install(|| resize_batch(&backend, &uris, Some(10), None, &options));
            assert_eq!(backend.max_in_flight(), k, "concurrency {k}");
        }
    }

    /// Delegates to a [`MockBackend`] but panics on one source.
    struct PanickingBackend {
        inner: MockBackend,
        panic_on: &'static str,
    }

    impl PanickingBackend {
        fn check(&self, source: &Path) {
            if source == Path::new(self.panic_on) {
                panic!("decoder exploded on {}", source.display());
            }
        }
    }

    impl TransformBackend for PanickingBackend {
        fn resize(&self, params: &ResizeParams) -> Result<ManipulationResult, BackendError> {
            self.check(&params.source);
            self.inner.resize(params)
        }

        fn crop(&self, params: &CropParams) -> Result<ManipulationResult, BackendError> {
            self.check(&params.source);
            self.inner.crop(params)
        }

        fn compress(&self, params: &EncodeParams) -> Result<ManipulationResult, BackendError> {
            self.check(&params.source);
            self.inner.compress(params)
        }

        fn convert(&self, params: &EncodeParams) -> Result<ManipulationResult, BackendError> {
            self.check(&params.source);
            self.inner.convert(params)
        }
    }

    #[test]
    fn backend_panic_fails_only_its_item() {
        let backend = PanickingBackend {
            inner: MockBackend::new(),
            panic_on: "b.jpg",
        };
        let (options, rx) = options_with_events(3);
        let ops = resize_ops(&["a.jpg", "b.jpg", "c.jpg"]);

        let result = process_batch(&backend, &ops, &options);

        assert_eq!(result.total_processed, 3);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 1);
        let failure = &result.failed[0];
        assert_eq!(failure.uri, "b.jpg");
        assert_eq!(failure.error.code(), "MANIPULATION_FAILED");
        assert!(failure.error.to_string().contains("decoder exploded on b.jpg"));

        let progress = rx
            .try_iter()
            .filter(|e| matches!(e, BatchEvent::Progress { .. }))
            .count();
        assert_eq!(progress, 3);
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        for (params, options) in [
            (json!({"quality": 0}), json!({})),
            (json!({"quality": 500}), json!({})),
            (json!({}), json!({"quality": 101})),
        ] {
            let err = plan_operation(
                &op(json!({"uri": "/in/a.jpg", "type": "compress",
                           "params": params, "options": options})),
                Quality::default(),
            )
            .unwrap_err();
            assert!(matches!(err, BatchItemError::Validation(msg) if msg.contains("quality")));
        }
        assert!(
            plan_operation(
                &op(json!({"uri": "/in/a.jpg", "type": "compress", "params": {"quality": 100}})),
                Quality::default(),
            )
            .is_ok()
        );
    }

    #[test]
    fn zero_concurrency_runs_sequentially() {
        let backend = MockBackend::with_delay(Duration::from_millis(5));
        let options = BatchOptions {
            concurrency: 0,
            ..BatchOptions::default()
        };
        let result = compress_batch(&backend, &["a.jpg", "b.jpg", "c.jpg"], 60, &options);
        assert_eq!(result.success_count, 3);
        assert_eq!(backend.max_in_flight(), 1);
    }

    #[test]
    fn compress_batch_builds_compress_operations() {
        let backend = MockBackend::new();
        let options = BatchOptions {
            concurrency: 1,
            ..BatchOptions::default()
        };
        compress_batch(&backend, &["a.jpg", "b.png"], 65, &options);
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Compress {
                    source: "a.jpg".into(),
                    quality: 65
                },
                RecordedOp::Compress {
                    source: "b.png".into(),
                    quality: 65
                },
            ]
        );
    }

    #[test]
    fn resize_batch_passes_both_dimensions() {
        let backend = MockBackend::new();
        resize_batch(&backend, &["a.jpg"], Some(320), Some(240), &BatchOptions::default());
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Resize {
                width: Some(320),
                height: Some(240),
                output,
                ..
            } if output == "a-320x240.jpg"
        ));
    }

    #[test]
    fn dropped_receiver_does_not_abort() {
        let backend = MockBackend::new();
        let (options, rx) = options_with_events(2);
        drop(rx);
        let result = process_batch(&backend, &resize_ops(&["a.jpg", "b.jpg"]), &options);
        assert_eq!(result.success_count, 2);
    }

    #[test]
    fn result_serializes_errors_as_messages() {
        let backend = MockBackend::new();
        let ops = vec![
            op(json!({"uri": "a.jpg", "type": "resize", "params": {"width": 10}})),
            op(json!({"uri": "b.jpg", "type": "warp"})),
        ];
        let result = process_batch(&backend, &ops, &BatchOptions::default());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["total_processed"], 2);
        assert_eq!(json["successful"][0]["result"]["format"], "jpeg");
        assert_eq!(json["failed"][0]["error"], "Unknown operation type: warp");
    }
}
