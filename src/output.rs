//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Presets
//!
//! ```text
//! Basic
//! 001 Brightness (brightness)
//!     brightness: -100..100, default 0
//!
//! Vintage
//! 001 Vintage (vintage)
//!     intensity: 0..100, default 60
//!     warmth: -100..100, default 30
//! ```
//!
//! ## Batch
//!
//! Progress lines stream while the batch runs; a failure line precedes the
//! progress line of the item that failed.
//!
//! ```text
//! [1/3] /photos/dawn.jpg
//! FAILED /photos/dusk.jpg: Manipulation failed: IO error: ...
//! [2/3] /photos/dusk.jpg
//! [3/3] /photos/noon.jpg
//!
//! Succeeded
//! 001 /photos/dawn.jpg → /photos/dawn-w800.jpg (800x600 jpeg)
//! 002 /photos/noon.jpg → /photos/noon-w800.jpg (800x533 jpeg)
//! Failed
//! 001 /photos/dusk.jpg
//!     Error: Manipulation failed: IO error: ...
//!
//! Processed 3 operations: 2 succeeded, 1 failed
//! ```
//!
//! ## Filter
//!
//! ```text
//! Vintage (vintage) at 80%
//!     Source: in.jpg
//!     Output: out.png (640x480)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchProcessingResult};
use crate::presets::{FilterCategory, FilterParameter, FilterPreset, ParameterValue};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Trim a trailing `.0` so whole numbers read naturally.
fn format_number(n: f32) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn format_value(value: &ParameterValue) -> String {
    match value {
        ParameterValue::Number(n) => format_number(*n),
        ParameterValue::Bool(b) => b.to_string(),
        ParameterValue::Color(c) => c.clone(),
    }
}

fn parameter_line(param: &FilterParameter) -> String {
    match (param.min, param.max) {
        (Some(min), Some(max)) => format!(
            "    {}: {}..{}, default {}",
            param.name,
            format_number(min),
            format_number(max),
            format_value(&param.value)
        ),
        _ => format!("    {}: default {}", param.name, format_value(&param.value)),
    }
}

fn category_title(category: FilterCategory) -> &'static str {
    match category {
        FilterCategory::Basic => "Basic",
        FilterCategory::Color => "Color",
        FilterCategory::Artistic => "Artistic",
        FilterCategory::Vintage => "Vintage",
    }
}

// ============================================================================
// Presets
// ============================================================================

/// Format presets grouped by category, in catalog order.
pub fn format_presets(presets: &[&FilterPreset]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<FilterCategory> = None;
    let mut pos = 0;

    for preset in presets {
        if current != Some(preset.category) {
            if current.is_some() {
                lines.push(String::new());
            }
            lines.push(category_title(preset.category).to_string());
            current = Some(preset.category);
            pos = 0;
        }
        pos += 1;
        lines.push(format!(
            "{} {} ({})",
            format_index(pos),
            preset.name,
            preset.id
        ));
        lines.extend(preset.parameters.iter().map(parameter_line));
    }
    lines
}

pub fn print_presets(presets: &[&FilterPreset]) {
    for line in format_presets(presets) {
        println!("{}", line);
    }
}

// ============================================================================
// Filter
// ============================================================================

/// Format the outcome of applying one preset to one image.
pub fn format_filter_result(
    preset: &FilterPreset,
    intensity: f32,
    source: &Path,
    output: &Path,
    dimensions: (u32, u32),
) -> Vec<String> {
    vec![
        format!(
            "{} ({}) at {}%",
            preset.name,
            preset.id,
            format_number(intensity)
        ),
        format!("    Source: {}", source.display()),
        format!(
            "    Output: {} ({}x{})",
            output.display(),
            dimensions.0,
            dimensions.1
        ),
    ]
}

pub fn print_filter_result(
    preset: &FilterPreset,
    intensity: f32,
    source: &Path,
    output: &Path,
    dimensions: (u32, u32),
) {
    for line in format_filter_result(preset, intensity, source, output, dimensions) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Format a single batch event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Progress {
            completed,
            total,
            uri,
        } => vec![format!("[{}/{}] {}", completed, total, uri)],
        BatchEvent::Failed { uri, error } => vec![format!("FAILED {}: {}", uri, error)],
    }
}

/// Format the end-of-batch report: successes, failures, totals.
pub fn format_batch_summary(result: &BatchProcessingResult) -> Vec<String> {
    let mut lines = Vec::new();

    if !result.successful.is_empty() {
        lines.push("Succeeded".to_string());
        for (i, success) in result.successful.iter().enumerate() {
            let r = &success.result;
            lines.push(format!(
                "{} {} \u{2192} {} ({}x{} {})",
                format_index(i + 1),
                success.uri,
                r.uri,
                r.width,
                r.height,
                r.format
            ));
        }
    }

    if !result.failed.is_empty() {
        lines.push("Failed".to_string());
        for (i, failure) in result.failed.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), failure.uri));
            lines.push(format!("    Error: {}", failure.error));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Processed {} operation{}: {} succeeded, {} failed",
        result.total_processed,
        if result.total_processed == 1 { "" } else { "s" },
        result.success_count,
        result.failure_count
    ));
    lines
}

pub fn print_batch_summary(result: &BatchProcessingResult) {
    for line in format_batch_summary(result) {
        println!("{}", line);
    }
}
