//! Filter preset catalog and filter state.
//!
//! A [`FilterPreset`] is an immutable catalog entry: an id, a display name, a
//! category, and the parameter schema a UI renders as controls. The catalog is
//! built once on first access and never changes.
//!
//! A [`FilterState`] is a runtime instance of a preset. It carries concrete
//! parameter values, a blend intensity (0–100) and an enabled flag, and is
//! what [`apply_filter`] consumes.
//!
//! ## Catalog
//!
//! | Id | Category | Algorithm | Parameters (default) |
//! |---|---|---|---|
//! | `brightness` | basic | brightness | `brightness` (0) |
//! | `contrast` | basic | contrast | `contrast` (0) |
//! | `saturation` | color | saturation | `saturation` (0) |
//! | `grayscale` | color | saturation | `saturation` (-100) |
//! | `blur` | artistic | box blur | `radius` (2) |
//! | `vintage` | vintage | vintage | `intensity` (60), `warmth` (30) |
//! | `sepia` | vintage | vintage | `intensity` (100), `warmth` (0) |
//!
//! Several presets share one algorithm; dispatch goes through [`FilterKind`]
//! rather than the preset id, so adding an algorithm means adding a variant
//! and the compiler points at every `match` that must handle it.

use crate::pixels::{self, PixelBuffer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresetError {
    #[error("Filter preset not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterCategory {
    Basic,
    Color,
    Artistic,
    Vintage,
}

impl std::fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FilterCategory::Basic => "basic",
            FilterCategory::Color => "color",
            FilterCategory::Artistic => "artistic",
            FilterCategory::Vintage => "vintage",
        };
        f.write_str(name)
    }
}

/// The pixel algorithm a preset runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Brightness,
    Contrast,
    Saturation,
    Vintage,
    BoxBlur,
}

/// How a UI should render a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Slider,
    Color,
    Boolean,
}

/// A parameter value: a slider number, a toggle, or a color string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f32),
    Bool(bool),
    Color(String),
}

impl ParameterValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            ParameterValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f32> for ParameterValue {
    fn from(n: f32) -> Self {
        ParameterValue::Number(n)
    }
}

impl From<bool> for ParameterValue {
    fn from(b: bool) -> Self {
        ParameterValue::Bool(b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterParameter {
    pub name: String,
    pub kind: ParameterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f32>,
    /// Default value, used to seed new filter states.
    pub value: ParameterValue,
    pub label: String,
}

impl FilterParameter {
    fn slider(name: &str, label: &str, min: f32, max: f32, value: f32) -> Self {
        Self {
            name: name.to_string(),
            kind: ParameterKind::Slider,
            min: Some(min),
            max: Some(max),
            step: Some(1.0),
            value: ParameterValue::Number(value),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterPreset {
    pub id: String,
    pub name: String,
    pub category: FilterCategory,
    pub parameters: Vec<FilterParameter>,
    #[serde(skip)]
    pub kind: FilterKind,
}

impl FilterPreset {
    fn new(
        id: &str,
        name: &str,
        category: FilterCategory,
        kind: FilterKind,
        parameters: Vec<FilterParameter>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            parameters,
            kind,
        }
    }
}

static CATALOG: LazyLock<Vec<FilterPreset>> = LazyLock::new(|| {
    use FilterCategory::*;
    vec![
        FilterPreset::new(
            "brightness",
            "Brightness",
            Basic,
            FilterKind::Brightness,
            vec![FilterParameter::slider(
                "brightness",
                "Brightness",
                -100.0,
                100.0,
                0.0,
            )],
        ),
        FilterPreset::new(
            "contrast",
            "Contrast",
            Basic,
            FilterKind::Contrast,
            vec![FilterParameter::slider(
                "contrast", "Contrast", -100.0, 100.0, 0.0,
            )],
        ),
        FilterPreset::new(
            "saturation",
            "Saturation",
            Color,
            FilterKind::Saturation,
            vec![FilterParameter::slider(
                "saturation",
                "Saturation",
                -100.0,
                100.0,
                0.0,
            )],
        ),
        FilterPreset::new(
            "grayscale",
            "Grayscale",
            Color,
            FilterKind::Saturation,
            vec![FilterParameter::slider(
                "saturation",
                "Saturation",
                -100.0,
                100.0,
                -100.0,
            )],
        ),
        FilterPreset::new(
            "blur",
            "Blur",
            Artistic,
            FilterKind::BoxBlur,
            vec![FilterParameter::slider("radius", "Radius", 0.0, 20.0, 2.0)],
        ),
        FilterPreset::new(
            "vintage",
            "Vintage",
            Vintage,
            FilterKind::Vintage,
            vec![
                FilterParameter::slider("intensity", "Intensity", 0.0, 100.0, 60.0),
                FilterParameter::slider("warmth", "Warmth", -100.0, 100.0, 30.0),
            ],
        ),
        FilterPreset::new(
            "sepia",
            "Sepia",
            Vintage,
            FilterKind::Vintage,
            vec![
                FilterParameter::slider("intensity", "Intensity", 0.0, 100.0, 100.0),
                FilterParameter::slider("warmth", "Warmth", -100.0, 100.0, 0.0),
            ],
        ),
    ]
});

/// The full preset catalog, in display order.
pub fn catalog() -> &'static [FilterPreset] {
    &CATALOG
}

/// All presets, or only those in `category`.
pub fn presets(category: Option<FilterCategory>) -> Vec<&'static FilterPreset> {
    catalog()
        .iter()
        .filter(|p| category.is_none_or(|c| p.category == c))
        .collect()
}

pub fn preset(id: &str) -> Option<&'static FilterPreset> {
    catalog().iter().find(|p| p.id == id)
}

/// Runtime state of one applied filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    /// Preset id.
    pub id: String,
    /// Blend strength against the unfiltered image, 0–100.
    pub intensity: f32,
    pub parameters: BTreeMap<String, ParameterValue>,
    pub enabled: bool,
}

impl FilterState {
    pub fn set_parameter(&mut self, name: &str, value: impl Into<ParameterValue>) {
        self.parameters.insert(name.to_string(), value.into());
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 100.0);
    }

    /// Numeric parameter value, if present and numeric.
    pub fn number(&self, name: &str) -> Option<f32> {
        self.parameters.get(name).and_then(ParameterValue::as_number)
    }
}

/// Instantiate a preset with its default parameter values, full intensity, enabled.
pub fn create_filter_state(preset_id: &str) -> Result<FilterState, PresetError> {
    let preset = preset(preset_id).ok_or_else(|| PresetError::NotFound(preset_id.to_string()))?;
    Ok(FilterState {
        id: preset.id.clone(),
        intensity: 100.0,
        parameters: preset
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect(),
        enabled: true,
    })
}

/// Run the algorithm selected by `kind` with parameters from `state`.
///
/// Missing keys fall back to the algorithm's neutral default.
fn run_filter(kind: FilterKind, buf: &PixelBuffer, state: &FilterState) -> PixelBuffer {
    let param = |name: &str, default: f32| state.number(name).unwrap_or(default);
    match kind {
        FilterKind::Brightness => pixels::brightness(buf, param("brightness", 0.0)),
        FilterKind::Contrast => pixels::contrast(buf, param("contrast", 0.0)),
        FilterKind::Saturation => pixels::saturation(buf, param("saturation", 0.0)),
        FilterKind::Vintage => {
            pixels::vintage(buf, param("intensity", 50.0), param("warmth", 0.0))
        }
        FilterKind::BoxBlur => pixels::box_blur(buf, param("radius", 1.0)),
    }
}

/// Apply a filter state to a buffer.
///
/// A disabled state, or one whose id is not in the catalog, passes the input
/// through unchanged. Below full intensity the filtered frame is blended back
/// toward the original; at intensity 0 the original comes back exactly.
pub fn apply_filter(buf: &PixelBuffer, state: &FilterState) -> PixelBuffer {
    let Some(preset) = preset(&state.id) else {
        return buf.clone();
    };
    if !state.enabled {
        return buf.clone();
    }

    let intensity = state.intensity.clamp(0.0, 100.0);
    if intensity <= 0.0 {
        return buf.clone();
    }

    let filtered = run_filter(preset.kind, buf, state);
    if intensity >= 100.0 {
        return filtered;
    }

    let blended = pixels::blend(buf, &filtered, intensity / 100.0);
    blended.unwrap_or(filtered)
}
