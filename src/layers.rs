//! Structural operations over editor layer stacks.
//!
//! A layer stack is a plain `Vec<EditorLayer>` owned by the caller. Every
//! operation takes the stack (or a layer) by reference and returns a new
//! value. None of them fail: unmatched ids and out-of-range indices resolve
//! to no-ops or clamped positions.
//!
//! Elements are held behind [`Arc`], so merging and duplicating share the
//! drawable payloads instead of deep-cloning them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Line,
    Arrow,
}

/// A drawable item on a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Stroke {
        points: Vec<Point>,
        color: String,
        width: f32,
    },
    Shape {
        shape: ShapeKind,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: String,
        #[serde(default)]
        filled: bool,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        font_size: f32,
        color: String,
    },
    Sticker {
        asset: String,
        x: f32,
        y: f32,
        #[serde(default = "unit_scale")]
        scale: f32,
        #[serde(default)]
        rotation: f32,
    },
}

fn unit_scale() -> f32 {
    1.0
}

fn full_opacity() -> f32 {
    1.0
}

fn visible_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorLayer {
    pub id: String,
    pub name: String,
    #[serde(default = "visible_default")]
    pub visible: bool,
    #[serde(default = "full_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub locked: bool,
    /// Position in the stack, rewritten by [`reorder_layers`] and [`merge_layers`].
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub elements: Vec<Arc<Element>>,
}

impl EditorLayer {
    /// Empty, visible, unlocked layer with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_layer_id(),
            name: name.into(),
            visible: true,
            opacity: 1.0,
            locked: false,
            index: 0,
            elements: Vec::new(),
        }
    }

    pub fn with_elements(mut self, elements: impl IntoIterator<Item = Element>) -> Self {
        self.elements = elements.into_iter().map(Arc::new).collect();
        self
    }
}

fn new_layer_id() -> String {
    Uuid::new_v4().to_string()
}

fn reindex(layers: &mut [EditorLayer]) {
    for (i, layer) in layers.iter_mut().enumerate() {
        layer.index = i;
    }
}

/// Merge every layer whose id is in `target_ids` into one new layer.
///
/// Elements are concatenated in stack order (not `target_ids` order) and the
/// merged layer is appended after the unmatched layers. With no match the
/// input is returned unchanged.
pub fn merge_layers<S: AsRef<str>>(layers: &[EditorLayer], target_ids: &[S]) -> Vec<EditorLayer> {
    let targets: HashSet<&str> = target_ids.iter().map(AsRef::as_ref).collect();
    let (matched, rest): (Vec<&EditorLayer>, Vec<&EditorLayer>) = layers
        .iter()
        .partition(|layer| targets.contains(layer.id.as_str()));

    if matched.is_empty() {
        return layers.to_vec();
    }

    let merged = EditorLayer {
        id: new_layer_id(),
        name: matched
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(" + "),
        visible: true,
        opacity: 1.0,
        locked: false,
        index: 0,
        elements: matched
            .iter()
            .flat_map(|l| l.elements.iter().cloned())
            .collect(),
    };

    let mut out: Vec<EditorLayer> = rest.into_iter().cloned().collect();
    out.push(merged);
    reindex(&mut out);
    out
}

/// Copy of `layer` with a new id and `" Copy"` appended to the name.
pub fn duplicate_layer(layer: &EditorLayer) -> EditorLayer {
    EditorLayer {
        id: new_layer_id(),
        name: format!("{} Copy", layer.name),
        ..layer.clone()
    }
}

/// Move the layer at `from` to position `to`, then reindex.
///
/// `from` out of range leaves the order alone; `to` is clamped to the last slot.
pub fn reorder_layers(layers: &[EditorLayer], from: usize, to: usize) -> Vec<EditorLayer> {
    let mut out = layers.to_vec();
    if from < out.len() {
        let moved = out.remove(from);
        let to = to.min(out.len());
        out.insert(to, moved);
    }
    reindex(&mut out);
    out
}
