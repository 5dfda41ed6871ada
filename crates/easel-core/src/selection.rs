//! Selection transform commits.
//!
//! The rendering collaborator owns the transform handles while a drag is
//! live; on release it reports the accumulated scale and the new position
//! and rotation here. The commit writes absolute width/height into the
//! layer (scale is never persisted as a separate component) and records a
//! single history entry.

use crate::canvas::Editor;
use crate::layer::{Layer, LayerId, LayerPatch};
use kurbo::Rect;
use log::{debug, warn};

/// Smallest width/height a transform commit may produce.
pub const MIN_LAYER_SIZE: f64 = 5.0;

/// Result of a bounding-box handle drag, reported by the renderer on
/// release. Scales are multipliers against the layer's current size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformUpdate {
    pub x: f64,
    pub y: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for TransformUpdate {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Transform-handle bounding box for the renderer.
pub fn handle_box(layer: &Layer) -> Rect {
    layer.bounds()
}

/// Commit a finished handle drag into the store.
///
/// Writes `width = max(5, width * scale_x)` and the matching height, plus
/// the new position and rotation, then commits "resize/transform layer".
/// Locked layers and unknown ids are safe no-ops.
pub fn commit_transform(editor: &mut Editor, id: LayerId, update: TransformUpdate) -> bool {
    let Some(layer) = editor.store.get(id) else {
        warn!("transform commit for unknown layer {id} ignored");
        return false;
    };
    if layer.locked {
        debug!("transform commit on locked layer {id} ignored");
        return false;
    }

    let width = (layer.width * update.scale_x).max(MIN_LAYER_SIZE);
    let height = (layer.height * update.scale_y).max(MIN_LAYER_SIZE);
    let patch = LayerPatch {
        x: Some(update.x),
        y: Some(update.y),
        width: Some(width),
        height: Some(height),
        rotation: Some(update.rotation),
        ..LayerPatch::default()
    };
    editor.store.update(id, &patch);
    editor.commit("resize/transform layer");
    true
}

/// Positional nudge without a history commit. Locked layers and unknown
/// ids are safe no-ops.
pub fn nudge_layer(editor: &mut Editor, id: LayerId, dx: f64, dy: f64) -> bool {
    let Some(layer) = editor.store.get(id) else {
        warn!("nudge for unknown layer {id} ignored");
        return false;
    };
    if layer.locked {
        return false;
    }
    let patch = LayerPatch::move_to(layer.x + dx, layer.y + dy);
    editor.store.update(id, &patch)
}
