//! Layer store: the canonical ordered collection of layers plus selection
//! and clipboard state.
//!
//! Layers are held in paint order; a layer's `z_index` always equals its
//! position, so the ranks form a dense `0..N-1` permutation. Mutation goes
//! through copy-on-write [`Arc`]s: history snapshots share unchanged layers
//! with the live store, and a shared layer is cloned the moment an edit
//! touches it.

use crate::layer::{
    Color, DrawingLayer, DrawingLine, ImageLayer, ImageRef, Layer, LayerId, LayerKind, LayerPatch,
    MARKER_SIZE, MAX_IMAGE_DIMENSION, MarkerLayer, MaskLayer, MaskStroke, PenLayer, PenPath,
    ShapeLayer, TextLayer, VideoLayer, fit_within,
};
use kurbo::{Point, Rect};
use log::{debug, warn};
use std::sync::Arc;

/// Position offset applied to duplicated and pasted layers.
pub const DUPLICATE_OFFSET: f64 = 10.0;

/// Canonical layer collection with selection, single-slot clipboard and
/// the active-pen reference.
#[derive(Debug, Default)]
pub struct LayerStore {
    /// Paint-ordered layers; index equals `z_index`.
    layers: Vec<Arc<Layer>>,
    selection: Option<LayerId>,
    /// Internal single-slot clipboard, distinct from the OS clipboard.
    clipboard: Option<Layer>,
    /// The single pen layer currently receiving new anchors, if any.
    active_pen: Option<LayerId>,
    /// Next marker label; monotonic within a session.
    next_marker_label: u32,
}

impl LayerStore {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            selection: None,
            clipboard: None,
            active_pen: None,
            next_marker_label: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// All layers in paint order (back to front).
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().map(|l| l.as_ref())
    }

    /// Visible layers in paint order, the renderer's frame input.
    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers().filter(|l| l.visible)
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id).map(|l| l.as_ref())
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .map(Arc::make_mut)
    }

    /// Re-rank every layer to match its position. Only layers whose rank
    /// actually changed are cloned out of shared snapshots.
    fn renumber(&mut self) {
        for i in 0..self.layers.len() {
            if self.layers[i].z_index != i {
                Arc::make_mut(&mut self.layers[i]).z_index = i;
            }
        }
    }

    // ---- factories ------------------------------------------------------

    /// Insert a prepared layer at the top of the paint order.
    pub fn insert(&mut self, mut layer: Layer) -> LayerId {
        layer.z_index = self.layers.len();
        if let LayerKind::Marker(m) = &layer.kind {
            self.next_marker_label = self.next_marker_label.max(m.label + 1);
        }
        let id = layer.id;
        debug!("insert {} layer {}", layer.kind.tag(), id);
        self.layers.push(Arc::new(layer));
        id
    }

    /// Add an image layer at the origin, scaled down so its larger
    /// dimension does not exceed [`MAX_IMAGE_DIMENSION`].
    pub fn add_image(&mut self, src: ImageRef, natural_width: f64, natural_height: f64) -> LayerId {
        self.add_image_fitted(src, natural_width, natural_height, MAX_IMAGE_DIMENSION)
    }

    pub fn add_image_fitted(
        &mut self,
        src: ImageRef,
        natural_width: f64,
        natural_height: f64,
        max_dimension: f64,
    ) -> LayerId {
        let (width, height) = fit_within(natural_width, natural_height, max_dimension);
        let mut layer = Layer::new(LayerKind::Image(ImageLayer::new(src)));
        layer.width = width;
        layer.height = height;
        self.insert(layer)
    }

    pub fn add_text(&mut self, content: impl Into<String>) -> LayerId {
        let text = TextLayer::new(content);
        let mut layer = Layer::new(LayerKind::Text(text));
        layer.width = 240.0;
        layer.height = 40.0;
        self.insert(layer)
    }

    /// Add an empty drawing layer; its bounds grow with its strokes.
    pub fn add_drawing(&mut self) -> LayerId {
        self.insert(Layer::new(LayerKind::Drawing(DrawingLayer::default())))
    }

    /// Add a shape layer covering `rect`.
    pub fn add_shape(&mut self, rect: Rect, shape: ShapeLayer) -> LayerId {
        let mut layer = Layer::new(LayerKind::Shape(shape));
        layer.x = rect.x0;
        layer.y = rect.y0;
        layer.width = rect.width();
        layer.height = rect.height();
        self.insert(layer)
    }

    /// Add a marker badge centered on `at`, with the next sequential label.
    pub fn add_marker(&mut self, at: Point, color: Color) -> LayerId {
        let label = self.next_marker_label;
        let mut layer = Layer::new(LayerKind::Marker(MarkerLayer::new(label, color)));
        layer.x = at.x - MARKER_SIZE / 2.0;
        layer.y = at.y - MARKER_SIZE / 2.0;
        layer.width = MARKER_SIZE;
        layer.height = MARKER_SIZE;
        self.insert(layer)
    }

    pub fn add_pen(&mut self) -> LayerId {
        self.insert(Layer::new(LayerKind::Pen(PenLayer::default())))
    }

    pub fn add_mask(&mut self, target: Option<LayerId>) -> LayerId {
        let mask = MaskLayer {
            target,
            ..MaskLayer::default()
        };
        self.insert(Layer::new(LayerKind::Mask(mask)))
    }

    pub fn add_video(&mut self, src: ImageRef) -> LayerId {
        let mut layer = Layer::new(LayerKind::Video(VideoLayer::new(src)));
        layer.width = 320.0;
        layer.height = 180.0;
        self.insert(layer)
    }

    // ---- mutation -------------------------------------------------------

    /// Apply a partial patch to a layer. Unknown ids and variant-mismatched
    /// payloads are no-ops.
    pub fn update(&mut self, id: LayerId, patch: &LayerPatch) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                if layer.apply_patch(patch) {
                    true
                } else {
                    warn!("patch with mismatched variant rejected for layer {id}");
                    false
                }
            }
            None => {
                warn!("update on unknown layer {id} ignored");
                false
            }
        }
    }

    /// Append a finished stroke to a drawing layer. Unknown ids and other
    /// layer kinds are no-ops.
    pub fn append_drawing_line(&mut self, id: LayerId, line: DrawingLine) -> bool {
        match self.get_mut(id) {
            Some(Layer {
                kind: LayerKind::Drawing(drawing),
                ..
            }) => {
                drawing.push_line(line);
                true
            }
            Some(_) => {
                warn!("stroke append rejected: layer {id} is not a drawing layer");
                false
            }
            None => {
                warn!("stroke append for unknown layer {id} ignored");
                false
            }
        }
    }

    /// Append a paint stroke to a mask layer.
    pub fn append_mask_stroke(&mut self, id: LayerId, stroke: MaskStroke) -> bool {
        match self.get_mut(id) {
            Some(Layer {
                kind: LayerKind::Mask(mask),
                ..
            }) => {
                mask.push_stroke(stroke);
                true
            }
            Some(_) => {
                warn!("mask stroke rejected: layer {id} is not a mask layer");
                false
            }
            None => {
                warn!("mask stroke for unknown layer {id} ignored");
                false
            }
        }
    }

    /// Append a completed path to a pen layer.
    pub fn append_pen_path(&mut self, id: LayerId, path: PenPath) -> bool {
        match self.get_mut(id) {
            Some(Layer {
                kind: LayerKind::Pen(pen),
                ..
            }) => {
                pen.push_path(path);
                true
            }
            Some(_) => {
                warn!("pen path rejected: layer {id} is not a pen layer");
                false
            }
            None => {
                warn!("pen path for unknown layer {id} ignored");
                false
            }
        }
    }

    /// Remove a layer. Idempotent: unknown ids are a no-op. Clears the
    /// selection and the active-pen reference when they pointed here.
    pub fn remove(&mut self, id: LayerId) -> Option<Layer> {
        let index = self.index_of(id)?;
        let removed = self.layers.remove(index);
        self.renumber();
        if self.selection == Some(id) {
            self.selection = None;
        }
        if self.active_pen == Some(id) {
            self.active_pen = None;
        }
        debug!("removed layer {id}");
        Some(Arc::try_unwrap(removed).unwrap_or_else(|shared| (*shared).clone()))
    }

    /// Move the layer at `from` to position `to`, re-ranking every layer.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.layers.len() || to >= self.layers.len() {
            warn!(
                "reorder ({from} -> {to}) out of bounds for {} layers",
                self.layers.len()
            );
            return;
        }
        if from == to {
            return;
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        self.renumber();
    }

    pub fn bring_to_front(&mut self, id: LayerId) {
        if let Some(index) = self.index_of(id) {
            let top = self.layers.len() - 1;
            self.reorder(index, top);
        }
    }

    pub fn send_to_back(&mut self, id: LayerId) {
        if let Some(index) = self.index_of(id) {
            self.reorder(index, 0);
        }
    }

    /// Clone a layer with a fresh id, offset position and top rank. The
    /// duplicate becomes the selection.
    pub fn duplicate(&mut self, id: LayerId) -> Option<LayerId> {
        let mut copy = self.get(id)?.clone();
        copy.regenerate_id();
        copy.translate(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        let new_id = self.insert(copy);
        self.selection = Some(new_id);
        Some(new_id)
    }

    /// Remove every layer in one step. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.layers.len();
        self.layers.clear();
        self.selection = None;
        self.active_pen = None;
        count
    }

    // ---- selection ------------------------------------------------------

    pub fn selection(&self) -> Option<LayerId> {
        self.selection
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selection.and_then(|id| self.get(id))
    }

    /// Set or clear the selection. Selecting an unknown id is a no-op.
    pub fn set_selection(&mut self, id: Option<LayerId>) -> bool {
        match id {
            None => {
                self.selection = None;
                true
            }
            Some(id) if self.get(id).is_some() => {
                self.selection = Some(id);
                true
            }
            Some(id) => {
                warn!("selection of unknown layer {id} ignored");
                false
            }
        }
    }

    /// Single-slot selection model: selects the topmost visible layer.
    pub fn select_all(&mut self) {
        let top = self
            .layers
            .iter()
            .rev()
            .find(|l| l.visible)
            .map(|l| l.id);
        self.selection = top;
    }

    // ---- clipboard ------------------------------------------------------

    /// Copy the selected layer into the clipboard slot.
    pub fn copy(&mut self) -> bool {
        match self.selected_layer() {
            Some(layer) => {
                self.clipboard = Some(layer.clone());
                true
            }
            None => false,
        }
    }

    /// Copy the selected layer and remove it from the store.
    pub fn cut(&mut self) -> bool {
        let Some(id) = self.selection else {
            return false;
        };
        if !self.copy() {
            return false;
        }
        self.remove(id);
        true
    }

    /// Paste the clipboard layer as a new top layer and select it.
    /// Repeated pastes cascade by the duplicate offset.
    pub fn paste(&mut self) -> Option<LayerId> {
        let slot = self.clipboard.as_mut()?;
        slot.translate(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        let mut copy = slot.clone();
        copy.regenerate_id();
        let id = self.insert(copy);
        self.selection = Some(id);
        Some(id)
    }

    pub fn has_clipboard(&self) -> bool {
        self.clipboard.is_some()
    }

    // ---- active pen -----------------------------------------------------

    pub fn active_pen(&self) -> Option<LayerId> {
        self.active_pen
    }

    /// Point the active-pen reference at a pen layer, or clear it.
    /// Non-pen and unknown ids are rejected.
    pub fn set_active_pen(&mut self, id: Option<LayerId>) -> bool {
        match id {
            None => {
                self.active_pen = None;
                true
            }
            Some(id) => match self.get(id) {
                Some(layer) if matches!(layer.kind, LayerKind::Pen(_)) => {
                    self.active_pen = Some(id);
                    true
                }
                _ => {
                    warn!("active pen must reference an existing pen layer, got {id}");
                    false
                }
            },
        }
    }

    // ---- geometry queries -----------------------------------------------

    /// Topmost visible layer containing the point, if any.
    pub fn layer_at_point(&self, point: Point) -> Option<LayerId> {
        self.layers
            .iter()
            .rev()
            .find(|l| l.visible && l.contains(point))
            .map(|l| l.id)
    }

    /// Topmost visible layer whose bounds overlap `rect`.
    pub fn top_layer_intersecting(&self, rect: Rect) -> Option<LayerId> {
        self.layers
            .iter()
            .rev()
            .find(|l| l.visible && rect.intersect(l.bounds()).area() > 0.0)
            .map(|l| l.id)
    }

    /// Grow a content-bearing layer's base transform to hug its stroke or
    /// anchor geometry.
    pub fn fit_bounds_to_content(&mut self, id: LayerId) {
        let Some(bounds) = self.get(id).and_then(|l| l.content_bounds()) else {
            return;
        };
        if let Some(layer) = self.get_mut(id) {
            layer.x = bounds.x0;
            layer.y = bounds.y0;
            layer.width = bounds.width();
            layer.height = bounds.height();
        }
    }

    // ---- snapshots ------------------------------------------------------

    /// Cheap structural snapshot for history: clones the `Arc` spine only.
    pub fn snapshot_layers(&self) -> Vec<Arc<Layer>> {
        self.layers.clone()
    }

    /// Replace the live layers wholesale from a history snapshot. Selection
    /// and active-pen references that no longer resolve are cleared.
    pub fn restore(&mut self, layers: Vec<Arc<Layer>>) {
        self.layers = layers;
        if let Some(id) = self.selection {
            if self.get(id).is_none() {
                debug!("selection {id} not present after restore, clearing");
                self.selection = None;
            }
        }
        if let Some(id) = self.active_pen {
            let still_pen = self
                .get(id)
                .map(|l| matches!(l.kind, LayerKind::Pen(_)))
                .unwrap_or(false);
            if !still_pen {
                debug!("active pen {id} not present after restore, clearing");
                self.active_pen = None;
            }
        }
        for layer in &self.layers {
            if let LayerKind::Marker(m) = &layer.kind {
                self.next_marker_label = self.next_marker_label.max(m.label + 1);
            }
        }
    }

    /// Replace the store contents from imported layer records. Ranks are
    /// normalized to a dense permutation in the imported order.
    pub fn load_layers(&mut self, mut layers: Vec<Layer>) {
        layers.sort_by_key(|l| l.z_index);
        self.layers = layers.into_iter().map(Arc::new).collect();
        self.renumber();
        self.selection = None;
        self.active_pen = None;
        self.clipboard = None;
        self.next_marker_label = 1;
        for layer in &self.layers {
            if let LayerKind::Marker(m) = &layer.kind {
                self.next_marker_label = self.next_marker_label.max(m.label + 1);
            }
        }
    }
}
