//! Viewport state and the editor session container.
//!
//! [`CanvasState`] is the serializable viewport record (size, pan/zoom,
//! background). [`Editor`] is the explicit state container a host
//! application owns: the layer store, the history stack, the viewport and
//! tool settings, passed by reference to everything that needs it. There is
//! no ambient global; independent editors coexist freely.

use crate::history::HistoryManager;
use crate::layer::{Color, LayerId};
use crate::store::LayerStore;
use kurbo::{Affine, Point, Rect, Vec2};
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;

pub const DEFAULT_CANVAS_WIDTH: f64 = 1280.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 720.0;

/// Canvas background paint. `Transparent` is the sentinel the renderer
/// shows as a checkerboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasBackground {
    Transparent,
    Solid(Color),
}

impl Default for CanvasBackground {
    fn default() -> Self {
        CanvasBackground::Solid(Color::WHITE)
    }
}

/// Viewport state: canvas size, pan/zoom and background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    #[serde(default)]
    pub background_color: CanvasBackground,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

impl CanvasState {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            background_color: CanvasBackground::default(),
        }
    }

    /// The canvas area in canvas-local coordinates.
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Canvas-to-screen transform: scale by zoom, then translate by pan.
    pub fn transform(&self) -> Affine {
        Affine::translate(Vec2::new(self.pan_x, self.pan_y)) * Affine::scale(self.zoom)
    }

    /// Convert a screen point into canvas-local coordinates.
    pub fn to_canvas(&self, screen: Point) -> Point {
        self.transform().inverse() * screen
    }

    /// Convert a canvas-local point into screen coordinates.
    pub fn to_screen(&self, canvas: Point) -> Point {
        self.transform() * canvas
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Zoom by `factor` keeping the canvas point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let anchor = self.to_canvas(screen);
        self.set_zoom(self.zoom * factor);
        self.pan_x = screen.x - anchor.x * self.zoom;
        self.pan_y = screen.y - anchor.y * self.zoom;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan_x += delta.x;
        self.pan_y += delta.y;
    }
}

/// Brush and paint settings shared by the drawing tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    /// Brush diameter; the pencil stroke width is three times this.
    pub brush_size: f64,
    pub stroke_color: Color,
    pub fill_color: Color,
    pub stroke_width: f64,
    pub marker_color: Color,
    /// Ramer-Douglas-Peucker tolerance for pencil strokes; `0.0` disables
    /// simplification.
    pub simplify_tolerance: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            brush_size: 4.0,
            stroke_color: Color::BLACK,
            fill_color: Color::rgba(255, 255, 255, 0),
            stroke_width: 2.0,
            marker_color: Color::rgb(255, 59, 48),
            simplify_tolerance: 0.0,
        }
    }
}

/// One editor session: layers, history, viewport and settings.
#[derive(Debug)]
pub struct Editor {
    pub store: LayerStore,
    pub history: HistoryManager,
    pub canvas: CanvasState,
    pub settings: ToolSettings,
    /// Document display name, carried into the export snapshot.
    pub name: String,
    /// Queued user-facing notices (validation refusals, service failures).
    messages: Vec<String>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Fresh session with the default canvas and a baseline history entry.
    pub fn new() -> Self {
        Self::with_canvas(CanvasState::default())
    }

    pub fn with_canvas(canvas: CanvasState) -> Self {
        let mut editor = Self {
            store: LayerStore::new(),
            history: HistoryManager::new(),
            canvas,
            settings: ToolSettings::default(),
            name: "Untitled".to_string(),
            messages: Vec::new(),
        };
        editor.commit("new canvas");
        editor
    }

    /// Commit the current state to history under an action label.
    pub fn commit(&mut self, label: impl Into<String>) {
        let layers = self.store.snapshot_layers();
        self.history.commit(label, layers, self.canvas.clone());
    }

    /// Step history back one entry. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        let snapshot = self
            .history
            .undo()
            .map(|s| (s.layers.clone(), s.canvas.clone()));
        match snapshot {
            Some((layers, canvas)) => {
                self.store.restore(layers);
                self.canvas = canvas;
                true
            }
            None => {
                debug!("undo at history boundary");
                false
            }
        }
    }

    /// Step history forward one entry. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        let snapshot = self
            .history
            .redo()
            .map(|s| (s.layers.clone(), s.canvas.clone()));
        match snapshot {
            Some((layers, canvas)) => {
                self.store.restore(layers);
                self.canvas = canvas;
                true
            }
            None => {
                debug!("redo at history boundary");
                false
            }
        }
    }

    /// Move the layer at `from` to position `to` as one committed action.
    /// Out-of-range indices and `from == to` are no-ops without a commit.
    pub fn reorder_layer(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.store.len() || to >= self.store.len() {
            return false;
        }
        self.store.reorder(from, to);
        self.commit("reorder layer");
        true
    }

    /// Raise a layer to the top of the paint order, committing once.
    /// Unknown ids and layers already on top are no-ops.
    pub fn bring_layer_to_front(&mut self, id: LayerId) -> bool {
        match self.store.index_of(id) {
            Some(index) if index + 1 < self.store.len() => {
                self.store.bring_to_front(id);
                self.commit("reorder layer");
                true
            }
            _ => false,
        }
    }

    /// Drop a layer to the bottom of the paint order, committing once.
    /// Unknown ids and layers already at the back are no-ops.
    pub fn send_layer_to_back(&mut self, id: LayerId) -> bool {
        match self.store.index_of(id) {
            Some(index) if index > 0 => {
                self.store.send_to_back(id);
                self.commit("reorder layer");
                true
            }
            _ => false,
        }
    }

    /// Remove every layer as one committed action. No-op on an empty store.
    pub fn clear_canvas(&mut self) -> bool {
        if self.store.is_empty() {
            return false;
        }
        let removed = self.store.clear();
        info!("cleared canvas ({removed} layers)");
        self.commit("clear canvas");
        true
    }

    /// Transform-handle bounding box of the selection, for the renderer.
    pub fn selection_handle_box(&self) -> Option<Rect> {
        self.store.selected_layer().map(crate::selection::handle_box)
    }

    /// Queue a user-facing notice.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Drain queued notices for the chrome to display.
    pub fn drain_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    #[cfg(test)]
    pub(crate) fn layers_deep(&self) -> Vec<crate::layer::Layer> {
        self.store.layers().cloned().collect()
    }
}
