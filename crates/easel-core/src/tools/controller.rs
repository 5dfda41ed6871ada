//! Pointer and keyboard orchestration.
//!
//! [`ToolController`] owns the gesture state machine: it converts screen
//! positions to canvas coordinates, routes pointer phases through the
//! active tool, and decides which gestures end in a history commit. It
//! also carries the erase overlay and the image-service bridge, applying
//! polled completions back into the store.

use super::{EraseSession, GestureState, MARQUEE_MIN_AREA, MIN_SHAPE_SIZE, ToolKind};
use crate::ai::{AiBridge, AiCompletion, AiOpKind, AiRequest, AiService, JobKey};
use crate::canvas::Editor;
use crate::input::{Key, Modifiers, MouseButton, PointerEvent};
use crate::layer::{
    DrawingLine, ImageLayer, ImageRef, Layer, LayerId, LayerKind, LayerPatch, MAX_IMAGE_DIMENSION,
    MaskStroke, PenAnchor, PenPath, ShapeLayer, rasterize_mask_png,
};
use crate::selection;
use crate::snap::{SnapGuide, compute_snap};
use crate::store::DUPLICATE_OFFSET;
use kurbo::{Point, Rect, Vec2};
use log::{debug, warn};

/// Per-tool pointer and keyboard state machine.
pub struct ToolController {
    tool: ToolKind,
    gesture: GestureState,
    /// Anchors of the in-progress pen path, in click order.
    pen_draft: Vec<PenAnchor>,
    /// Modal erase overlay, when open.
    erase: Option<EraseSession>,
    /// Guides from the current drag step, for the renderer.
    guides: Vec<SnapGuide>,
    snap_enabled: bool,
    ai: Option<AiBridge>,
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolController {
    /// Controller without an image service; AI requests are refused with a
    /// user notice.
    pub fn new() -> Self {
        Self {
            tool: ToolKind::Select,
            gesture: GestureState::Idle,
            pen_draft: Vec::new(),
            erase: None,
            guides: Vec::new(),
            snap_enabled: true,
            ai: None,
        }
    }

    /// Controller with a worker thread wrapped around `service`.
    pub fn with_ai(service: impl AiService + 'static) -> Self {
        let mut controller = Self::new();
        controller.ai = Some(AiBridge::spawn(service));
        controller
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Switch tools, dropping any in-flight gesture, pen draft and erase
    /// overlay.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool == self.tool {
            return;
        }
        if self.tool == ToolKind::Erase {
            self.abandon_erase();
        }
        self.gesture = GestureState::Idle;
        self.pen_draft.clear();
        self.guides.clear();
        debug!("tool changed to {:?}", tool);
        self.tool = tool;
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    /// Alignment guides for the renderer, non-empty only mid-drag.
    pub fn guides(&self) -> &[SnapGuide] {
        &self.guides
    }

    pub fn pen_draft(&self) -> &[PenAnchor] {
        &self.pen_draft
    }

    pub fn erase_session(&self) -> Option<&EraseSession> {
        self.erase.as_ref()
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap_enabled
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
        if !enabled {
            self.guides.clear();
        }
    }

    /// True while any image-service request is pending.
    pub fn is_loading(&self) -> bool {
        self.ai.as_ref().map(|b| b.is_loading()).unwrap_or(false)
    }

    // ---- pointer routing ------------------------------------------------

    /// Route a pointer event through the active tool.
    pub fn handle_pointer(&mut self, editor: &mut Editor, event: &PointerEvent) {
        match *event {
            PointerEvent::Down { position, button } => {
                self.on_pointer_down(editor, position, button);
            }
            PointerEvent::Move { position } => self.on_pointer_move(editor, position),
            PointerEvent::Up { position, button } => {
                self.on_pointer_up(editor, position, button);
            }
        }
    }

    fn on_pointer_down(&mut self, editor: &mut Editor, screen: Point, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        let point = editor.canvas.to_canvas(screen);
        match self.tool {
            ToolKind::Select => match editor.store.layer_at_point(point) {
                Some(id) => {
                    editor.store.set_selection(Some(id));
                    match editor.store.get(id) {
                        Some(layer) if !layer.locked => {
                            let grab = point - Point::new(layer.x, layer.y);
                            self.gesture = GestureState::DragLayer { id, grab };
                        }
                        _ => debug!("layer {id} is locked; press selects without dragging"),
                    }
                }
                None => {
                    self.gesture = GestureState::Marquee {
                        start: point,
                        current: point,
                    };
                }
            },
            ToolKind::Move => self.gesture = GestureState::Panning,
            ToolKind::Shape(_) => {
                self.gesture = GestureState::ShapeDraft {
                    start: point,
                    current: point,
                };
            }
            ToolKind::Marker => {
                let id = editor.store.add_marker(point, editor.settings.marker_color);
                editor.store.set_selection(Some(id));
                editor.commit("add marker");
            }
            ToolKind::Pencil | ToolKind::Brush | ToolKind::Mask => {
                self.gesture = GestureState::Stroke {
                    points: vec![point],
                };
            }
            ToolKind::Pen => self.pen_click(editor, point),
            ToolKind::Erase => {
                if self.erase.is_some() {
                    self.gesture = GestureState::Stroke {
                        points: vec![point],
                    };
                }
            }
        }
    }

    fn on_pointer_move(&mut self, editor: &mut Editor, screen: Point) {
        let point = editor.canvas.to_canvas(screen);
        let drag = match &mut self.gesture {
            GestureState::Idle | GestureState::Panning => None,
            GestureState::Marquee { current, .. } | GestureState::ShapeDraft { current, .. } => {
                *current = point;
                None
            }
            GestureState::Stroke { points } => {
                points.push(point);
                None
            }
            GestureState::DragLayer { id, grab } => Some((*id, point - *grab)),
        };
        if let Some((id, origin)) = drag {
            self.drag_layer_to(editor, id, origin);
        }
    }

    fn on_pointer_up(&mut self, editor: &mut Editor, screen: Point, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        let point = editor.canvas.to_canvas(screen);
        let gesture = std::mem::replace(&mut self.gesture, GestureState::Idle);
        self.guides.clear();
        match gesture {
            GestureState::Idle | GestureState::Panning => {}
            // Positional drags never commit history.
            GestureState::DragLayer { .. } => {}
            GestureState::Marquee { start, .. } => {
                let marquee = Rect::from_points(start, point);
                let hit = if marquee.area() > MARQUEE_MIN_AREA {
                    editor.store.top_layer_intersecting(marquee)
                } else {
                    None
                };
                editor.store.set_selection(hit);
            }
            GestureState::ShapeDraft { start, .. } => {
                self.finish_shape(editor, Rect::from_points(start, point));
            }
            GestureState::Stroke { points } => self.finish_stroke(editor, points),
        }
    }

    // ---- select and move ------------------------------------------------

    /// Reposition a dragged layer, snapping against the canvas frame and
    /// the other visible layers.
    fn drag_layer_to(&mut self, editor: &mut Editor, id: LayerId, origin: Point) {
        let Some(layer) = editor.store.get(id) else {
            warn!("dragged layer {id} vanished; ending gesture");
            self.gesture = GestureState::Idle;
            self.guides.clear();
            return;
        };
        let moving = Rect::new(
            origin.x,
            origin.y,
            origin.x + layer.width,
            origin.y + layer.height,
        );
        let (x, y) = if self.snap_enabled {
            let others: Vec<Rect> = editor
                .store
                .visible_layers()
                .filter(|l| l.id != id)
                .map(|l| l.bounds())
                .collect();
            let outcome = compute_snap(moving, &others, editor.canvas.width, editor.canvas.height);
            self.guides = outcome.guides;
            (outcome.x, outcome.y)
        } else {
            (origin.x, origin.y)
        };
        editor.store.update(id, &LayerPatch::move_to(x, y));
    }

    // ---- shape ----------------------------------------------------------

    fn finish_shape(&mut self, editor: &mut Editor, rect: Rect) {
        if rect.width() < MIN_SHAPE_SIZE || rect.height() < MIN_SHAPE_SIZE {
            debug!(
                "shape draft {:.0}x{:.0} under the minimum size, discarded",
                rect.width(),
                rect.height()
            );
            return;
        }
        let ToolKind::Shape(shape_type) = self.tool else {
            return;
        };
        let shape = ShapeLayer {
            shape_type,
            fill: editor.settings.fill_color,
            stroke_color: editor.settings.stroke_color,
            stroke_width: editor.settings.stroke_width,
        };
        let id = editor.store.add_shape(rect, shape);
        editor.store.set_selection(Some(id));
        editor.commit("add shape");
    }

    // ---- pencil, brush, mask, erase strokes -----------------------------

    fn finish_stroke(&mut self, editor: &mut Editor, points: Vec<Point>) {
        if self.tool == ToolKind::Erase {
            self.push_erase_stroke(editor, points);
            return;
        }
        if points.len() < 2 {
            debug!("stroke with under two points, discarded");
            return;
        }
        let brush = editor.settings.brush_size;
        match self.tool {
            ToolKind::Pencil => self.commit_drawing_line(editor, points, brush * 3.0),
            ToolKind::Brush => self.commit_drawing_line(editor, points, brush),
            ToolKind::Mask => self.commit_mask_stroke(editor, points, brush),
            _ => {}
        }
    }

    /// Append the polyline to the selected drawing layer, or a fresh one.
    fn commit_drawing_line(&mut self, editor: &mut Editor, points: Vec<Point>, width: f64) {
        let mut line = DrawingLine::new(points, editor.settings.stroke_color, width);
        if editor.settings.simplify_tolerance > 0.0 {
            line.simplify(editor.settings.simplify_tolerance);
        }
        let existing = editor
            .store
            .selected_layer()
            .filter(|l| matches!(l.kind, LayerKind::Drawing(_)) && !l.locked && l.visible)
            .map(|l| l.id);
        let id = match existing {
            Some(id) => id,
            None => {
                let id = editor.store.add_drawing();
                editor.store.set_selection(Some(id));
                id
            }
        };
        if editor.store.append_drawing_line(id, line) {
            editor.store.fit_bounds_to_content(id);
            editor.commit("draw stroke");
        }
    }

    /// Paint the polyline into the selected mask layer, or a fresh one
    /// covering the selected image layer.
    fn commit_mask_stroke(&mut self, editor: &mut Editor, points: Vec<Point>, width: f64) {
        let stroke = MaskStroke::new(points, width);
        let existing = editor
            .store
            .selected_layer()
            .filter(|l| matches!(l.kind, LayerKind::Mask(_)) && !l.locked && l.visible)
            .map(|l| l.id);
        let id = match existing {
            Some(id) => id,
            None => {
                let target = editor
                    .store
                    .selected_layer()
                    .filter(|l| matches!(l.kind, LayerKind::Image(_)))
                    .map(|l| l.id);
                let id = editor.store.add_mask(target);
                editor.store.set_selection(Some(id));
                id
            }
        };
        if editor.store.append_mask_stroke(id, stroke) {
            editor.store.fit_bounds_to_content(id);
            editor.commit("paint mask");
        }
    }

    // ---- pen ------------------------------------------------------------

    fn pen_click(&mut self, editor: &mut Editor, point: Point) {
        if editor.store.active_pen().is_none() {
            let id = editor.store.add_pen();
            editor.store.set_active_pen(Some(id));
            editor.store.set_selection(Some(id));
            debug!("started pen layer {id}");
        }
        self.pen_draft.push(PenAnchor::corner(point));
    }

    /// Finalize the draft onto the active pen layer and start a fresh path.
    fn complete_pen_path(&mut self, editor: &mut Editor) {
        if self.pen_draft.len() < 2 {
            editor.notify("a pen path needs at least two anchor points");
            return;
        }
        let Some(id) = editor.store.active_pen() else {
            warn!("pen draft without an active pen layer, discarding");
            self.pen_draft.clear();
            return;
        };
        let anchors = std::mem::take(&mut self.pen_draft);
        if editor.store.append_pen_path(id, PenPath::new(anchors)) {
            editor.store.fit_bounds_to_content(id);
            editor.commit("complete pen path");
        }
    }

    // ---- keyboard -------------------------------------------------------

    /// Route a key press. While the erase overlay is open only confirm and
    /// cancel are live.
    pub fn key_down(&mut self, editor: &mut Editor, key: Key, modifiers: Modifiers) {
        if self.erase.is_some() {
            match key {
                Key::Enter => self.confirm_erase(editor),
                Key::Escape => self.cancel_erase(),
                _ => {}
            }
            return;
        }
        if modifiers.command() {
            self.command_chord(editor, key, modifiers);
            return;
        }
        match key {
            Key::Enter => {
                if self.tool == ToolKind::Pen {
                    self.complete_pen_path(editor);
                }
            }
            Key::Escape => {
                if !self.pen_draft.is_empty() {
                    debug!("pen draft discarded ({} anchors)", self.pen_draft.len());
                    self.pen_draft.clear();
                } else {
                    editor.store.set_selection(None);
                }
            }
            Key::Delete | Key::Backspace => self.delete_selection(editor),
            Key::ArrowUp => Self::nudge(editor, 0.0, -1.0, modifiers),
            Key::ArrowDown => Self::nudge(editor, 0.0, 1.0, modifiers),
            Key::ArrowLeft => Self::nudge(editor, -1.0, 0.0, modifiers),
            Key::ArrowRight => Self::nudge(editor, 1.0, 0.0, modifiers),
            Key::Character(_) => {}
        }
    }

    fn command_chord(&mut self, editor: &mut Editor, key: Key, modifiers: Modifiers) {
        match key {
            Key::Character('c') => {
                editor.store.copy();
            }
            Key::Character('x') => {
                if editor.store.selected_layer().map(|l| l.locked) == Some(true) {
                    debug!("selected layer is locked; cut ignored");
                } else if editor.store.cut() {
                    editor.commit("cut layer");
                }
            }
            Key::Character('v') => {
                if editor.store.paste().is_some() {
                    editor.commit("paste layer");
                }
            }
            Key::Character('d') => {
                if let Some(id) = editor.store.selection() {
                    if editor.store.duplicate(id).is_some() {
                        editor.commit("duplicate layer");
                    }
                }
            }
            Key::Character('a') => editor.store.select_all(),
            Key::Character('z') if modifiers.shift => {
                editor.redo();
            }
            Key::Character('z') => {
                editor.undo();
            }
            Key::Character('y') => {
                editor.redo();
            }
            _ => {}
        }
    }

    fn delete_selection(&mut self, editor: &mut Editor) {
        let Some(layer) = editor.store.selected_layer() else {
            return;
        };
        if layer.locked {
            debug!("selected layer is locked; delete ignored");
            return;
        }
        let id = layer.id;
        editor.store.remove(id);
        editor.commit("delete layer");
    }

    /// Arrow-key nudge: one unit, ten with shift held. Not a history
    /// action, exactly like a pointer drag.
    fn nudge(editor: &mut Editor, dx: f64, dy: f64, modifiers: Modifiers) {
        let Some(id) = editor.store.selection() else {
            return;
        };
        let step = if modifiers.shift { 10.0 } else { 1.0 };
        selection::nudge_layer(editor, id, dx * step, dy * step);
    }

    // ---- erase overlay --------------------------------------------------

    /// Open the erase overlay on an image layer.
    pub fn begin_erase(&mut self, editor: &mut Editor, target: LayerId) -> bool {
        let Some(layer) = editor.store.get(target) else {
            warn!("erase target {target} does not exist");
            return false;
        };
        if !matches!(layer.kind, LayerKind::Image(_)) {
            editor.notify("erase works on image layers");
            return false;
        }
        if layer.locked {
            editor.notify("unlock the layer before erasing from it");
            return false;
        }
        self.abandon_erase();
        self.set_tool(ToolKind::Erase);
        self.erase = Some(EraseSession {
            target,
            strokes: Vec::new(),
            pending: None,
        });
        editor.store.set_selection(Some(target));
        debug!("erase overlay opened on layer {target}");
        true
    }

    /// Store a finished overlay stroke in target-local coordinates.
    fn push_erase_stroke(&mut self, editor: &mut Editor, points: Vec<Point>) {
        let Some(target) = self.erase.as_ref().map(|s| s.target) else {
            return;
        };
        let Some(layer) = editor.store.get(target) else {
            warn!("erase target {target} vanished; closing overlay");
            self.erase = None;
            self.set_tool(ToolKind::Select);
            return;
        };
        let origin = Vec2::new(layer.x, layer.y);
        let width = editor.settings.brush_size;
        let local: Vec<Point> = points.into_iter().map(|p| p - origin).collect();
        if let Some(session) = self.erase.as_mut() {
            session.strokes.push(MaskStroke::new(local, width));
        }
    }

    /// Rasterize the overlay strokes into a mask and submit the inpaint
    /// request. With no strokes this only prompts the user.
    pub fn confirm_erase(&mut self, editor: &mut Editor) {
        let Some(session) = self.erase.as_ref() else {
            return;
        };
        if session.strokes.is_empty() {
            editor.notify("paint over the area you want to erase first");
            return;
        }
        let target = session.target;
        let Some(layer) = editor.store.get(target) else {
            warn!("erase target {target} vanished before confirm");
            self.erase = None;
            self.set_tool(ToolKind::Select);
            return;
        };
        let LayerKind::Image(image) = &layer.kind else {
            warn!("erase target {target} is no longer an image layer");
            return;
        };
        let width = layer.width.round().max(1.0) as u32;
        let height = layer.height.round().max(1.0) as u32;
        let src = image.src.clone();
        let mask = match rasterize_mask_png(&session.strokes, width, height) {
            Ok(mask) => mask,
            Err(err) => {
                editor.notify(err.to_string());
                return;
            }
        };
        let Some(bridge) = self.ai.as_mut() else {
            editor.notify("the image service is not available");
            return;
        };
        let key = bridge.submit(
            Some(target),
            AiRequest::Inpaint {
                image: src,
                mask,
                prompt: String::new(),
            },
        );
        if let Some(session) = self.erase.as_mut() {
            session.pending = Some(key);
        }
        debug!("inpaint submitted for layer {target}");
    }

    /// Close the erase overlay without applying anything. Any submitted
    /// inpaint is cancelled.
    pub fn cancel_erase(&mut self) {
        self.abandon_erase();
        if self.tool == ToolKind::Erase {
            self.tool = ToolKind::Select;
            self.gesture = GestureState::Idle;
            self.guides.clear();
        }
    }

    fn abandon_erase(&mut self) {
        if let Some(session) = self.erase.take() {
            if let Some(key) = session.pending {
                if let Some(bridge) = self.ai.as_mut() {
                    bridge.cancel(&key);
                }
            }
            debug!("erase overlay closed");
        }
    }

    // ---- image service --------------------------------------------------

    /// Queue an image-service request. A pending request with the same
    /// operation and target is superseded.
    pub fn request_ai(
        &mut self,
        editor: &mut Editor,
        target: Option<LayerId>,
        request: AiRequest,
    ) -> Option<JobKey> {
        let Some(bridge) = self.ai.as_mut() else {
            editor.notify("the image service is not available");
            return None;
        };
        Some(bridge.submit(target, request))
    }

    /// Drain finished image-service requests into the store. Returns the
    /// number of completions handled.
    pub fn poll_ai(&mut self, editor: &mut Editor) -> usize {
        let Some(bridge) = self.ai.as_mut() else {
            return 0;
        };
        let completions = bridge.poll();
        let count = completions.len();
        for completion in completions {
            self.apply_completion(editor, completion);
        }
        count
    }

    fn apply_completion(&mut self, editor: &mut Editor, completion: AiCompletion) {
        let AiCompletion {
            key,
            request,
            result,
            ..
        } = completion;
        let images = match result {
            Ok(images) => images,
            Err(err) => {
                warn!("{:?} request failed: {err}", key.kind);
                editor.notify(err.to_string());
                if let Some(session) = self.erase.as_mut() {
                    if session.pending == Some(key) {
                        // Keep the overlay open so the user can retry.
                        session.pending = None;
                    }
                }
                return;
            }
        };
        if images.is_empty() {
            warn!("{:?} request resolved with no images", key.kind);
            editor.notify("the image service returned no results");
            return;
        }
        match key.kind {
            AiOpKind::Inpaint => self.apply_inpaint(editor, key, images),
            AiOpKind::SuperResolution => {
                Self::replace_target_src(editor, key.target, images, "enhance image");
            }
            AiOpKind::RemoveBackground => {
                Self::replace_target_src(editor, key.target, images, "remove background");
            }
            AiOpKind::Generate => Self::add_generated(editor, &request, images),
            AiOpKind::Outpaint => Self::add_derived(editor, key.target, images, "outpaint image"),
            AiOpKind::EditImage => Self::add_derived(editor, key.target, images, "edit image"),
            AiOpKind::TextReplace => Self::add_derived(editor, key.target, images, "replace text"),
        }
    }

    /// Inpaint result: a new image layer stacked at the erase target's
    /// transform, committed as one action.
    fn apply_inpaint(&mut self, editor: &mut Editor, key: JobKey, mut images: Vec<ImageRef>) {
        let Some(target) = key.target else {
            warn!("inpaint completion without a target layer");
            return;
        };
        let Some(layer) = editor.store.get(target) else {
            warn!("inpaint target {target} no longer exists");
            return;
        };
        let (x, y, width, height) = (layer.x, layer.y, layer.width, layer.height);
        let mut replacement = Layer::new(LayerKind::Image(ImageLayer::new(images.remove(0))));
        replacement.x = x;
        replacement.y = y;
        replacement.width = width;
        replacement.height = height;
        let id = editor.store.insert(replacement);
        editor.store.set_selection(Some(id));

        if self.erase.as_ref().map(|s| s.target) == Some(target) {
            self.erase = None;
            if self.tool == ToolKind::Erase {
                self.tool = ToolKind::Select;
                self.gesture = GestureState::Idle;
            }
        }
        editor.commit("erase");
    }

    /// Swap the target image layer's bitmap in place.
    fn replace_target_src(
        editor: &mut Editor,
        target: Option<LayerId>,
        mut images: Vec<ImageRef>,
        label: &str,
    ) {
        let Some(target) = target else {
            warn!("image edit completion without a target layer");
            return;
        };
        let Some(layer) = editor.store.get(target) else {
            warn!("edit target {target} no longer exists");
            return;
        };
        let LayerKind::Image(image) = &layer.kind else {
            warn!("edit target {target} is not an image layer");
            return;
        };
        let mut updated = image.clone();
        updated.replace_src(images.remove(0));
        editor
            .store
            .update(target, &LayerPatch::replace_kind(LayerKind::Image(updated)));
        editor.commit(label);
    }

    /// Generated images land centered on the canvas, cascaded like pastes.
    fn add_generated(editor: &mut Editor, request: &AiRequest, images: Vec<ImageRef>) {
        let (natural_w, natural_h) = match request {
            AiRequest::Generate(generate) => (generate.width as f64, generate.height as f64),
            _ => (MAX_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION),
        };
        let center = editor.canvas.rect().center();
        let mut first = None;
        for (i, src) in images.into_iter().enumerate() {
            let id = editor.store.add_image(src, natural_w, natural_h);
            let offset = i as f64 * DUPLICATE_OFFSET;
            let size = editor.store.get(id).map(|l| (l.width, l.height));
            if let Some((width, height)) = size {
                let x = center.x - width / 2.0 + offset;
                let y = center.y - height / 2.0 + offset;
                editor.store.update(id, &LayerPatch::move_to(x, y));
            }
            first.get_or_insert(id);
        }
        editor.store.set_selection(first);
        editor.commit("generate image");
    }

    /// Outpaint/edit/text-replace results become new layers beside the
    /// source layer when it still exists.
    fn add_derived(
        editor: &mut Editor,
        target: Option<LayerId>,
        images: Vec<ImageRef>,
        label: &str,
    ) {
        let base = target
            .and_then(|id| editor.store.get(id))
            .map(|l| (l.x, l.y, l.width, l.height));
        let mut last = None;
        for (i, src) in images.into_iter().enumerate() {
            let offset = (i + 1) as f64 * DUPLICATE_OFFSET;
            let id = match base {
                Some((x, y, width, height)) => {
                    let mut layer = Layer::new(LayerKind::Image(ImageLayer::new(src)));
                    layer.x = x + offset;
                    layer.y = y + offset;
                    layer.width = width;
                    layer.height = height;
                    editor.store.insert(layer)
                }
                None => editor.store.add_image(src, MAX_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION),
            };
            last = Some(id);
        }
        editor.store.set_selection(last);
        editor.commit(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::{ScriptedService, ok};
    use crate::ai::{AiError, GenerateRequest, OutpaintDirection, Upscale};
    use crate::canvas::CanvasState;
    use crate::layer::{Color, ShapeType};
    use std::thread;
    use std::time::{Duration, Instant};

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    fn moved(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move {
            position: Point::new(x, y),
        }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    fn drag(controller: &mut ToolController, editor: &mut Editor, from: Point, to: Point) {
        controller.handle_pointer(editor, &down(from.x, from.y));
        controller.handle_pointer(editor, &moved(to.x, to.y));
        controller.handle_pointer(editor, &up(to.x, to.y));
    }

    fn shape_at(editor: &mut Editor, rect: Rect) -> LayerId {
        let id = editor.store.add_shape(rect, ShapeLayer::default());
        editor.commit("add shape");
        id
    }

    fn poll_until_applied(controller: &mut ToolController, editor: &mut Editor) -> usize {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let applied = controller.poll_ai(editor);
            if applied > 0 || Instant::now() >= deadline {
                return applied;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_marquee_selects_topmost_intersecting() {
        let mut editor = Editor::new();
        let _bottom = shape_at(&mut editor, Rect::new(100.0, 100.0, 200.0, 200.0));
        let top = shape_at(&mut editor, Rect::new(150.0, 150.0, 250.0, 250.0));
        let history_len = editor.history.len();

        let mut controller = ToolController::new();
        drag(
            &mut controller,
            &mut editor,
            Point::new(10.0, 10.0),
            Point::new(160.0, 160.0),
        );

        assert_eq!(editor.store.selection(), Some(top));
        // Selection is not a history action.
        assert_eq!(editor.history.len(), history_len);
    }

    #[test]
    fn test_tiny_marquee_counts_as_click_and_clears() {
        let mut editor = Editor::new();
        let id = shape_at(&mut editor, Rect::new(100.0, 100.0, 200.0, 200.0));
        editor.store.set_selection(Some(id));

        let mut controller = ToolController::new();
        drag(
            &mut controller,
            &mut editor,
            Point::new(500.0, 500.0),
            Point::new(501.0, 501.0),
        );
        assert_eq!(editor.store.selection(), None);
    }

    #[test]
    fn test_marquee_over_empty_space_clears_selection() {
        let mut editor = Editor::new();
        let id = shape_at(&mut editor, Rect::new(0.0, 0.0, 50.0, 50.0));
        editor.store.set_selection(Some(id));

        let mut controller = ToolController::new();
        drag(
            &mut controller,
            &mut editor,
            Point::new(400.0, 400.0),
            Point::new(500.0, 500.0),
        );
        assert_eq!(editor.store.selection(), None);
    }

    #[test]
    fn test_click_selects_and_drag_moves_without_commit() {
        let mut editor = Editor::new();
        let id = shape_at(&mut editor, Rect::new(100.0, 100.0, 150.0, 150.0));
        let history_len = editor.history.len();

        let mut controller = ToolController::new();
        drag(
            &mut controller,
            &mut editor,
            Point::new(110.0, 110.0),
            Point::new(210.0, 160.0),
        );

        let layer = editor.store.get(id).unwrap();
        assert_eq!(editor.store.selection(), Some(id));
        assert!((layer.x - 200.0).abs() < f64::EPSILON);
        assert!((layer.y - 150.0).abs() < f64::EPSILON);
        assert_eq!(editor.history.len(), history_len);
        assert!(controller.guides().is_empty());
    }

    #[test]
    fn test_drag_snaps_to_neighbor_edge_with_guide() {
        let mut editor = Editor::new();
        let _anchor = shape_at(&mut editor, Rect::new(100.0, 300.0, 200.0, 350.0));
        let id = shape_at(&mut editor, Rect::new(400.0, 500.0, 450.0, 550.0));

        let mut controller = ToolController::new();
        controller.handle_pointer(&mut editor, &down(425.0, 525.0));
        // Pointer lands the left edge six units past the anchor's right edge.
        controller.handle_pointer(&mut editor, &moved(231.0, 525.0));

        let layer = editor.store.get(id).unwrap();
        assert!((layer.x - 200.0).abs() < f64::EPSILON);
        assert_eq!(controller.guides().len(), 1);
        assert!((controller.guides()[0].position - 200.0).abs() < f64::EPSILON);

        controller.handle_pointer(&mut editor, &up(231.0, 525.0));
        assert!(controller.guides().is_empty());
        let layer = editor.store.get(id).unwrap();
        assert!((layer.x - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_disabled_leaves_position_raw() {
        let mut editor = Editor::new();
        let _anchor = shape_at(&mut editor, Rect::new(100.0, 300.0, 200.0, 350.0));
        let id = shape_at(&mut editor, Rect::new(400.0, 500.0, 450.0, 550.0));

        let mut controller = ToolController::new();
        controller.set_snap_enabled(false);
        drag(
            &mut controller,
            &mut editor,
            Point::new(425.0, 525.0),
            Point::new(231.0, 525.0),
        );
        let layer = editor.store.get(id).unwrap();
        assert!((layer.x - 206.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_locked_layer_selects_but_does_not_drag() {
        let mut editor = Editor::new();
        let id = shape_at(&mut editor, Rect::new(100.0, 100.0, 150.0, 150.0));
        editor.store.update(
            id,
            &LayerPatch {
                locked: Some(true),
                ..LayerPatch::default()
            },
        );
        let history_len = editor.history.len();

        let mut controller = ToolController::new();
        drag(
            &mut controller,
            &mut editor,
            Point::new(110.0, 110.0),
            Point::new(300.0, 300.0),
        );

        assert_eq!(editor.store.selection(), Some(id));
        let layer = editor.store.get(id).unwrap();
        assert!((layer.x - 100.0).abs() < f64::EPSILON);
        assert_eq!(editor.history.len(), history_len);
    }

    #[test]
    fn test_pointer_converted_through_viewport() {
        let mut canvas = CanvasState::default();
        canvas.zoom = 2.0;
        canvas.pan_x = 100.0;
        let mut editor = Editor::with_canvas(canvas);

        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Marker);
        // Screen (300, 200) maps to canvas (100, 100) under zoom 2, pan 100.
        controller.handle_pointer(&mut editor, &down(300.0, 200.0));

        let marker = editor.store.selected_layer().unwrap();
        assert_eq!(marker.center(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_shape_draft_under_min_size_discarded() {
        let mut editor = Editor::new();
        let history_len = editor.history.len();
        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Shape(ShapeType::Rectangle));

        drag(
            &mut controller,
            &mut editor,
            Point::new(100.0, 100.0),
            Point::new(105.0, 109.0),
        );

        assert_eq!(editor.store.len(), 0);
        assert_eq!(editor.history.len(), history_len);
        assert!(controller.gesture().is_idle());
    }

    #[test]
    fn test_shape_tool_creates_and_commits() {
        let mut editor = Editor::new();
        editor.settings.stroke_color = Color::rgb(10, 20, 30);
        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Shape(ShapeType::Circle));

        drag(
            &mut controller,
            &mut editor,
            Point::new(140.0, 120.0),
            Point::new(100.0, 200.0),
        );

        assert_eq!(editor.store.len(), 1);
        let layer = editor.store.selected_layer().unwrap();
        assert_eq!(layer.bounds(), Rect::new(100.0, 120.0, 140.0, 200.0));
        match &layer.kind {
            LayerKind::Shape(shape) => {
                assert_eq!(shape.shape_type, ShapeType::Circle);
                assert_eq!(shape.stroke_color, Color::rgb(10, 20, 30));
            }
            other => panic!("expected a shape layer, got {other:?}"),
        }
        assert_eq!(editor.history.current_label(), Some("add shape"));
    }

    #[test]
    fn test_marker_created_on_down_with_incrementing_labels() {
        let mut editor = Editor::new();
        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Marker);

        controller.handle_pointer(&mut editor, &down(300.0, 200.0));
        controller.handle_pointer(&mut editor, &up(300.0, 200.0));
        controller.handle_pointer(&mut editor, &down(400.0, 300.0));
        controller.handle_pointer(&mut editor, &up(400.0, 300.0));

        assert_eq!(editor.store.len(), 2);
        assert_eq!(editor.history.current_label(), Some("add marker"));
        let labels: Vec<u32> = editor
            .store
            .layers()
            .map(|l| match &l.kind {
                LayerKind::Marker(m) => m.label,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(labels, vec![1, 2]);
        assert_eq!(
            editor.store.layers().next().unwrap().center(),
            Point::new(300.0, 200.0)
        );
    }

    #[test]
    fn test_pencil_stroke_width_and_commit() {
        let mut editor = Editor::new();
        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Pencil);

        controller.handle_pointer(&mut editor, &down(10.0, 10.0));
        controller.handle_pointer(&mut editor, &moved(20.0, 20.0));
        controller.handle_pointer(&mut editor, &moved(30.0, 25.0));
        controller.handle_pointer(&mut editor, &up(30.0, 25.0));

        assert_eq!(editor.store.len(), 1);
        let layer = editor.store.selected_layer().unwrap();
        match &layer.kind {
            LayerKind::Drawing(drawing) => {
                assert_eq!(drawing.lines.len(), 1);
                assert_eq!(drawing.lines[0].points.len(), 3);
                // Pencil strokes are three times the brush size.
                assert!((drawing.lines[0].width - 12.0).abs() < f64::EPSILON);
            }
            other => panic!("expected a drawing layer, got {other:?}"),
        }
        assert_eq!(layer.bounds(), Rect::new(10.0, 10.0, 30.0, 25.0));
        assert_eq!(editor.history.current_label(), Some("draw stroke"));
    }

    #[test]
    fn test_brush_stroke_uses_brush_size() {
        let mut editor = Editor::new();
        editor.settings.brush_size = 7.0;
        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Brush);

        drag(
            &mut controller,
            &mut editor,
            Point::new(0.0, 0.0),
            Point::new(40.0, 0.0),
        );

        let layer = editor.store.selected_layer().unwrap();
        match &layer.kind {
            LayerKind::Drawing(drawing) => {
                assert!((drawing.lines[0].width - 7.0).abs() < f64::EPSILON);
            }
            other => panic!("expected a drawing layer, got {other:?}"),
        }
    }

    #[test]
    fn test_single_point_stroke_discarded() {
        let mut editor = Editor::new();
        let history_len = editor.history.len();
        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Pencil);

        controller.handle_pointer(&mut editor, &down(10.0, 10.0));
        controller.handle_pointer(&mut editor, &up(10.0, 10.0));

        assert_eq!(editor.store.len(), 0);
        assert_eq!(editor.history.len(), history_len);
    }

    #[test]
    fn test_second_stroke_reuses_selected_drawing_layer() {
        let mut editor = Editor::new();
        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Pencil);

        drag(
            &mut controller,
            &mut editor,
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
        );
        drag(
            &mut controller,
            &mut editor,
            Point::new(0.0, 20.0),
            Point::new(30.0, 20.0),
        );

        assert_eq!(editor.store.len(), 1);
        match &editor.store.selected_layer().unwrap().kind {
            LayerKind::Drawing(drawing) => assert_eq!(drawing.lines.len(), 2),
            other => panic!("expected a drawing layer, got {other:?}"),
        }
    }

    #[test]
    fn test_mask_tool_paints_mask_layer() {
        let mut editor = Editor::new();
        let image = editor.store.add_image("photo.png".to_string(), 400.0, 300.0);
        editor.commit("add image");
        editor.store.set_selection(Some(image));

        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Mask);
        drag(
            &mut controller,
            &mut editor,
            Point::new(50.0, 50.0),
            Point::new(120.0, 80.0),
        );

        assert_eq!(editor.store.len(), 2);
        let mask = editor.store.selected_layer().unwrap();
        match &mask.kind {
            LayerKind::Mask(m) => {
                assert_eq!(m.strokes.len(), 1);
                assert_eq!(m.target, Some(image));
            }
            other => panic!("expected a mask layer, got {other:?}"),
        }
        assert_eq!(editor.history.current_label(), Some("paint mask"));
    }

    #[test]
    fn test_pen_clicks_accumulate_and_enter_commits() {
        let mut editor = Editor::new();
        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Pen);

        for (x, y) in [(10.0, 10.0), (60.0, 10.0), (60.0, 50.0)] {
            controller.handle_pointer(&mut editor, &down(x, y));
            controller.handle_pointer(&mut editor, &up(x, y));
        }
        assert_eq!(controller.pen_draft().len(), 3);
        let pen = editor.store.active_pen().unwrap();

        controller.key_down(&mut editor, Key::Enter, Modifiers::NONE);

        assert!(controller.pen_draft().is_empty());
        assert_eq!(editor.history.current_label(), Some("complete pen path"));
        match &editor.store.get(pen).unwrap().kind {
            LayerKind::Pen(p) => {
                assert_eq!(p.paths.len(), 1);
                assert_eq!(p.paths[0].anchors.len(), 3);
            }
            other => panic!("expected a pen layer, got {other:?}"),
        }
        // The layer stays active for the next path.
        assert_eq!(editor.store.active_pen(), Some(pen));
    }

    #[test]
    fn test_pen_enter_with_one_anchor_prompts() {
        let mut editor = Editor::new();
        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Pen);
        controller.handle_pointer(&mut editor, &down(10.0, 10.0));
        controller.handle_pointer(&mut editor, &up(10.0, 10.0));
        let history_len = editor.history.len();

        controller.key_down(&mut editor, Key::Enter, Modifiers::NONE);

        assert_eq!(controller.pen_draft().len(), 1);
        assert_eq!(editor.history.len(), history_len);
        assert!(!editor.drain_messages().is_empty());
    }

    #[test]
    fn test_pen_escape_discards_draft() {
        let mut editor = Editor::new();
        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Pen);
        controller.handle_pointer(&mut editor, &down(10.0, 10.0));
        controller.handle_pointer(&mut editor, &up(10.0, 10.0));
        controller.handle_pointer(&mut editor, &down(40.0, 10.0));
        controller.handle_pointer(&mut editor, &up(40.0, 10.0));
        let history_len = editor.history.len();
        let pen = editor.store.active_pen().unwrap();

        controller.key_down(&mut editor, Key::Escape, Modifiers::NONE);

        assert!(controller.pen_draft().is_empty());
        assert_eq!(editor.history.len(), history_len);
        match &editor.store.get(pen).unwrap().kind {
            LayerKind::Pen(p) => assert!(p.paths.is_empty()),
            other => panic!("expected a pen layer, got {other:?}"),
        }
    }

    #[test]
    fn test_escape_clears_selection() {
        let mut editor = Editor::new();
        let id = shape_at(&mut editor, Rect::new(0.0, 0.0, 50.0, 50.0));
        editor.store.set_selection(Some(id));

        let mut controller = ToolController::new();
        controller.key_down(&mut editor, Key::Escape, Modifiers::NONE);
        assert_eq!(editor.store.selection(), None);
    }

    #[test]
    fn test_delete_removes_selected_and_commits() {
        let mut editor = Editor::new();
        let id = shape_at(&mut editor, Rect::new(0.0, 0.0, 50.0, 50.0));
        editor.store.set_selection(Some(id));

        let mut controller = ToolController::new();
        controller.key_down(&mut editor, Key::Delete, Modifiers::NONE);

        assert_eq!(editor.store.len(), 0);
        assert_eq!(editor.history.current_label(), Some("delete layer"));
    }

    #[test]
    fn test_delete_ignores_locked_layer() {
        let mut editor = Editor::new();
        let id = shape_at(&mut editor, Rect::new(0.0, 0.0, 50.0, 50.0));
        editor.store.update(
            id,
            &LayerPatch {
                locked: Some(true),
                ..LayerPatch::default()
            },
        );
        editor.store.set_selection(Some(id));
        let history_len = editor.history.len();

        let mut controller = ToolController::new();
        controller.key_down(&mut editor, Key::Backspace, Modifiers::NONE);

        assert_eq!(editor.store.len(), 1);
        assert_eq!(editor.history.len(), history_len);
    }

    #[test]
    fn test_arrow_keys_nudge_without_commit() {
        let mut editor = Editor::new();
        let id = shape_at(&mut editor, Rect::new(100.0, 100.0, 150.0, 150.0));
        editor.store.set_selection(Some(id));
        let history_len = editor.history.len();

        let mut controller = ToolController::new();
        controller.key_down(&mut editor, Key::ArrowRight, Modifiers::NONE);
        controller.key_down(&mut editor, Key::ArrowDown, Modifiers::shift());
        controller.key_down(&mut editor, Key::ArrowUp, Modifiers::NONE);

        let layer = editor.store.get(id).unwrap();
        assert!((layer.x - 101.0).abs() < f64::EPSILON);
        assert!((layer.y - 109.0).abs() < f64::EPSILON);
        assert_eq!(editor.history.len(), history_len);
    }

    #[test]
    fn test_clipboard_chords() {
        let mut editor = Editor::new();
        let id = shape_at(&mut editor, Rect::new(0.0, 0.0, 50.0, 50.0));
        editor.store.set_selection(Some(id));

        let mut controller = ToolController::new();
        let command = Modifiers::command_only();
        controller.key_down(&mut editor, Key::Character('c'), command);
        controller.key_down(&mut editor, Key::Character('v'), command);

        assert_eq!(editor.store.len(), 2);
        assert_eq!(editor.history.current_label(), Some("paste layer"));

        controller.key_down(&mut editor, Key::Character('d'), command);
        assert_eq!(editor.store.len(), 3);
        assert_eq!(editor.history.current_label(), Some("duplicate layer"));

        controller.key_down(&mut editor, Key::Character('x'), command);
        assert_eq!(editor.store.len(), 2);
        assert_eq!(editor.history.current_label(), Some("cut layer"));
    }

    #[test]
    fn test_undo_redo_chords() {
        let mut editor = Editor::new();
        shape_at(&mut editor, Rect::new(0.0, 0.0, 50.0, 50.0));

        let mut controller = ToolController::new();
        controller.key_down(&mut editor, Key::Character('z'), Modifiers::command_only());
        assert_eq!(editor.store.len(), 0);

        let mut redo = Modifiers::command_only();
        redo.shift = true;
        controller.key_down(&mut editor, Key::Character('z'), redo);
        assert_eq!(editor.store.len(), 1);

        controller.key_down(&mut editor, Key::Character('z'), Modifiers::command_only());
        controller.key_down(&mut editor, Key::Character('y'), Modifiers::command_only());
        assert_eq!(editor.store.len(), 1);
    }

    #[test]
    fn test_select_all_chord_picks_topmost() {
        let mut editor = Editor::new();
        shape_at(&mut editor, Rect::new(0.0, 0.0, 50.0, 50.0));
        let top = shape_at(&mut editor, Rect::new(10.0, 10.0, 60.0, 60.0));

        let mut controller = ToolController::new();
        controller.key_down(&mut editor, Key::Character('a'), Modifiers::command_only());
        assert_eq!(editor.store.selection(), Some(top));
    }

    #[test]
    fn test_tool_switch_clears_draft_and_gesture() {
        let mut editor = Editor::new();
        let mut controller = ToolController::new();
        controller.set_tool(ToolKind::Pen);
        controller.handle_pointer(&mut editor, &down(10.0, 10.0));
        controller.handle_pointer(&mut editor, &up(10.0, 10.0));
        assert_eq!(controller.pen_draft().len(), 1);

        controller.set_tool(ToolKind::Select);
        assert!(controller.pen_draft().is_empty());
        assert!(controller.gesture().is_idle());
    }

    #[test]
    fn test_erase_flow_creates_layer_and_commits() {
        let mut editor = Editor::new();
        let target = editor.store.add_image("photo.png".to_string(), 100.0, 80.0);
        editor.store.update(target, &LayerPatch::move_to(50.0, 40.0));
        editor.commit("add image");
        let history_len = editor.history.len();

        let mut controller = ToolController::with_ai(ScriptedService::new(vec![ok(&[
            "data:image/png;base64,erased",
        ])]));
        assert!(controller.begin_erase(&mut editor, target));
        assert_eq!(controller.tool(), ToolKind::Erase);

        drag(
            &mut controller,
            &mut editor,
            Point::new(60.0, 50.0),
            Point::new(120.0, 90.0),
        );
        let session = controller.erase_session().unwrap();
        assert_eq!(session.strokes.len(), 1);
        // Strokes are stored target-local.
        assert_eq!(session.strokes[0].points[0], Point::new(10.0, 10.0));
        assert_eq!(session.strokes[0].points.last(), Some(&Point::new(70.0, 50.0)));

        controller.confirm_erase(&mut editor);
        assert!(controller.is_loading());

        assert_eq!(poll_until_applied(&mut controller, &mut editor), 1);
        assert_eq!(editor.store.len(), 2);
        let result = editor.store.selected_layer().unwrap();
        assert!((result.x - 50.0).abs() < f64::EPSILON);
        assert!((result.y - 40.0).abs() < f64::EPSILON);
        assert!((result.width - 100.0).abs() < f64::EPSILON);
        match &result.kind {
            LayerKind::Image(image) => {
                assert_eq!(image.src, "data:image/png;base64,erased");
            }
            other => panic!("expected an image layer, got {other:?}"),
        }
        assert_eq!(editor.history.len(), history_len + 1);
        assert_eq!(editor.history.current_label(), Some("erase"));
        assert!(controller.erase_session().is_none());
        assert_eq!(controller.tool(), ToolKind::Select);
        assert!(!controller.is_loading());
    }

    #[test]
    fn test_erase_confirm_without_strokes_prompts() {
        let mut editor = Editor::new();
        let target = editor.store.add_image("photo.png".to_string(), 100.0, 80.0);
        editor.commit("add image");

        let mut controller = ToolController::with_ai(ScriptedService::new(vec![]));
        assert!(controller.begin_erase(&mut editor, target));
        controller.confirm_erase(&mut editor);

        assert!(!controller.is_loading());
        assert!(!editor.drain_messages().is_empty());
        assert!(controller.erase_session().is_some());
    }

    #[test]
    fn test_erase_failure_leaves_store_unchanged() {
        let mut editor = Editor::new();
        let target = editor.store.add_image("photo.png".to_string(), 100.0, 80.0);
        editor.commit("add image");
        let history_len = editor.history.len();

        let mut controller = ToolController::with_ai(ScriptedService::new(vec![Err(
            AiError::Service("model overloaded".to_string()),
        )]));
        assert!(controller.begin_erase(&mut editor, target));
        drag(
            &mut controller,
            &mut editor,
            Point::new(10.0, 10.0),
            Point::new(40.0, 40.0),
        );
        controller.confirm_erase(&mut editor);

        assert_eq!(poll_until_applied(&mut controller, &mut editor), 1);
        assert_eq!(editor.store.len(), 1);
        assert_eq!(editor.history.len(), history_len);
        assert_eq!(editor.drain_messages(), vec!["model overloaded"]);
        // Overlay stays open for a retry, loading indicator cleared.
        assert!(controller.erase_session().is_some());
        assert!(!controller.is_loading());
    }

    #[test]
    fn test_erase_cancel_drops_pending_result() {
        let mut editor = Editor::new();
        let target = editor.store.add_image("photo.png".to_string(), 100.0, 80.0);
        editor.commit("add image");

        let service = ScriptedService::new(vec![ok(&["late.png"])])
            .with_delay(Duration::from_millis(30));
        let mut controller = ToolController::with_ai(service);
        assert!(controller.begin_erase(&mut editor, target));
        drag(
            &mut controller,
            &mut editor,
            Point::new(10.0, 10.0),
            Point::new(40.0, 40.0),
        );
        controller.confirm_erase(&mut editor);
        controller.cancel_erase();

        assert!(controller.erase_session().is_none());
        assert_eq!(controller.tool(), ToolKind::Select);
        thread::sleep(Duration::from_millis(120));
        assert_eq!(controller.poll_ai(&mut editor), 0);
        assert_eq!(editor.store.len(), 1);
    }

    #[test]
    fn test_begin_erase_rejects_non_image() {
        let mut editor = Editor::new();
        let text = editor.store.add_text("hello");
        editor.commit("add text");

        let mut controller = ToolController::new();
        assert!(!controller.begin_erase(&mut editor, text));
        assert!(!editor.drain_messages().is_empty());
        assert_eq!(controller.tool(), ToolKind::Select);
    }

    #[test]
    fn test_generate_completion_adds_centered_layers() {
        let mut editor = Editor::new();
        let mut controller =
            ToolController::with_ai(ScriptedService::new(vec![ok(&["gen-1.png", "gen-2.png"])]));

        let mut request = GenerateRequest::new("a lighthouse");
        request.count = 2;
        request.width = 400;
        request.height = 400;
        controller
            .request_ai(&mut editor, None, AiRequest::Generate(request))
            .unwrap();

        assert_eq!(poll_until_applied(&mut controller, &mut editor), 1);
        assert_eq!(editor.store.len(), 2);
        assert_eq!(editor.history.current_label(), Some("generate image"));

        let layers: Vec<&Layer> = editor.store.layers().collect();
        // 1280x720 canvas center, 400x400 image.
        assert!((layers[0].x - 440.0).abs() < f64::EPSILON);
        assert!((layers[0].y - 160.0).abs() < f64::EPSILON);
        assert!((layers[1].x - 450.0).abs() < f64::EPSILON);
        assert_eq!(editor.store.selection(), Some(layers[0].id));
    }

    #[test]
    fn test_super_resolution_replaces_src_in_place() {
        let mut editor = Editor::new();
        let id = editor.store.add_image("orig.png".to_string(), 400.0, 300.0);
        editor.commit("add image");

        let mut controller = ToolController::with_ai(ScriptedService::new(vec![ok(&["hires.png"])]));
        controller
            .request_ai(
                &mut editor,
                Some(id),
                AiRequest::SuperResolution {
                    image: "orig.png".to_string(),
                    scale: Upscale::X2,
                },
            )
            .unwrap();

        assert_eq!(poll_until_applied(&mut controller, &mut editor), 1);
        assert_eq!(editor.store.len(), 1);
        let layer = editor.store.get(id).unwrap();
        match &layer.kind {
            LayerKind::Image(image) => {
                assert_eq!(image.src, "hires.png");
                assert_eq!(image.original_src.as_deref(), Some("orig.png"));
            }
            other => panic!("expected an image layer, got {other:?}"),
        }
        assert!((layer.width - 400.0).abs() < f64::EPSILON);
        assert_eq!(editor.history.current_label(), Some("enhance image"));
    }

    #[test]
    fn test_completion_for_deleted_target_is_noop() {
        let mut editor = Editor::new();
        let id = editor.store.add_image("orig.png".to_string(), 400.0, 300.0);
        editor.commit("add image");

        let service =
            ScriptedService::new(vec![ok(&["clean.png"])]).with_delay(Duration::from_millis(20));
        let mut controller = ToolController::with_ai(service);
        controller
            .request_ai(
                &mut editor,
                Some(id),
                AiRequest::RemoveBackground {
                    image: "orig.png".to_string(),
                },
            )
            .unwrap();

        editor.store.remove(id);
        editor.commit("delete layer");
        let history_len = editor.history.len();

        assert_eq!(poll_until_applied(&mut controller, &mut editor), 1);
        assert_eq!(editor.store.len(), 0);
        assert_eq!(editor.history.len(), history_len);
    }

    #[test]
    fn test_outpaint_adds_beside_target() {
        let mut editor = Editor::new();
        let id = editor.store.add_image("orig.png".to_string(), 200.0, 100.0);
        editor.store.update(id, &LayerPatch::move_to(30.0, 60.0));
        editor.commit("add image");

        let mut controller = ToolController::with_ai(ScriptedService::new(vec![ok(&["wide.png"])]));
        controller
            .request_ai(
                &mut editor,
                Some(id),
                AiRequest::Outpaint {
                    image: "orig.png".to_string(),
                    direction: OutpaintDirection::Right,
                    prompt: None,
                },
            )
            .unwrap();

        assert_eq!(poll_until_applied(&mut controller, &mut editor), 1);
        assert_eq!(editor.store.len(), 2);
        assert_eq!(editor.history.current_label(), Some("outpaint image"));
        let added = editor.store.selected_layer().unwrap();
        assert!((added.x - 40.0).abs() < f64::EPSILON);
        assert!((added.y - 70.0).abs() < f64::EPSILON);
        assert!((added.width - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_request_without_service_notifies() {
        let mut editor = Editor::new();
        let mut controller = ToolController::new();
        let key = controller.request_ai(
            &mut editor,
            None,
            AiRequest::Generate(GenerateRequest::new("x")),
        );
        assert!(key.is_none());
        assert!(!editor.drain_messages().is_empty());
        assert!(!controller.is_loading());
    }
}
