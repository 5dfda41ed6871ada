//! Layer data model.
//!
//! A [`Layer`] is one addressable visual entity on the canvas. Every layer
//! carries the same base record (identity, display name, visibility/lock
//! flags, opacity, an axis-aligned transform and a dense z-index rank) plus
//! a [`LayerKind`] payload for its variant. Variant-specific logic matches
//! exhaustively on the kind so adding a variant is a compile-time checklist.

mod drawing;
mod image;
mod marker;
mod mask;
mod pen;
mod shape;
mod text;
mod video;

pub use drawing::{DrawingLayer, DrawingLine, LineCap, LineJoin};
pub use image::{ImageFilters, ImageLayer, ImageRef, fit_within, MAX_IMAGE_DIMENSION};
pub use marker::{MarkerLayer, MARKER_SIZE};
pub use mask::{MaskError, MaskLayer, MaskStroke, MaskTone, rasterize_mask, rasterize_mask_png};
pub use pen::{PenAnchor, PenLayer, PenPath};
pub use shape::{ShapeLayer, ShapeType};
pub use text::{FontStyle, FontWeight, TextAlign, TextLayer};
pub use video::{VideoLayer, VideoPlayback};

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a layer.
pub type LayerId = Uuid;

/// RGBA color with 8-bit components, serializable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl From<Color> for peniko::Color {
    fn from(c: Color) -> Self {
        peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
    }
}

impl From<peniko::Color> for Color {
    fn from(c: peniko::Color) -> Self {
        let rgba = c.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

/// Variant payload of a layer.
///
/// Serialized internally tagged so a layer record reads as one flat object
/// with a `type` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    Image(ImageLayer),
    Text(TextLayer),
    Drawing(DrawingLayer),
    Shape(ShapeLayer),
    Marker(MarkerLayer),
    Pen(PenLayer),
    Mask(MaskLayer),
    Video(VideoLayer),
}

impl LayerKind {
    /// Lowercase tag for logging and tests.
    pub fn tag(&self) -> &'static str {
        match self {
            LayerKind::Image(_) => "image",
            LayerKind::Text(_) => "text",
            LayerKind::Drawing(_) => "drawing",
            LayerKind::Shape(_) => "shape",
            LayerKind::Marker(_) => "marker",
            LayerKind::Pen(_) => "pen",
            LayerKind::Mask(_) => "mask",
            LayerKind::Video(_) => "video",
        }
    }

    /// Default display name for a freshly created layer of this kind.
    pub fn display_name(&self) -> String {
        match self {
            LayerKind::Image(_) => "Image".to_string(),
            LayerKind::Text(_) => "Text".to_string(),
            LayerKind::Drawing(_) => "Drawing".to_string(),
            LayerKind::Shape(s) => format!("Shape ({})", s.shape_type.label()),
            LayerKind::Marker(m) => format!("Marker {}", m.label),
            LayerKind::Pen(_) => "Pen".to_string(),
            LayerKind::Mask(_) => "Mask".to_string(),
            LayerKind::Video(_) => "Video".to_string(),
        }
    }
}

/// One layer record: base properties shared by all variants plus the
/// variant payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees around the layer center.
    #[serde(default)]
    pub rotation: f64,
    /// Dense paint-order rank, `0..N-1` across the store.
    pub z_index: usize,
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    /// Create a layer with type defaults at zero position and size.
    ///
    /// The store assigns the final `z_index` on insertion.
    pub fn new(kind: LayerKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: kind.display_name(),
            visible: true,
            locked: false,
            opacity: 1.0,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            z_index: 0,
            kind,
        }
    }

    /// Axis-aligned bounding box, ignoring rotation.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Hit test against the axis-aligned bounds.
    pub fn contains(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Assign a fresh id, used when pasting or duplicating.
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
    }

    /// Bounding box of the variant's geometric content (stroke points,
    /// pen anchors), if the variant has any.
    pub fn content_bounds(&self) -> Option<Rect> {
        match &self.kind {
            LayerKind::Drawing(d) => d.content_bounds(),
            LayerKind::Pen(p) => p.content_bounds(),
            LayerKind::Mask(m) => m.content_bounds(),
            LayerKind::Image(_)
            | LayerKind::Text(_)
            | LayerKind::Shape(_)
            | LayerKind::Marker(_)
            | LayerKind::Video(_) => None,
        }
    }

    /// Apply a partial patch. Returns `false` without touching the layer
    /// when the patch carries a payload of a different variant.
    pub fn apply_patch(&mut self, patch: &LayerPatch) -> bool {
        if let Some(kind) = &patch.kind {
            if std::mem::discriminant(kind) != std::mem::discriminant(&self.kind) {
                return false;
            }
        }
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
        if let Some(locked) = patch.locked {
            self.locked = locked;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(kind) = &patch.kind {
            self.kind = kind.clone();
        }
        true
    }
}

/// Partial update for a layer.
///
/// `None` fields are left untouched. The optional `kind` replacement must
/// match the target layer's variant; the z-index rank is not patchable and
/// only changes through store reordering.
#[derive(Debug, Clone, Default)]
pub struct LayerPatch {
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub opacity: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub kind: Option<LayerKind>,
}

impl LayerPatch {
    pub fn move_to(x: f64, y: f64) -> Self {
        LayerPatch {
            x: Some(x),
            y: Some(y),
            ..LayerPatch::default()
        }
    }

    pub fn resize(width: f64, height: f64) -> Self {
        LayerPatch {
            width: Some(width),
            height: Some(height),
            ..LayerPatch::default()
        }
    }

    pub fn replace_kind(kind: LayerKind) -> Self {
        LayerPatch {
            kind: Some(kind),
            ..LayerPatch::default()
        }
    }
}

/// Bounding box of a point cloud. `None` when empty.
pub(crate) fn bounds_of_points<I>(points: I) -> Option<Rect>
where
    I: IntoIterator<Item = Point>,
{
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let mut rect = Rect::new(first.x, first.y, first.x, first.y);
    for p in iter {
        rect = rect.union_pt(p);
    }
    Some(rect)
}
