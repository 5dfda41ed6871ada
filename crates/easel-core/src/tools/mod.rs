//! Tools and pointer-gesture state.

mod controller;

pub use controller::ToolController;

use crate::ai::JobKey;
use crate::layer::{LayerId, MaskStroke, ShapeType};
use kurbo::{Point, Rect, Vec2};

/// Marquee boxes at or under this area count as plain clicks.
pub const MARQUEE_MIN_AREA: f64 = 2.0;

/// Shape drafts smaller than this on either side are discarded on release.
pub const MIN_SHAPE_SIZE: f64 = 10.0;

/// The active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Select,
    /// Viewport pan; the surface applies the pan itself.
    Move,
    Shape(ShapeType),
    Marker,
    Pencil,
    Brush,
    Mask,
    Pen,
    /// Modal erase overlay over one image layer.
    Erase,
}

impl ToolKind {
    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::Select => "Select",
            ToolKind::Move => "Move",
            ToolKind::Shape(shape) => shape.label(),
            ToolKind::Marker => "Marker",
            ToolKind::Pencil => "Pencil",
            ToolKind::Brush => "Brush",
            ToolKind::Mask => "Mask",
            ToolKind::Pen => "Pen",
            ToolKind::Erase => "Erase",
        }
    }
}

/// The in-flight pointer gesture. At most one is active; the controller
/// owns the transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureState {
    Idle,
    /// Rubber-band selection started on empty canvas.
    Marquee { start: Point, current: Point },
    /// Dragging a layer; `grab` is the pointer offset from the layer
    /// origin at press time.
    DragLayer { id: LayerId, grab: Vec2 },
    /// Growing a shape rectangle from the press corner.
    ShapeDraft { start: Point, current: Point },
    /// Accumulating a polyline in canvas coordinates.
    Stroke { points: Vec<Point> },
    /// Move tool press is held; the viewport pans outside the core.
    Panning,
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, GestureState::Idle)
    }

    /// Normalized corner-to-corner rectangle of a marquee or shape draft.
    pub fn drag_rect(&self) -> Option<Rect> {
        match self {
            GestureState::Marquee { start, current }
            | GestureState::ShapeDraft { start, current } => {
                Some(Rect::from_points(*start, *current))
            }
            _ => None,
        }
    }
}

/// State of the modal erase overlay.
#[derive(Debug, Clone)]
pub struct EraseSession {
    /// Image layer being erased from.
    pub target: LayerId,
    /// Accumulated strokes, in target-local coordinates.
    pub strokes: Vec<MaskStroke>,
    /// The inpaint job submitted on confirm, until it resolves.
    pub pending: Option<JobKey>,
}
