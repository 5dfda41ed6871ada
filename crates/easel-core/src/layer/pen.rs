//! Bezier pen layer payload.

use super::{Color, bounds_of_points};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// One anchor of an authored path. Control handles are optional; an anchor
/// without handles joins its neighbors with straight segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenAnchor {
    pub point: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_in: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_out: Option<Point>,
}

impl PenAnchor {
    pub fn corner(point: Point) -> Self {
        Self {
            point,
            handle_in: None,
            handle_out: None,
        }
    }
}

/// One completed path on a pen layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenPath {
    pub anchors: Vec<PenAnchor>,
    #[serde(default)]
    pub closed: bool,
}

impl PenPath {
    pub fn new(anchors: Vec<PenAnchor>) -> Self {
        Self {
            anchors,
            closed: false,
        }
    }
}

/// Payload of a pen layer: completed paths plus stroke paint.
///
/// An in-progress path being clicked out lives in the tool controller, not
/// here; it only lands on the layer once finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenLayer {
    pub paths: Vec<PenPath>,
    pub stroke_color: Color,
    pub stroke_width: f64,
}

impl Default for PenLayer {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            stroke_color: Color::BLACK,
            stroke_width: 2.0,
        }
    }
}

impl PenLayer {
    pub fn push_path(&mut self, path: PenPath) {
        self.paths.push(path);
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Bounding box over anchors and their control handles.
    pub fn content_bounds(&self) -> Option<Rect> {
        bounds_of_points(self.paths.iter().flat_map(|path| {
            path.anchors.iter().flat_map(|a| {
                [Some(a.point), a.handle_in, a.handle_out]
                    .into_iter()
                    .flatten()
            })
        }))
    }
}
