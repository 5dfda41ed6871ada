//! Freehand drawing layer payload.

use super::{Color, bounds_of_points};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Stroke cap options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

/// Stroke join options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

/// One freehand stroke: a polyline of canvas-local points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingLine {
    pub points: Vec<Point>,
    pub color: Color,
    pub width: f64,
    /// Curve smoothing factor for the renderer, `0.0` = straight segments.
    #[serde(default)]
    pub tension: f64,
    #[serde(default)]
    pub cap: LineCap,
    #[serde(default)]
    pub join: LineJoin,
}

impl DrawingLine {
    pub fn new(points: Vec<Point>, color: Color, width: f64) -> Self {
        Self {
            points,
            color,
            width,
            tension: 0.5,
            cap: LineCap::Round,
            join: LineJoin::Round,
        }
    }

    /// Drop redundant points with Ramer-Douglas-Peucker. A tolerance of
    /// zero or a line of fewer than three points is left unchanged.
    pub fn simplify(&mut self, tolerance: f64) {
        if tolerance <= 0.0 || self.points.len() < 3 {
            return;
        }
        self.points = rdp_simplify(&self.points, tolerance);
    }
}

/// Payload of a drawing layer: an ordered list of strokes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DrawingLayer {
    pub lines: Vec<DrawingLine>,
}

impl DrawingLayer {
    pub fn push_line(&mut self, line: DrawingLine) {
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Bounding box over every stroke point.
    pub fn content_bounds(&self) -> Option<Rect> {
        bounds_of_points(self.lines.iter().flat_map(|l| l.points.iter().copied()))
    }
}

/// Ramer-Douglas-Peucker polyline simplification.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;
    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);
        // The junction point appears in both halves.
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;

    let line_len_sq = dx * dx + dy * dy;
    if line_len_sq < f64::EPSILON {
        let px = point.x - line_start.x;
        let py = point.y - line_start.y;
        return (px * px + py * py).sqrt();
    }

    let area2 = ((point.x - line_start.x) * dy - (point.y - line_start.y) * dx).abs();
    area2 / line_len_sq.sqrt()
}
