//! Vector shape layer payload.

use super::Color;
use serde::{Deserialize, Serialize};

/// Closed set of vector shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Rectangle,
    Circle,
    Triangle,
    Star,
    Arrow,
    Hexagon,
}

impl ShapeType {
    /// Human-readable label for layer names and UI.
    pub fn label(&self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Circle => "circle",
            ShapeType::Triangle => "triangle",
            ShapeType::Star => "star",
            ShapeType::Arrow => "arrow",
            ShapeType::Hexagon => "hexagon",
        }
    }

    pub fn all() -> &'static [ShapeType] {
        &[
            ShapeType::Rectangle,
            ShapeType::Circle,
            ShapeType::Triangle,
            ShapeType::Star,
            ShapeType::Arrow,
            ShapeType::Hexagon,
        ]
    }
}

/// Payload of a vector shape layer. Geometry is derived from the layer's
/// base transform; the payload carries the kind and paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeLayer {
    pub shape_type: ShapeType,
    pub fill: Color,
    pub stroke_color: Color,
    pub stroke_width: f64,
}

impl Default for ShapeLayer {
    fn default() -> Self {
        Self {
            shape_type: ShapeType::Rectangle,
            fill: Color::rgba(255, 255, 255, 0),
            stroke_color: Color::BLACK,
            stroke_width: 2.0,
        }
    }
}

impl ShapeLayer {
    pub fn new(shape_type: ShapeType, fill: Color, stroke_color: Color, stroke_width: f64) -> Self {
        Self {
            shape_type,
            fill,
            stroke_color,
            stroke_width,
        }
    }
}
