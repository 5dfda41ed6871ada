//! Numbered marker layer payload.

use super::Color;
use serde::{Deserialize, Serialize};

/// Side length of the square marker badge in canvas units.
pub const MARKER_SIZE: f64 = 32.0;

/// Payload of a marker layer: a sequential badge pinned to a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerLayer {
    /// Sequential label, assigned by the store and never reused within a
    /// session.
    pub label: u32,
    pub color: Color,
}

impl Default for MarkerLayer {
    fn default() -> Self {
        Self {
            label: 1,
            color: Color::rgb(255, 59, 48),
        }
    }
}

impl MarkerLayer {
    pub fn new(label: u32, color: Color) -> Self {
        Self { label, color }
    }
}
