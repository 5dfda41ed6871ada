//! Text layer payload.

use super::Color;
use serde::{Deserialize, Serialize};

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Bold,
}

/// Font style options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Payload of a text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub content: String,
    pub font_family: String,
    /// Font size in canvas units.
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub fill: Color,
    pub align: TextAlign,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
}

impl Default for TextLayer {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_family: "Inter".to_string(),
            font_size: 24.0,
            font_weight: FontWeight::Regular,
            font_style: FontStyle::Normal,
            fill: Color::BLACK,
            align: TextAlign::Left,
            line_height: 1.2,
        }
    }
}

impl TextLayer {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Number of lines the content wraps to at explicit newlines.
    pub fn line_count(&self) -> usize {
        if self.content.is_empty() {
            1
        } else {
            self.content.lines().count().max(1)
        }
    }
}
