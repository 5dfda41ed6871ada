//! Mask layer payload and stroke rasterization.
//!
//! A mask is a black/white paint program: strokes marked [`MaskTone::White`]
//! select area, [`MaskTone::Black`] deselects it again. The same stroke
//! shape backs the erase tool, which rasterizes its overlay strokes into a
//! PNG mask for the inpaint collaborator.

use super::image::ImageRef;
use super::{LayerId, bounds_of_points};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Paint tone of a mask stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskTone {
    /// Painted area counts as selected.
    #[default]
    White,
    /// Painted area is carved back out.
    Black,
}

/// One mask stroke: a polyline of canvas-local points with a brush width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskStroke {
    pub points: Vec<Point>,
    pub width: f64,
    #[serde(default)]
    pub tone: MaskTone,
}

impl MaskStroke {
    pub fn new(points: Vec<Point>, width: f64) -> Self {
        Self {
            points,
            width,
            tone: MaskTone::White,
        }
    }
}

/// Payload of a mask layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaskLayer {
    pub strokes: Vec<MaskStroke>,
    /// Layer this mask applies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<LayerId>,
}

impl MaskLayer {
    pub fn push_stroke(&mut self, stroke: MaskStroke) {
        self.strokes.push(stroke);
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn content_bounds(&self) -> Option<Rect> {
        bounds_of_points(self.strokes.iter().flat_map(|s| s.points.iter().copied()))
    }
}

/// Rasterization failure.
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("mask raster has zero area")]
    ZeroArea,
    #[error("png encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Rasterize strokes into an 8-bit grayscale buffer of `width * height`
/// pixels, black background. Stroke coordinates are clamped to the raster.
pub fn rasterize_mask(strokes: &[MaskStroke], width: u32, height: u32) -> Vec<u8> {
    let mut pixels = vec![0u8; (width as usize) * (height as usize)];
    if pixels.is_empty() {
        return pixels;
    }
    for stroke in strokes {
        let value = match stroke.tone {
            MaskTone::White => 255u8,
            MaskTone::Black => 0u8,
        };
        let radius = (stroke.width / 2.0).max(0.5);
        match stroke.points.len() {
            0 => {}
            1 => stamp(&mut pixels, width, height, stroke.points[0], radius, value),
            _ => {
                for pair in stroke.points.windows(2) {
                    stamp_segment(&mut pixels, width, height, pair[0], pair[1], radius, value);
                }
            }
        }
    }
    pixels
}

/// Rasterize strokes and encode the result as a base64 PNG `data:` URI,
/// the mask format the inpaint collaborator consumes.
pub fn rasterize_mask_png(
    strokes: &[MaskStroke],
    width: u32,
    height: u32,
) -> Result<ImageRef, MaskError> {
    if width == 0 || height == 0 {
        return Err(MaskError::ZeroArea);
    }
    let pixels = rasterize_mask(strokes, width, height);

    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, width, height);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&pixels)?;
    }

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&buffer)))
}

fn stamp_segment(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    from: Point,
    to: Point,
    radius: f64,
    value: u8,
) {
    let length = (to - from).hypot();
    let step = (radius / 2.0).max(1.0);
    let count = (length / step).ceil() as usize;
    for i in 0..=count {
        let t = if count == 0 { 0.0 } else { i as f64 / count as f64 };
        stamp(pixels, width, height, from.lerp(to, t), radius, value);
    }
}

fn stamp(pixels: &mut [u8], width: u32, height: u32, center: Point, radius: f64, value: u8) {
    let r_sq = radius * radius;
    let x_min = ((center.x - radius).floor().max(0.0)) as u32;
    let y_min = ((center.y - radius).floor().max(0.0)) as u32;
    let x_max = ((center.x + radius).ceil().min(width as f64 - 1.0)).max(0.0) as u32;
    let y_max = ((center.y + radius).ceil().min(height as f64 - 1.0)).max(0.0) as u32;
    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let dx = x as f64 + 0.5 - center.x;
            let dy = y as f64 + 0.5 - center.y;
            if dx * dx + dy * dy <= r_sq {
                pixels[(y * width + x) as usize] = value;
            }
        }
    }
}
