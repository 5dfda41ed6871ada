//! Image layer payload.

use serde::{Deserialize, Serialize};

/// Reference to bitmap data: a URL or a `data:` URI.
///
/// The core never decodes pixels; references are handed to the rendering
/// and AI collaborators opaquely.
pub type ImageRef = String;

/// Largest dimension an inserted image is scaled down to.
pub const MAX_IMAGE_DIMENSION: f64 = 800.0;

/// Optional per-image filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFilters {
    /// Brightness multiplier, `1.0` = unchanged.
    pub brightness: f64,
    /// Contrast multiplier, `1.0` = unchanged.
    pub contrast: f64,
    /// Blur radius in canvas units, `0.0` = none.
    pub blur: f64,
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            blur: 0.0,
        }
    }
}

/// Payload of an image layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLayer {
    /// Current bitmap reference.
    pub src: ImageRef,
    /// Bitmap as it was before the first AI edit, for revert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_src: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<ImageFilters>,
}

impl ImageLayer {
    pub fn new(src: ImageRef) -> Self {
        Self {
            src,
            original_src: None,
            filters: None,
        }
    }

    /// Swap in an edited bitmap, keeping the first original for revert.
    pub fn replace_src(&mut self, src: ImageRef) {
        if self.original_src.is_none() {
            self.original_src = Some(std::mem::take(&mut self.src));
        }
        self.src = src;
    }
}

/// Scale `(width, height)` down so the larger dimension equals
/// `max_dimension`, preserving aspect ratio. Dimensions already within the
/// limit are returned unchanged.
pub fn fit_within(width: f64, height: f64, max_dimension: f64) -> (f64, f64) {
    let largest = width.max(height);
    if largest <= max_dimension || largest <= 0.0 {
        return (width, height);
    }
    let scale = max_dimension / largest;
    (width * scale, height * scale)
}
