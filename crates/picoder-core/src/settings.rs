//! Edit settings: the complete value object fed to the render pipeline.
//!
//! Settings are always a complete record. UI changes arrive as a
//! [`SettingsPatch`] which is merged into the previous record, so no field
//! is ever left undefined.

use serde::{Deserialize, Serialize};

use crate::encode::EncodeError;

/// Lower bound for [`Settings::mask_zoom`].
pub const MIN_MASK_ZOOM: f32 = 0.2;
/// Upper bound for [`Settings::mask_zoom`].
pub const MAX_MASK_ZOOM: f32 = 3.0;

/// Raster format of the exported artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "image/webp")]
    Webp,
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

impl OutputFormat {
    /// MIME type used in the data URI.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Webp => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Parse a MIME type string.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::UnsupportedFormat` for anything outside the
    /// closed set of output formats.
    pub fn from_mime(mime: &str) -> Result<Self, EncodeError> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/webp" => Ok(OutputFormat::Webp),
            "image/jpeg" | "image/jpg" => Ok(OutputFormat::Jpeg),
            "image/png" => Ok(OutputFormat::Png),
            other => Err(EncodeError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Crop mask applied after compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskShape {
    /// No masking; the full canvas is kept.
    #[default]
    None,
    /// Circle with diameter `min(width, height) * mask_zoom`.
    Circle,
    /// Rounded rectangle with corner radius driven by `border_radius`.
    Rounded,
}

/// Add `delta` degrees to `rotation`. Near the ends of the `i32` range the
/// angle is reduced mod 360 first so the result keeps its direction.
fn quarter_turn(rotation: i32, delta: i32) -> i32 {
    rotation
        .checked_add(delta)
        .unwrap_or_else(|| rotation.rem_euclid(360) + delta)
}

/// Complete set of edit settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Encoder quality (0.0 to 1.0). Only JPEG uses it; WebP output is
    /// always lossless and PNG has no quality knob.
    pub quality: f32,
    /// Upper bound on output width in pixels
    pub max_width: u32,
    /// Output encoding
    pub output_format: OutputFormat,
    /// Cumulative rotation in degrees, never normalized
    pub rotation: i32,
    /// Horizontal mirror
    pub flip_h: bool,
    /// Vertical mirror
    pub flip_v: bool,
    /// Crop mask shape
    pub mask: MaskShape,
    /// Corner radius (0 to 100, percentage of half the shorter side)
    pub border_radius: f32,
    /// Mask scale (0.2 to 3.0)
    pub mask_zoom: f32,
    /// Horizontal mask offset in output pixels
    pub mask_x: f32,
    /// Vertical mask offset in output pixels
    pub mask_y: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: 0.8,
            max_width: 800,
            output_format: OutputFormat::Webp,
            rotation: 0,
            flip_h: false,
            flip_v: false,
            mask: MaskShape::None,
            border_radius: 20.0,
            mask_zoom: 1.0,
            mask_x: 0.0,
            mask_y: 0.0,
        }
    }
}

impl Settings {
    /// Create settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial update into a copy of these settings.
    ///
    /// Fields absent from `patch` keep their current value. The result is
    /// normalized so every field stays inside its documented range.
    pub fn merge(&self, patch: &SettingsPatch) -> Self {
        Self {
            quality: patch.quality.unwrap_or(self.quality),
            max_width: patch.max_width.unwrap_or(self.max_width),
            output_format: patch.output_format.unwrap_or(self.output_format),
            rotation: patch.rotation.unwrap_or(self.rotation),
            flip_h: patch.flip_h.unwrap_or(self.flip_h),
            flip_v: patch.flip_v.unwrap_or(self.flip_v),
            mask: patch.mask.unwrap_or(self.mask),
            border_radius: patch.border_radius.unwrap_or(self.border_radius),
            mask_zoom: patch.mask_zoom.unwrap_or(self.mask_zoom),
            mask_x: patch.mask_x.unwrap_or(self.mask_x),
            mask_y: patch.mask_y.unwrap_or(self.mask_y),
        }
        .normalized()
    }

    /// Clamp every field to its valid range.
    ///
    /// Rotation is intentionally left untouched: it accumulates freely and is
    /// only reduced modulo 360 inside the transform.
    pub fn normalized(mut self) -> Self {
        self.quality = finite_or(self.quality, 0.8).clamp(0.0, 1.0);
        self.max_width = self.max_width.max(1);
        self.border_radius = finite_or(self.border_radius, 0.0).clamp(0.0, 100.0);
        self.mask_zoom = finite_or(self.mask_zoom, 1.0).clamp(MIN_MASK_ZOOM, MAX_MASK_ZOOM);
        self.mask_x = finite_or(self.mask_x, 0.0);
        self.mask_y = finite_or(self.mask_y, 0.0);
        self
    }

    /// Settings rotated a quarter turn counter-clockwise.
    pub fn rotated_left(&self) -> Self {
        Self {
            rotation: quarter_turn(self.rotation, -90),
            ..self.clone()
        }
    }

    /// Settings rotated a quarter turn clockwise.
    pub fn rotated_right(&self) -> Self {
        Self {
            rotation: quarter_turn(self.rotation, 90),
            ..self.clone()
        }
    }

    pub fn toggle_flip_h(&self) -> Self {
        Self {
            flip_h: !self.flip_h,
            ..self.clone()
        }
    }

    pub fn toggle_flip_v(&self) -> Self {
        Self {
            flip_v: !self.flip_v,
            ..self.clone()
        }
    }

    /// Rotation reduced to `[0, 360)`.
    #[inline]
    pub fn normalized_rotation(&self) -> i32 {
        self.rotation.rem_euclid(360)
    }

    /// JPEG quality on the encoder's 1-100 scale.
    pub fn encoder_quality(&self) -> u8 {
        (self.quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Partial settings update coming from the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub quality: Option<f32>,
    pub max_width: Option<u32>,
    pub output_format: Option<OutputFormat>,
    pub rotation: Option<i32>,
    pub flip_h: Option<bool>,
    pub flip_v: Option<bool>,
    pub mask: Option<MaskShape>,
    pub border_radius: Option<f32>,
    pub mask_zoom: Option<f32>,
    pub mask_x: Option<f32>,
    pub mask_y: Option<f32>,
}

impl SettingsPatch {
    /// Patch that changes only the mask shape.
    pub fn mask(mask: MaskShape) -> Self {
        Self {
            mask: Some(mask),
            ..Default::default()
        }
    }

    /// Patch that moves the mask by an absolute offset.
    pub fn mask_offset(x: f32, y: f32) -> Self {
        Self {
            mask_x: Some(x),
            mask_y: Some(y),
            ..Default::default()
        }
    }

    /// Check if the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
