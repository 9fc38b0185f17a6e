//! The render pipeline: source raster + settings -> output artifact.
//!
//! Every render is independent. The same source and settings always produce
//! the same artifact, and a failure never yields partial output.

use thiserror::Error;

use crate::decode::{decode_image_with_limits, DecodeError, DecodeLimits, DecodedImage};
use crate::encode::{encode_rgba, to_data_uri, EncodeError};
use crate::mask::{apply_mask, CropMask};
use crate::settings::Settings;
use crate::transform::{composite, compute_layout, DrawTransform};

/// The originally loaded image. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRaster {
    /// File name as supplied by the user or URL
    pub name: String,
    /// Size of the encoded source in bytes
    pub byte_size: u64,
    /// Decoded, orientation-corrected pixels
    pub image: DecodedImage,
}

impl SourceRaster {
    /// Decode `bytes` into a source raster.
    pub fn decode(
        bytes: &[u8],
        name: impl Into<String>,
        limits: &DecodeLimits,
    ) -> Result<Self, DecodeError> {
        let image = decode_image_with_limits(bytes, limits)?;
        Ok(Self {
            name: name.into(),
            byte_size: bytes.len() as u64,
            image,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }
}

/// An encoded render result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    /// `data:<mime>;base64,<payload>`
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
    /// Length of `data_uri` in characters
    pub size: usize,
    /// Display name
    pub name: String,
    /// Byte size of the source this artifact was derived from
    pub original_size: u64,
}

impl OutputArtifact {
    /// Build an artifact around an already encoded data URI.
    pub fn from_data_uri(
        data_uri: String,
        width: u32,
        height: u32,
        name: impl Into<String>,
        original_size: u64,
    ) -> Self {
        Self {
            size: data_uri.len(),
            data_uri,
            width,
            height,
            name: name.into(),
            original_size,
        }
    }

    /// MIME type declared in the data URI header.
    pub fn mime_type(&self) -> Option<&str> {
        crate::encode::split_data_uri(&self.data_uri).0
    }
}

/// Errors produced by [`render`] and [`render_bytes`].
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The encoder cannot produce the configured output format
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Encode(EncodeError),
}

impl From<EncodeError> for RenderError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::UnsupportedFormat(format) => RenderError::UnsupportedFormat(format),
            other => RenderError::Encode(other),
        }
    }
}

/// Render `source` with `settings` into an encoded artifact.
///
/// # Steps
///
/// 1. Logical bounding box from the normalized rotation
/// 2. Scale to fit `max_width` (never upscales)
/// 3. Composite onto a transparent canvas with rotation and mirroring
/// 4. Apply the crop mask, if any
/// 5. Encode and wrap in a data URI
pub fn render(source: &SourceRaster, settings: &Settings) -> Result<OutputArtifact, RenderError> {
    let layout = compute_layout(
        source.width(),
        source.height(),
        settings.rotation,
        settings.max_width,
    );

    let transform = DrawTransform {
        rotation_degrees: settings.rotation,
        flip_h: settings.flip_h,
        flip_v: settings.flip_v,
    };
    let mut canvas = composite(&source.image, &layout, transform);

    let mask = CropMask::from_settings(settings, canvas.width, canvas.height);
    apply_mask(&mut canvas, mask.as_ref());

    let format = settings.output_format;
    let bytes = encode_rgba(
        &canvas.pixels,
        canvas.width,
        canvas.height,
        format,
        settings.encoder_quality(),
    )?;
    let data_uri = to_data_uri(format.mime_type(), &bytes);

    log::debug!(
        "rendered {} ({}x{} -> {}x{}, rotation {}, {}) into {} chars",
        source.name,
        source.width(),
        source.height(),
        canvas.width,
        canvas.height,
        settings.rotation,
        format.mime_type(),
        data_uri.len()
    );

    Ok(OutputArtifact::from_data_uri(
        data_uri,
        canvas.width,
        canvas.height,
        source.name.clone(),
        source.byte_size,
    ))
}

/// Decode `bytes` with default limits and render them.
pub fn render_bytes(
    bytes: &[u8],
    name: &str,
    settings: &Settings,
) -> Result<OutputArtifact, RenderError> {
    let source = SourceRaster::decode(bytes, name, &DecodeLimits::default())?;
    render(&source, settings)
}
