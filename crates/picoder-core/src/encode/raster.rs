//! Raster encoding for export.
//!
//! This module encodes RGBA canvases with the `image` crate's encoders,
//! mirroring what `canvas.toDataURL(format, quality)` produces:
//!
//! * PNG keeps alpha and ignores quality
//! * JPEG has no alpha channel; transparent pixels are flattened onto black
//! * WebP is encoded losslessly (the only WebP encoder the `image` crate
//!   ships), so quality is ignored as well

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError};
use thiserror::Error;

use crate::settings::OutputFormat;

/// Errors that can occur while encoding or parsing encoded output.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The requested output encoding is not available
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// A data URI or base64 payload could not be parsed
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
}

/// Encode RGBA pixel data in the requested format.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `format` - Target format
/// * `quality` - JPEG quality (1-100); ignored by lossless formats
///
/// # Example
///
/// ```ignore
/// use picoder_core::encode::encode_rgba;
/// use picoder_core::OutputFormat;
///
/// let pixels = vec![128u8; 16 * 16 * 4];
/// let png = encode_rgba(&pixels, 16, 16, OutputFormat::Png, 90).unwrap();
/// assert_eq!(&png[1..4], b"PNG");
/// ```
pub fn encode_rgba(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 4;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::Png => {
            PngEncoder::new(&mut buffer).write_image(pixels, width, height, ExtendedColorType::Rgba8)
        }
        OutputFormat::Webp => WebPEncoder::new_lossless(&mut buffer).write_image(
            pixels,
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        OutputFormat::Jpeg => {
            let rgb = flatten_onto_black(pixels);
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)).write_image(
                &rgb,
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
    };

    result.map_err(|e| match e {
        ImageError::Unsupported(err) => {
            EncodeError::UnsupportedFormat(format!("{}: {}", format.mime_type(), err))
        }
        other => EncodeError::EncodingFailed(other.to_string()),
    })?;

    Ok(buffer.into_inner())
}

/// Drop the alpha channel the way a canvas does for opaque formats:
/// premultiply, i.e. composite over black.
fn flatten_onto_black(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = px[3] as u32;
        for &c in &px[..3] {
            rgb.push(((c as u32 * a + 127) / 255) as u8);
        }
    }
    rgb
}


// ============================================================================
// Property-Based Tests
// ============================================================================
