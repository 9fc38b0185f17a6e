//! Source image decoding with EXIF orientation handling.
//!
//! Browsers honour EXIF orientation when an `<img>` is drawn onto a canvas,
//! so decoded sources are returned already upright.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, DecodeLimits, DecodedImage, Orientation};

/// Decode any supported image format into upright RGBA pixels.
///
/// # Errors
///
/// Returns `DecodeError::Empty` for empty input, `DecodeError::InvalidFormat`
/// if the format cannot be recognized and `DecodeError::CorruptedFile` if the
/// data is damaged.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    decode_image_with_limits(bytes, &DecodeLimits::default())
}

/// Decode an image, rejecting inputs that exceed `limits`.
pub fn decode_image_with_limits(
    bytes: &[u8],
    limits: &DecodeLimits,
) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    if bytes.len() as u64 > limits.max_input_bytes {
        return Err(DecodeError::TooLarge {
            actual: bytes.len() as u64,
            limit: limits.max_input_bytes,
            unit: "bytes",
        });
    }

    let reader = guessed_reader(bytes)?;

    // Check the header before allocating the full pixel buffer
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    let pixels = width as u64 * height as u64;
    if pixels > limits.max_pixels {
        return Err(DecodeError::TooLarge {
            actual: pixels,
            limit: limits.max_pixels,
            unit: "pixels",
        });
    }

    let img = guessed_reader(bytes)?
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let orientation = extract_orientation(bytes);
    let oriented = apply_orientation(img, orientation);

    Ok(DecodedImage::from_rgba_image(oriented.into_rgba8()))
}

/// Read the pixel dimensions of an encoded image without decoding it.
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let (width, height) = guessed_reader(bytes)?
        .into_dimensions()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if extract_orientation(bytes).swaps_dimensions() {
        Ok((height, width))
    } else {
        Ok((width, height))
    }
}

fn guessed_reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }
    Ok(reader)
}

/// Extract EXIF orientation from image bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    extract_orientation(bytes)
}

fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
