//! Source image decoding for PICoder.
//!
//! This module provides functionality for:
//! - Decoding any format the `image` crate recognizes (PNG, JPEG, WebP)
//! - Applying EXIF orientation so sources are upright
//! - Enforcing input size and pixel-count limits
//!
//! All decoded images are straight RGBA so later stages can carry
//! transparency from masks and source alpha.

mod raster;
mod types;

pub use raster::{decode_image, decode_image_with_limits, get_orientation, image_dimensions};
pub use types::{DecodeError, DecodeLimits, DecodedImage, Orientation};
