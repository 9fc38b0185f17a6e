//! Mask application.
//!
//! Equivalent to filling the mask shape with a `destination-in` composite
//! operation: each pixel's alpha is multiplied by the shape's coverage and
//! colour is left untouched.

use super::CropMask;
use crate::decode::DecodedImage;

/// Apply `mask` to an RGBA canvas in place.
///
/// # Arguments
/// * `image` - Canvas produced by the compositing stage
/// * `mask` - Resolved mask, or `None` to leave the canvas untouched
///
/// # Behavior
/// - `None` is a no-op
/// - Degenerate masks (zero radius or extent) clear every pixel's alpha
/// - Pixels fully inside keep their alpha exactly
pub fn apply_mask(image: &mut DecodedImage, mask: Option<&CropMask>) {
    let Some(mask) = mask else {
        return;
    };

    if mask.is_degenerate() {
        for px in image.pixels.chunks_exact_mut(4) {
            px[3] = 0;
        }
        return;
    }

    let width = image.width as usize;
    for (idx, px) in image.pixels.chunks_exact_mut(4).enumerate() {
        let x = (idx % width) as f64 + 0.5;
        let y = (idx / width) as f64 + 0.5;

        let coverage = mask.coverage(x, y);
        if coverage >= 1.0 {
            continue;
        }
        px[3] = (px[3] as f64 * coverage).round() as u8;
    }
}
