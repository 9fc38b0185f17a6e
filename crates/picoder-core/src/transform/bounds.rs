//! Output canvas geometry: rotated bounding box and scale-to-fit.

/// Size of the output canvas and how the source maps onto it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    /// Rotated silhouette width before scaling.
    pub logical_width: u32,
    /// Rotated silhouette height before scaling.
    pub logical_height: u32,
    /// Final canvas width.
    pub width: u32,
    /// Final canvas height.
    pub height: u32,
    /// Uniform factor applied to the source (`width / logical_width`).
    pub scale: f64,
}

/// Compute the logical bounding box for a quarter-turn based rotation.
///
/// Only rotations that reduce to 90° or 270° swap the dimensions. Any other
/// angle keeps the source box, even when it is not a multiple of 90.
///
/// # Example
///
/// ```
/// use picoder_core::transform::logical_bounds;
///
/// assert_eq!(logical_bounds(1600, 900, 90), (900, 1600));
/// assert_eq!(logical_bounds(1600, 900, -180), (1600, 900));
/// ```
pub fn logical_bounds(width: u32, height: u32, rotation_degrees: i32) -> (u32, u32) {
    match rotation_degrees.rem_euclid(360) {
        90 | 270 => (height, width),
        _ => (width, height),
    }
}

/// Shrink `(width, height)` so the width does not exceed `max_width`.
///
/// Never enlarges. The height is rounded to the nearest pixel and kept at
/// least 1.
pub fn fit_to_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scale = max_width as f64 / width as f64;
    let fitted_height = (height as f64 * scale).round() as u32;
    (max_width, fitted_height.max(1))
}

/// Compute the complete canvas layout for a source of `width` x `height`.
pub fn compute_layout(width: u32, height: u32, rotation_degrees: i32, max_width: u32) -> CanvasLayout {
    let (logical_width, logical_height) = logical_bounds(width, height, rotation_degrees);
    let (final_width, final_height) = fit_to_width(logical_width, logical_height, max_width.max(1));

    let scale = if logical_width == 0 {
        1.0
    } else {
        final_width as f64 / logical_width as f64
    };

    CanvasLayout {
        logical_width,
        logical_height,
        width: final_width,
        height: final_height,
        scale,
    }
}
