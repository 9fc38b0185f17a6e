//! Drawing the source onto the output canvas.
//!
//! The canvas is produced by inverse mapping: for each output pixel we find
//! the source position that lands there and sample it bilinearly.
//!
//! The forward transform matches a 2D canvas context that is translated to
//! the canvas centre, rotated, then mirrored in the rotated frame:
//!
//! ```text
//! canvas = centre + R(θ) · F · (scale · local)
//! ```
//!
//! so the inverse applied per output pixel is
//!
//! ```text
//! local = F · R(-θ) · (canvas - centre) / scale
//! ```
//!
//! `F` is its own inverse, so mirroring commutes out of the inversion.

use std::borrow::Cow;

use image::imageops::{self, FilterType};

use super::CanvasLayout;
use crate::decode::DecodedImage;

/// Rotation and mirroring applied while drawing the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawTransform {
    /// Rotation in degrees, positive = clockwise on screen.
    pub rotation_degrees: i32,
    /// Mirror along the image's local X axis.
    pub flip_h: bool,
    /// Mirror along the image's local Y axis.
    pub flip_v: bool,
}

/// Draw `source` onto a transparent canvas described by `layout`.
///
/// The source is centred, rotated, mirrored and scaled uniformly by
/// `layout.scale`. Canvas pixels that the source does not cover stay fully
/// transparent.
pub fn composite(source: &DecodedImage, layout: &CanvasLayout, transform: DrawTransform) -> DecodedImage {
    let mut canvas = DecodedImage::transparent(layout.width, layout.height);
    if source.is_empty() || canvas.is_empty() {
        return canvas;
    }

    let draw_w = source.width as f64 * layout.scale;
    let draw_h = source.height as f64 * layout.scale;

    // Shrinking with a point sampler aliases badly, so pre-filter the source
    // down to (roughly) its drawn size and sample that instead.
    let (sampled, factor_x, factor_y) = match prefilter(source, draw_w, draw_h) {
        Some(resized) => {
            let fx = resized.width as f64 / draw_w;
            let fy = resized.height as f64 / draw_h;
            (Cow::Owned(resized), fx, fy)
        }
        None => (Cow::Borrowed(source), 1.0 / layout.scale, 1.0 / layout.scale),
    };

    let (sin, cos) = sin_cos_degrees(transform.rotation_degrees);
    let mirror_x = if transform.flip_h { -1.0 } else { 1.0 };
    let mirror_y = if transform.flip_v { -1.0 } else { 1.0 };

    let cx = layout.width as f64 / 2.0;
    let cy = layout.height as f64 / 2.0;
    let src_cx = sampled.width as f64 / 2.0;
    let src_cy = sampled.height as f64 / 2.0;

    for y in 0..layout.height {
        let dy = y as f64 + 0.5 - cy;
        for x in 0..layout.width {
            let dx = x as f64 + 0.5 - cx;

            // Undo the rotation, then the mirror
            let local_x = (dx * cos + dy * sin) * mirror_x;
            let local_y = (-dx * sin + dy * cos) * mirror_y;

            let src_x = local_x * factor_x + src_cx;
            let src_y = local_y * factor_y + src_cy;

            let pixel = sample_bilinear(&sampled, src_x, src_y);
            let idx = ((y as usize) * (layout.width as usize) + x as usize) * 4;
            canvas.pixels[idx..idx + 4].copy_from_slice(&pixel);
        }
    }

    canvas
}

/// Resize the source to its drawn size when it is drawn smaller.
fn prefilter(source: &DecodedImage, draw_w: f64, draw_h: f64) -> Option<DecodedImage> {
    let target_w = (draw_w.round() as u32).max(1);
    let target_h = (draw_h.round() as u32).max(1);
    if target_w >= source.width && target_h >= source.height {
        return None;
    }

    let rgba = source.to_rgba_image()?;
    let resized = imageops::resize(&rgba, target_w, target_h, FilterType::Triangle);
    Some(DecodedImage::from_rgba_image(resized))
}

/// Sine and cosine of an integer angle, exact for quarter turns.
fn sin_cos_degrees(degrees: i32) -> (f64, f64) {
    match degrees.rem_euclid(360) {
        0 => (0.0, 1.0),
        90 => (1.0, 0.0),
        180 => (0.0, -1.0),
        270 => (-1.0, 0.0),
        other => (other as f64).to_radians().sin_cos(),
    }
}

/// Sample an RGBA pixel at continuous coordinates (pixel centres at `i + 0.5`).
///
/// Positions outside the image return transparent black. Interpolation is
/// done on premultiplied values so transparent neighbours do not bleed
/// their colour.
fn sample_bilinear(image: &DecodedImage, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (image.width as f64, image.height as f64);
    if !(0.0..=w).contains(&x) || !(0.0..=h).contains(&y) {
        return [0, 0, 0, 0];
    }

    let fx = x - 0.5;
    let fy = y - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;

    let max_x = image.width as i64 - 1;
    let max_y = image.height as i64 - 1;
    let xa = (x0 as i64).clamp(0, max_x) as u32;
    let xb = (x0 as i64 + 1).clamp(0, max_x) as u32;
    let ya = (y0 as i64).clamp(0, max_y) as u32;
    let yb = (y0 as i64 + 1).clamp(0, max_y) as u32;

    let taps = [
        (image.pixel(xa, ya), (1.0 - tx) * (1.0 - ty)),
        (image.pixel(xb, ya), tx * (1.0 - ty)),
        (image.pixel(xa, yb), (1.0 - tx) * ty),
        (image.pixel(xb, yb), tx * ty),
    ];

    let mut alpha = 0.0;
    let mut color = [0.0f64; 3];
    for (p, weight) in taps {
        let a = p[3] as f64 * weight;
        alpha += a;
        for c in 0..3 {
            color[c] += p[c] as f64 * a;
        }
    }

    if alpha <= f64::EPSILON {
        return [0, 0, 0, 0];
    }

    [
        (color[0] / alpha).round().clamp(0.0, 255.0) as u8,
        (color[1] / alpha).round().clamp(0.0, 255.0) as u8,
        (color[2] / alpha).round().clamp(0.0, 255.0) as u8,
        alpha.round().clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::compute_layout;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];

    /// Distinct opaque colour per pixel.
    fn test_image(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 40) as u8, (y * 40) as u8, 7, 255]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    fn red_green() -> DecodedImage {
        DecodedImage::new(2, 1, [RED, GREEN].concat())
    }

    fn draw(image: &DecodedImage, rotation: i32, flip_h: bool, flip_v: bool) -> DecodedImage {
        let layout = compute_layout(image.width, image.height, rotation, 10_000);
        composite(
            image,
            &layout,
            DrawTransform {
                rotation_degrees: rotation,
                flip_h,
                flip_v,
            },
        )
    }

    #[test]
    fn test_identity_is_exact() {
        let img = test_image(5, 3);
        assert_eq!(draw(&img, 0, false, false), img);
    }

    #[test]
    fn test_full_turns_are_identity() {
        let img = test_image(4, 3);
        assert_eq!(draw(&img, 360, false, false), img);
        assert_eq!(draw(&img, -720, false, false), img);
    }

    #[test]
    fn test_rotate_90_is_clockwise() {
        let result = draw(&red_green(), 90, false, false);
        assert_eq!((result.width, result.height), (1, 2));
        // Left edge moves to the top
        assert_eq!(result.pixel(0, 0), RED);
        assert_eq!(result.pixel(0, 1), GREEN);
    }

    #[test]
    fn test_rotate_270_is_counter_clockwise() {
        let result = draw(&red_green(), -90, false, false);
        assert_eq!((result.width, result.height), (1, 2));
        assert_eq!(result.pixel(0, 0), GREEN);
        assert_eq!(result.pixel(0, 1), RED);
    }

    #[test]
    fn test_rotate_180() {
        let result = draw(&red_green(), 180, false, false);
        assert_eq!(result.pixel(0, 0), GREEN);
        assert_eq!(result.pixel(1, 0), RED);
    }

    #[test]
    fn test_flip_horizontal() {
        let img = test_image(4, 2);
        let result = draw(&img, 0, true, false);
        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(result.pixel(x, y), img.pixel(3 - x, y));
            }
        }
    }

    #[test]
    fn test_flip_vertical() {
        let img = test_image(3, 4);
        let result = draw(&img, 0, false, true);
        assert_eq!(result.pixel(1, 0), img.pixel(1, 3));
        assert_eq!(result.pixel(2, 3), img.pixel(2, 0));
    }

    #[test]
    fn test_flip_is_applied_in_local_frame() {
        // Mirror first, then rotate: the mirrored right edge ends on top
        let result = draw(&red_green(), 90, true, false);
        assert_eq!(result.pixel(0, 0), GREEN);
        assert_eq!(result.pixel(0, 1), RED);
    }

    #[test]
    fn test_downscale_preserves_solid_color() {
        let img = DecodedImage::new(8, 4, [10, 20, 30, 255].repeat(32));
        let layout = compute_layout(8, 4, 0, 4);
        let result = composite(&img, &layout, DrawTransform::default());

        assert_eq!((result.width, result.height), (4, 2));
        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(result.pixel(x, y), [10, 20, 30, 255]);
            }
        }
    }

    #[test]
    fn test_rotated_downscale_covers_canvas() {
        let img = DecodedImage::new(16, 9, [50, 60, 70, 255].repeat(16 * 9));
        let layout = compute_layout(16, 9, 90, 8);
        let result = composite(
            &img,
            &layout,
            DrawTransform {
                rotation_degrees: 90,
                ..Default::default()
            },
        );

        assert_eq!((result.width, result.height), (8, 14));
        assert!(result.pixels.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_non_quarter_angle_clips_corners() {
        let img = DecodedImage::new(20, 20, [90, 90, 90, 255].repeat(400));
        let result = draw(&img, 45, false, false);

        assert_eq!((result.width, result.height), (20, 20));
        assert_eq!(result.pixel(0, 0)[3], 0);
        assert_eq!(result.pixel(10, 10)[3], 255);
    }

    #[test]
    fn test_transparent_neighbours_do_not_bleed() {
        let img = DecodedImage::new(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 0]);
        let sample = sample_bilinear(&img, 1.0, 0.5);
        assert_eq!(&sample[..3], &[255, 0, 0]);
        assert!(sample[3] > 100 && sample[3] < 150);
    }

    #[test]
    fn test_sample_outside_is_transparent() {
        let img = test_image(2, 2);
        assert_eq!(sample_bilinear(&img, -0.1, 1.0), [0, 0, 0, 0]);
        assert_eq!(sample_bilinear(&img, 1.0, 2.1), [0, 0, 0, 0]);
    }

    #[test]
    fn test_quarter_turn_sin_cos_exact() {
        assert_eq!(sin_cos_degrees(90), (1.0, 0.0));
        assert_eq!(sin_cos_degrees(-90), (-1.0, 0.0));
        assert_eq!(sin_cos_degrees(540), (0.0, -1.0));
    }

    #[test]
    fn test_empty_source_gives_transparent_canvas() {
        let layout = compute_layout(0, 0, 0, 800);
        let result = composite(&DecodedImage::new(0, 0, vec![]), &layout, DrawTransform::default());
        assert!(result.is_empty());
    }
}
