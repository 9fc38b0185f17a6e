//! Mask geometry in output pixel space.
//!
//! Shapes are evaluated through a signed distance function: negative inside,
//! positive outside. Coverage of a pixel is `clamp(0.5 - distance, 0, 1)`,
//! which gives a one pixel anti-aliased edge.

use crate::settings::{MaskShape, Settings};

/// Resolved crop mask for a concrete canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropMask {
    /// Circle around `(center_x, center_y)`.
    Circle {
        center_x: f64,
        center_y: f64,
        radius: f64,
    },
    /// Rectangle of `width` x `height` centred on `(center_x, center_y)`
    /// with rounded corners.
    RoundedRect {
        center_x: f64,
        center_y: f64,
        width: f64,
        height: f64,
        corner_radius: f64,
    },
}

impl CropMask {
    /// Resolve the mask described by `settings` for a canvas of
    /// `width` x `height` pixels.
    ///
    /// Returns `None` when no mask is configured.
    pub fn from_settings(settings: &Settings, width: u32, height: u32) -> Option<Self> {
        let (w, h) = (width as f64, height as f64);
        let zoom = settings.mask_zoom as f64;
        let center_x = w / 2.0 + settings.mask_x as f64;
        let center_y = h / 2.0 + settings.mask_y as f64;

        match settings.mask {
            MaskShape::None => None,
            MaskShape::Circle => {
                let base = w.min(h) * zoom;
                Some(CropMask::Circle {
                    center_x,
                    center_y,
                    radius: (base / 2.0).max(0.0),
                })
            }
            MaskShape::Rounded => {
                let mask_w = w * zoom;
                let mask_h = h * zoom;
                let corner_radius = mask_w.min(mask_h) * (settings.border_radius as f64 / 200.0);
                Some(CropMask::RoundedRect {
                    center_x,
                    center_y,
                    width: mask_w,
                    height: mask_h,
                    corner_radius: corner_radius.max(0.0),
                })
            }
        }
    }

    /// Whether the shape has no interior at all.
    pub fn is_degenerate(&self) -> bool {
        match *self {
            CropMask::Circle { radius, .. } => radius.is_nan() || radius <= 0.0,
            CropMask::RoundedRect { width, height, .. } => {
                width.is_nan() || height.is_nan() || width <= 0.0 || height <= 0.0
            }
        }
    }

    /// Signed distance from `(x, y)` to the shape boundary.
    pub fn signed_distance(&self, x: f64, y: f64) -> f64 {
        match *self {
            CropMask::Circle {
                center_x,
                center_y,
                radius,
            } => (x - center_x).hypot(y - center_y) - radius,
            CropMask::RoundedRect {
                center_x,
                center_y,
                width,
                height,
                corner_radius,
            } => {
                let half_w = width / 2.0;
                let half_h = height / 2.0;
                let r = corner_radius.min(half_w).min(half_h).max(0.0);

                let qx = (x - center_x).abs() - (half_w - r);
                let qy = (y - center_y).abs() - (half_h - r);
                let outside = qx.max(0.0).hypot(qy.max(0.0));
                let inside = qx.max(qy).min(0.0);
                outside + inside - r
            }
        }
    }

    /// Fraction of the pixel centred at `(x, y)` covered by the shape (0.0 to 1.0).
    #[inline]
    pub fn coverage(&self, x: f64, y: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        (0.5 - self.signed_distance(x, y)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(mask: MaskShape) -> Settings {
        Settings {
            mask,
            ..Settings::default()
        }
    }

    #[test]
    fn test_none_resolves_to_no_mask() {
        assert!(CropMask::from_settings(&Settings::default(), 100, 100).is_none());
    }

    #[test]
    fn test_circle_geometry() {
        let mut s = settings_with(MaskShape::Circle);
        s.mask_zoom = 1.5;
        s.mask_x = 10.0;
        s.mask_y = -5.0;

        let mask = CropMask::from_settings(&s, 200, 100).unwrap();
        assert_eq!(
            mask,
            CropMask::Circle {
                center_x: 110.0,
                center_y: 45.0,
                radius: 75.0,
            }
        );
    }

    #[test]
    fn test_rounded_geometry() {
        let mut s = settings_with(MaskShape::Rounded);
        s.border_radius = 50.0;

        let mask = CropMask::from_settings(&s, 200, 100).unwrap();
        assert_eq!(
            mask,
            CropMask::RoundedRect {
                center_x: 100.0,
                center_y: 50.0,
                width: 200.0,
                height: 100.0,
                corner_radius: 25.0,
            }
        );
    }

    #[test]
    fn test_full_radius_is_pill_shaped() {
        let mut s = settings_with(MaskShape::Rounded);
        s.border_radius = 100.0;
        let mask = CropMask::from_settings(&s, 100, 100).unwrap();

        // Square canvas with full radius is a circle
        assert!(mask.coverage(50.0, 50.0) > 0.99);
        assert_eq!(mask.coverage(2.0, 2.0), 0.0);
        assert!(mask.coverage(50.0, 1.0) > 0.99);
    }

    #[test]
    fn test_circle_coverage() {
        let mask = CropMask::Circle {
            center_x: 50.0,
            center_y: 50.0,
            radius: 10.0,
        };
        assert_eq!(mask.coverage(50.0, 50.0), 1.0);
        assert_eq!(mask.coverage(0.5, 0.5), 0.0);
        // On the boundary the pixel is half covered
        assert!((mask.coverage(60.0, 50.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_square_corners_without_radius() {
        let mask = CropMask::RoundedRect {
            center_x: 5.0,
            center_y: 5.0,
            width: 10.0,
            height: 10.0,
            corner_radius: 0.0,
        };
        assert_eq!(mask.coverage(0.5, 0.5), 1.0);
        assert_eq!(mask.coverage(9.5, 9.5), 1.0);
        assert_eq!(mask.coverage(11.0, 5.0), 0.0);
    }

    #[test]
    fn test_degenerate_masks_cover_nothing() {
        let circle = CropMask::Circle {
            center_x: 0.0,
            center_y: 0.0,
            radius: 0.0,
        };
        assert!(circle.is_degenerate());
        assert_eq!(circle.coverage(0.0, 0.0), 0.0);

        let rect = CropMask::RoundedRect {
            center_x: 0.0,
            center_y: 0.0,
            width: -4.0,
            height: 10.0,
            corner_radius: 2.0,
        };
        assert!(rect.is_degenerate());
        assert_eq!(rect.coverage(0.0, 0.0), 0.0);

        let nan = CropMask::Circle {
            center_x: 0.0,
            center_y: 0.0,
            radius: f64::NAN,
        };
        assert!(nan.is_degenerate());
    }
}
