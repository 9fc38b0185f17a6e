//! Canvas geometry and source compositing.
//!
//! # Transform Order
//!
//! When rendering, transforms are applied in this order:
//! 1. Logical bounding box (quarter turns swap width and height)
//! 2. Scale-to-fit against the maximum width (never upscales)
//! 3. Compositing: rotate, mirror in the rotated frame, scale, draw centred
//! 4. Masking (see [`crate::mask`])
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = clockwise on screen
//! - Pixel centres sit at `i + 0.5`
//! - Origin is the top-left corner

mod bounds;
mod composite;

pub use bounds::{compute_layout, fit_to_width, logical_bounds, CanvasLayout};
pub use composite::{composite, DrawTransform};
