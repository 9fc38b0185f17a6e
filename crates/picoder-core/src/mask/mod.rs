//! Crop masks applied to the composited canvas.
//!
//! ## Mask Types
//!
//! - **Circle**: diameter `min(width, height) * zoom`, centred on the canvas
//!   centre plus the mask offset
//! - **Rounded rectangle**: `width * zoom` x `height * zoom`, corner radius a
//!   percentage of half the shorter side
//!
//! ## Algorithm
//!
//! Everything outside the shape becomes fully transparent; everything inside
//! keeps its pixel. Edges are anti-aliased over one pixel.

pub mod apply;
pub mod shape;

pub use apply::apply_mask;
pub use shape::CropMask;
