//! Output encoding for PICoder.
//!
//! This module provides functionality for:
//! - Encoding RGBA canvases to PNG, JPEG or WebP
//! - Wrapping encoded bytes in base64 data URIs and unwrapping them again
//!
//! # Examples
//!
//! ```ignore
//! use picoder_core::encode::{encode_rgba, to_data_uri};
//! use picoder_core::OutputFormat;
//!
//! let pixels = vec![128u8; 100 * 100 * 4];
//! let bytes = encode_rgba(&pixels, 100, 100, OutputFormat::Png, 90).unwrap();
//! let uri = to_data_uri(OutputFormat::Png.mime_type(), &bytes);
//! ```

mod data_uri;
mod raster;

pub use data_uri::{decode_data_uri, split_data_uri, to_data_uri};
pub use raster::{encode_rgba, EncodeError};
