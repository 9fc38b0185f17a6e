//! `data:` URI helpers.
//!
//! Artifacts travel as `data:<mime>;base64,<payload>` strings, which is also
//! what the remote editing service accepts and returns.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::EncodeError;

const BASE64_MARKER: &str = ";base64,";

/// Build a base64 data URI for `bytes`.
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    let payload = STANDARD.encode(bytes);
    let mut uri = String::with_capacity(5 + mime.len() + BASE64_MARKER.len() + payload.len());
    uri.push_str("data:");
    uri.push_str(mime);
    uri.push_str(BASE64_MARKER);
    uri.push_str(&payload);
    uri
}

/// Split a data URI into its MIME type and base64 payload.
///
/// Input without a `data:` prefix is treated as a bare base64 payload.
pub fn split_data_uri(input: &str) -> (Option<&str>, &str) {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("data:") else {
        return (None, trimmed);
    };

    match rest.split_once(',') {
        Some((header, payload)) => {
            let mime = header.strip_suffix(";base64").unwrap_or(header);
            let mime = (!mime.is_empty()).then_some(mime);
            (mime, payload)
        }
        None => (None, rest),
    }
}

/// Decode a data URI (or bare base64) into `(mime, bytes)`.
///
/// A missing MIME type defaults to `image/png`.
pub fn decode_data_uri(input: &str) -> Result<(String, Vec<u8>), EncodeError> {
    let (mime, payload) = split_data_uri(input);
    if payload.is_empty() {
        return Err(EncodeError::InvalidDataUri("empty payload".to_string()));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| EncodeError::InvalidDataUri(e.to_string()))?;

    Ok((mime.unwrap_or("image/png").to_string(), bytes))
}
