//! WASM-compatible wrapper types for session output.

use picoder_core::{format_size, OutputArtifact};
use wasm_bindgen::prelude::*;

/// An encoded output image for JavaScript.
///
/// All accessors return copies; the artifact itself is immutable.
#[wasm_bindgen]
#[derive(Debug, Clone, PartialEq)]
pub struct JsArtifact {
    inner: OutputArtifact,
}

#[wasm_bindgen]
impl JsArtifact {
    /// `data:<mime>;base64,...` string, usable directly as an `<img>` source
    #[wasm_bindgen(getter)]
    pub fn data_uri(&self) -> String {
        self.inner.data_uri.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Length of the data URI in characters
    #[wasm_bindgen(getter)]
    pub fn size(&self) -> usize {
        self.inner.size
    }

    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.inner.name.clone()
    }

    /// Byte size of the source image
    #[wasm_bindgen(getter)]
    pub fn original_size(&self) -> f64 {
        self.inner.original_size as f64
    }

    /// Human-readable `size`, e.g. `"12.4 KB"`
    #[wasm_bindgen(getter)]
    pub fn size_label(&self) -> String {
        format_size(self.inner.size as u64)
    }

    /// Human-readable `original_size`
    #[wasm_bindgen(getter)]
    pub fn original_size_label(&self) -> String {
        format_size(self.inner.original_size)
    }
}

impl From<&OutputArtifact> for JsArtifact {
    fn from(artifact: &OutputArtifact) -> Self {
        Self {
            inner: artifact.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> OutputArtifact {
        OutputArtifact::from_data_uri(
            "data:image/png;base64,AAAA".to_string(),
            64,
            32,
            "photo.png",
            2048,
        )
    }

    #[test]
    fn test_js_artifact_accessors() {
        let js = JsArtifact::from(&artifact());
        assert_eq!(js.data_uri(), "data:image/png;base64,AAAA");
        assert_eq!((js.width(), js.height()), (64, 32));
        assert_eq!(js.size(), 26);
        assert_eq!(js.name(), "photo.png");
        assert_eq!(js.original_size(), 2048.0);
    }

    #[test]
    fn test_size_labels() {
        let js = JsArtifact::from(&artifact());
        assert_eq!(js.size_label(), "26 B");
        assert_eq!(js.original_size_label(), "2 KB");
    }
}
