//! PICoder Core - image transform engine
//!
//! This crate provides the core functionality for PICoder: decoding a
//! source image, rendering it with rotation, mirroring, resizing and crop
//! masks, encoding the result as a data URI, linear undo/redo history, and
//! the session controller that ties them together.
//!
//! # Modules
//!
//! - [`settings`]: the complete edit settings record and partial patches
//! - [`decode`]: source decoding with EXIF orientation and size limits
//! - [`transform`]: canvas layout and compositing
//! - [`mask`]: circle and rounded-rectangle crop masks
//! - [`encode`]: PNG/JPEG/WebP encoding and data URIs
//! - [`render`]: source + settings -> output artifact
//! - [`history`]: bounded undo/redo buffer
//! - [`session`]: the editing session controller
//! - [`export`]: HTML/CSS/raw snippets and download metadata
//! - [`remote`]: generative image editing client
//! - [`acquire`]: fetching sources by URL

pub mod acquire;
pub mod decode;
pub mod encode;
pub mod export;
pub mod history;
pub mod mask;
pub mod remote;
pub mod render;
pub mod session;
pub mod settings;
pub mod transform;

pub use acquire::{fetch_source, FetchError, SourceFile};
pub use decode::{DecodeError, DecodeLimits, DecodedImage};
pub use encode::EncodeError;
pub use export::{download_filename, format_size, share_text, ExportKind};
pub use history::{HistoryBuffer, HistoryEntry};
pub use remote::{
    Credential, CredentialProvider, GeminiClient, RemoteConfig, RemoteEditError,
    RoundRobinCredentials, StaticCredential,
};
pub use render::{render, render_bytes, OutputArtifact, RenderError, SourceRaster};
pub use session::{
    ChangeKind, RemoteEditTicket, RenderJob, RenderOutcome, Session, SessionConfig, SessionError,
};
pub use settings::{MaskShape, OutputFormat, Settings, SettingsPatch};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_serialize_with_ui_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["maxWidth"], 800);
        assert_eq!(json["outputFormat"], "image/webp");
        assert_eq!(json["mask"], "none");
        assert_eq!(json["flipH"], false);
    }

    #[test]
    fn test_export_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ExportKind::Css).unwrap(), "css");
    }

    #[test]
    fn test_change_kind_roundtrip() {
        let kind: ChangeKind = serde_json::from_str(r#""live""#).unwrap();
        assert_eq!(kind, ChangeKind::Live);
    }
}
