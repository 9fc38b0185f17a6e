//! Source acquisition: raw bytes from a file or a fetched URL.

use thiserror::Error;

/// Name used when a URL has no usable final path segment.
pub const FALLBACK_FILENAME: &str = "downloaded-image";

/// An encoded source file, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Size of the encoded file in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} while fetching {url}")]
    Status { status: u16, url: String },
}

/// File name for a URL: its final path segment, ignoring query and fragment.
pub fn filename_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Download an image with a plain GET.
///
/// Fails with [`FetchError::Status`] on non-2xx responses. Cross-origin
/// restrictions in the browser surface as [`FetchError::Network`].
pub async fn fetch_source(client: &reqwest::Client, url: &str) -> Result<SourceFile, FetchError> {
    let parsed = reqwest::Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    let name = filename_from_url(&parsed);

    log::info!("acquire: fetching {}", parsed);
    let response = client
        .get(parsed.clone())
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            status: response.status().as_u16(),
            url: parsed.to_string(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    log::debug!("acquire: received {} bytes for {}", bytes.len(), name);
    Ok(SourceFile::new(name, bytes.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_of(url: &str) -> String {
        filename_from_url(&reqwest::Url::parse(url).unwrap())
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(name_of("https://example.com/images/cat.jpg"), "cat.jpg");
        assert_eq!(name_of("https://example.com/images/cat.jpg?w=200#top"), "cat.jpg");
        assert_eq!(name_of("https://example.com/images/"), FALLBACK_FILENAME);
        assert_eq!(name_of("https://example.com/"), FALLBACK_FILENAME);
        assert_eq!(name_of("https://example.com"), FALLBACK_FILENAME);
    }

    #[test]
    fn test_source_file_size() {
        let file = SourceFile::new("a.png", vec![0; 42]);
        assert_eq!(file.size(), 42);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let result = fetch_source(&reqwest::Client::new(), "not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let result = fetch_source(&reqwest::Client::new(), "http://127.0.0.1:9/x.png").await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
