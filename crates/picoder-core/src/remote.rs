//! Client for the remote generative image editing service.
//!
//! A single request is made per edit: the current artifact goes out as
//! inline image data next to the user's prompt, and the first inline image
//! in the response comes back as a PNG data URI. There is no retry.
//!
//! API keys are supplied by a [`CredentialProvider`], so key rotation is a
//! property of the provider rather than of the client.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::split_data_uri;

/// Default Gemini REST endpoint (without the model path).
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Default image editing model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
/// Appended to every prompt.
pub const DEFAULT_PROMPT_SUFFIX: &str = " Return ONLY the edited image.";

/// Errors returned by the remote edit client.
#[derive(Debug, Error)]
pub enum RemoteEditError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response contained no image part
    #[error("No image data returned from the model")]
    NoImage,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No API credentials configured")]
    NoCredentials,
}

/// An API key. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Source of API keys for outgoing requests.
pub trait CredentialProvider {
    /// Key to use for the next request, or `None` if none are configured.
    fn next_credential(&self) -> Option<Credential>;
}

/// A single fixed key.
#[derive(Debug, Clone)]
pub struct StaticCredential(pub Credential);

impl CredentialProvider for StaticCredential {
    fn next_credential(&self) -> Option<Credential> {
        Some(self.0.clone())
    }
}

/// Rotates through a pool of keys, one per request.
#[derive(Debug, Default)]
pub struct RoundRobinCredentials {
    keys: Vec<Credential>,
    next: AtomicUsize,
}

impl RoundRobinCredentials {
    pub fn new(keys: impl IntoIterator<Item = Credential>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            next: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl CredentialProvider for RoundRobinCredentials {
    fn next_credential(&self) -> Option<Credential> {
        if self.keys.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        log::debug!("remote: using credential {} of {}", index + 1, self.keys.len());
        self.keys.get(index).cloned()
    }
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for std::sync::Arc<P> {
    fn next_credential(&self) -> Option<Credential> {
        (**self).next_credential()
    }
}

/// Remote service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub model: String,
    pub prompt_suffix: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt_suffix: DEFAULT_PROMPT_SUFFIX.to_string(),
        }
    }
}

impl RemoteConfig {
    /// `generateContent` URL for the configured model.
    pub fn request_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

// Wire types for `generateContent`.

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text { text: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Deserialize)]
struct ResponseInlineData {
    data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Build the request body for an edit.
fn build_request<'a>(image_data_uri: &'a str, prompt: &str, suffix: &str) -> GenerateRequest<'a> {
    let (_, payload) = split_data_uri(image_data_uri);
    GenerateRequest {
        contents: vec![Content {
            parts: vec![
                RequestPart::Inline {
                    inline_data: InlineData {
                        mime_type: "image/png",
                        data: payload,
                    },
                },
                RequestPart::Text {
                    text: format!("{}{}", prompt, suffix),
                },
            ],
        }],
    }
}

/// Extract the first inline image of a successful response as a data URI.
fn parse_response_body(body: &str) -> Result<String, RemoteEditError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| RemoteEditError::MalformedResponse(e.to_string()))?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .into_iter()
        .flat_map(|content| content.parts)
        .find_map(|part| part.inline_data)
        .map(|inline| format!("data:image/png;base64,{}", inline.data))
        .ok_or(RemoteEditError::NoImage)
}

/// Turn a non-2xx response into an error, preferring the service's message.
fn api_error(status: u16, body: &str) -> RemoteEditError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    RemoteEditError::Api { status, message }
}

/// Gemini image editing client.
pub struct GeminiClient<P> {
    http: reqwest::Client,
    config: RemoteConfig,
    credentials: P,
}

impl<P: CredentialProvider> GeminiClient<P> {
    pub fn new(credentials: P) -> Self {
        Self::with_config(reqwest::Client::new(), RemoteConfig::default(), credentials)
    }

    pub fn with_config(http: reqwest::Client, config: RemoteConfig, credentials: P) -> Self {
        Self {
            http,
            config,
            credentials,
        }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Edit the image in `image_data_uri` according to `prompt`.
    ///
    /// Accepts a data URI or bare base64 and returns a PNG data URI.
    pub async fn edit(&self, image_data_uri: &str, prompt: &str) -> Result<String, RemoteEditError> {
        let credential = self
            .credentials
            .next_credential()
            .ok_or(RemoteEditError::NoCredentials)?;

        let body = build_request(image_data_uri, prompt, &self.config.prompt_suffix);
        log::info!("remote: requesting edit from {}", self.config.model);

        let response = self
            .http
            .post(self.config.request_url())
            .header("x-goog-api-key", credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteEditError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteEditError::Network(e.to_string()))?;

        if !status.is_success() {
            log::warn!("remote: edit failed with HTTP {}", status.as_u16());
            return Err(api_error(status.as_u16(), &text));
        }

        parse_response_body(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_round_robin_rotates() {
        let pool = RoundRobinCredentials::new(["a", "b", "c"].map(Credential::new));
        let keys: Vec<_> = (0..5)
            .map(|_| pool.next_credential().unwrap().expose().to_string())
            .collect();
        assert_eq!(keys, ["a", "b", "c", "a", "b"]);
    }

    #[test]
    fn test_empty_pool_has_no_credentials() {
        let pool = RoundRobinCredentials::new(Vec::new());
        assert!(pool.is_empty());
        assert!(pool.next_credential().is_none());
    }

    #[test]
    fn test_shared_pool_rotates_across_clones() {
        let pool = Arc::new(RoundRobinCredentials::new(["a", "b"].map(Credential::new)));
        let other = Arc::clone(&pool);
        assert_eq!(pool.next_credential().unwrap().expose(), "a");
        assert_eq!(other.next_credential().unwrap().expose(), "b");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let key = Credential::new("secret-key");
        assert!(!format!("{:?}", key).contains("secret"));
    }

    #[test]
    fn test_request_url() {
        let config = RemoteConfig {
            endpoint: "https://example.test/v1/models/".into(),
            ..RemoteConfig::default()
        };
        assert_eq!(
            config.request_url(),
            "https://example.test/v1/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = build_request("data:image/webp;base64,QUJD", "make it blue", DEFAULT_PROMPT_SUFFIX);
        let body = serde_json::to_value(request).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "QUJD");
        assert_eq!(parts[1]["text"], "make it blue Return ONLY the edited image.");
    }

    #[test]
    fn test_request_body_accepts_bare_base64() {
        let body = serde_json::to_value(build_request("QUJD", "x", "")).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["data"], "QUJD");
    }

    #[test]
    fn test_parse_first_inline_image() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here you go"},
                        {"inlineData": {"mimeType": "image/png", "data": "AAA"}},
                        {"inlineData": {"mimeType": "image/png", "data": "BBB"}}
                    ]
                }
            }]
        }"#;
        assert_eq!(parse_response_body(body).unwrap(), "data:image/png;base64,AAA");
    }

    #[test]
    fn test_parse_text_only_is_no_image() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "sorry"}]}}]}"#;
        assert!(matches!(parse_response_body(body), Err(RemoteEditError::NoImage)));
        assert!(matches!(parse_response_body("{}"), Err(RemoteEditError::NoImage)));
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        assert!(matches!(
            parse_response_body("<html>"),
            Err(RemoteEditError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_api_error_message() {
        let err = api_error(400, r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#);
        assert!(matches!(
            err,
            RemoteEditError::Api { status: 400, ref message } if message == "API key not valid"
        ));

        let err = api_error(502, " Bad Gateway ");
        assert!(matches!(
            err,
            RemoteEditError::Api { status: 502, ref message } if message == "Bad Gateway"
        ));
    }

    #[tokio::test]
    async fn test_edit_without_credentials_fails_fast() {
        let client = GeminiClient::new(RoundRobinCredentials::new(Vec::new()));
        let result = client.edit("data:image/png;base64,AAAA", "rotate").await;
        assert!(matches!(result, Err(RemoteEditError::NoCredentials)));
    }

    #[tokio::test]
    async fn test_edit_unreachable_endpoint_is_network_error() {
        let config = RemoteConfig {
            endpoint: "http://127.0.0.1:9/models".into(),
            ..RemoteConfig::default()
        };
        let client = GeminiClient::with_config(
            reqwest::Client::new(),
            config,
            StaticCredential(Credential::new("k")),
        );
        let result = client.edit("AAAA", "rotate").await;
        assert!(matches!(result, Err(RemoteEditError::Network(_))));
    }
}
