//! Export serialisations of an output artifact.
//!
//! Produces the text payloads consumed by copy, download and share actions.

use serde::{Deserialize, Serialize};

use crate::render::OutputArtifact;

/// Maximum share payload length in characters.
pub const SHARE_TEXT_LIMIT: usize = 100_000;

/// Title attached to shared payloads.
pub const SHARE_TITLE: &str = "PICoder Output";

/// Escape text for a double-quoted HTML attribute.
fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Snippet flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    #[default]
    Html,
    Css,
    Raw,
}

impl ExportKind {
    /// Text snippet embedding `artifact`.
    pub fn snippet(self, artifact: &OutputArtifact) -> String {
        match self {
            ExportKind::Html => {
                format!(
                    r#"<img src="{}" alt="{}" />"#,
                    artifact.data_uri,
                    escape_attr(&artifact.name)
                )
            }
            ExportKind::Css => format!("background-image: url('{}');", artifact.data_uri),
            ExportKind::Raw => artifact.data_uri.clone(),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Html => "html",
            ExportKind::Css => "css",
            ExportKind::Raw => "txt",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportKind::Html => "text/html",
            ExportKind::Css => "text/css",
            ExportKind::Raw => "text/plain",
        }
    }

    /// Parse `"html"`, `"css"` or `"raw"` (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "html" => Some(ExportKind::Html),
            "css" => Some(ExportKind::Css),
            "raw" => Some(ExportKind::Raw),
            _ => None,
        }
    }
}

/// File name for a downloaded snippet: `picoder-<stem>.<ext>`.
pub fn download_filename(kind: ExportKind, stem: &str) -> String {
    format!("picoder-{}.{}", stem, kind.extension())
}

/// Snippet truncated to [`SHARE_TEXT_LIMIT`] characters.
pub fn share_text(kind: ExportKind, artifact: &OutputArtifact) -> String {
    let snippet = kind.snippet(artifact);
    match snippet.char_indices().nth(SHARE_TEXT_LIMIT) {
        Some((cut, _)) => snippet[..cut].to_string(),
        None => snippet,
    }
}

/// Human-readable size with 1024-based units, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(uri: &str) -> OutputArtifact {
        OutputArtifact::from_data_uri(uri.to_string(), 1, 1, "cat.png", 10)
    }

    #[test]
    fn test_snippets() {
        let a = artifact("data:image/png;base64,AAAA");
        assert_eq!(
            ExportKind::Html.snippet(&a),
            r#"<img src="data:image/png;base64,AAAA" alt="cat.png" />"#
        );
        assert_eq!(
            ExportKind::Css.snippet(&a),
            "background-image: url('data:image/png;base64,AAAA');"
        );
        assert_eq!(ExportKind::Raw.snippet(&a), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_html_snippet_escapes_name() {
        let a = OutputArtifact::from_data_uri(
            "data:image/png;base64,AAAA".to_string(),
            1,
            1,
            r#"a "b" <c> & d.png"#,
            10,
        );
        assert_eq!(
            ExportKind::Html.snippet(&a),
            r#"<img src="data:image/png;base64,AAAA" alt="a &quot;b&quot; &lt;c&gt; &amp; d.png" />"#
        );
    }

    #[test]
    fn test_download_metadata() {
        assert_eq!(download_filename(ExportKind::Html, "17"), "picoder-17.html");
        assert_eq!(download_filename(ExportKind::Css, "x"), "picoder-x.css");
        assert_eq!(download_filename(ExportKind::Raw, "x"), "picoder-x.txt");
        assert_eq!(ExportKind::Html.mime_type(), "text/html");
        assert_eq!(ExportKind::Css.mime_type(), "text/css");
        assert_eq!(ExportKind::Raw.mime_type(), "text/plain");
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(ExportKind::parse("HTML"), Some(ExportKind::Html));
        assert_eq!(ExportKind::parse(" css "), Some(ExportKind::Css));
        assert_eq!(ExportKind::parse("raw"), Some(ExportKind::Raw));
        assert_eq!(ExportKind::parse("svg"), None);
    }

    #[test]
    fn test_share_text_is_truncated() {
        let long = format!("data:image/png;base64,{}", "A".repeat(200_000));
        let a = artifact(&long);
        let shared = share_text(ExportKind::Raw, &a);
        assert_eq!(shared.chars().count(), SHARE_TEXT_LIMIT);
        assert!(long.starts_with(&shared));

        let short = artifact("data:image/png;base64,AAAA");
        assert_eq!(share_text(ExportKind::Raw, &short), short.data_uri);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_576), "1 MB");
        assert_eq!(format_size(1_288_490), "1.23 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }
}
