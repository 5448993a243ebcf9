//! Plain-text and markdown extractors.

use async_trait::async_trait;
use tracing::debug;

use crate::extractor::{ContentExtractor, ExtractedText};
use crate::Result;

/// Plain text extractor. Also serves as the raw-text fallback for unknown
/// types, so it must never fail on arbitrary bytes.
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Decode bytes: UTF-8 first, Windows-1252 second.
    pub(crate) fn decode(content: &[u8]) -> (String, &'static str) {
        match std::str::from_utf8(content) {
            Ok(s) => (s.to_string(), "utf-8"),
            Err(_) => {
                let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(content);
                if had_errors {
                    (decoded.into_owned(), "windows-1252-lossy")
                } else {
                    (decoded.into_owned(), "windows-1252")
                }
            }
        }
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for PlainTextExtractor {
    async fn extract(&self, content: &[u8], _filename: &str) -> Result<ExtractedText> {
        let (text, encoding) = Self::decode(content);

        debug!(encoding = %encoding, size = content.len(), "Extracted plain text");

        Ok(ExtractedText::new(text)
            .with_metadata("encoding", serde_json::json!(encoding)))
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["text/plain", "application/json"]
    }

    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["txt", "text", "log", "json"]
    }

    fn name(&self) -> &'static str {
        "plain_text"
    }
}

/// Markdown extractor: renders the structural form down to plain text.
///
/// Any strip failure falls back to the verbatim markdown with a warning, so
/// downstream analysis always receives some text.
pub struct MarkdownExtractor;

impl MarkdownExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Strip markdown syntax, keeping the readable text.
    ///
    /// Returns `None` when stripping collapses non-empty input to nothing,
    /// which signals the verbatim fallback.
    fn strip_markdown(text: &str) -> Option<String> {
        let mut result = text.to_string();

        // Fenced code blocks: keep the code, drop the fences.
        while let Some(start) = result.find("```") {
            match result[start + 3..].find("```") {
                Some(end) => {
                    let inner = result[start + 3..start + 3 + end].to_string();
                    // Drop the info string on the opening fence.
                    let inner = match inner.find('\n') {
                        Some(nl) => inner[nl + 1..].to_string(),
                        None => String::new(),
                    };
                    result.replace_range(start..start + 3 + end + 3, &inner);
                }
                None => break,
            }
        }

        // Inline code.
        result = result.replace('`', "");

        // Heading markers and blockquotes.
        result = result
            .lines()
            .map(|line| {
                line.trim_start_matches('#')
                    .trim_start_matches('>')
                    .trim()
            })
            .collect::<Vec<_>>()
            .join("\n");

        // Images: drop entirely (alt text carries no document content).
        while let Some(start) = result.find("![") {
            match result[start..].find("](") {
                Some(mid) => match result[start + mid..].find(')') {
                    Some(end) => result.replace_range(start..start + mid + end + 1, ""),
                    None => break,
                },
                None => break,
            }
        }

        // Links: keep the label.
        while let Some(start) = result.find('[') {
            match result[start..].find("](") {
                Some(mid) => match result[start + mid..].find(')') {
                    Some(end) => {
                        let label = result[start + 1..start + mid].to_string();
                        result.replace_range(start..start + mid + end + 1, &label);
                    }
                    None => break,
                },
                None => break,
            }
        }

        // Emphasis markers.
        result = result
            .replace("**", "")
            .replace("__", "")
            .replace('*', "")
            .replace('_', "");

        let stripped = result.trim().to_string();
        if stripped.is_empty() && !text.trim().is_empty() {
            None
        } else {
            Some(stripped)
        }
    }
}

impl Default for MarkdownExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for MarkdownExtractor {
    async fn extract(&self, content: &[u8], _filename: &str) -> Result<ExtractedText> {
        let (text, _) = PlainTextExtractor::decode(content);

        match Self::strip_markdown(&text) {
            Some(stripped) => Ok(ExtractedText::new(stripped)),
            None => Ok(ExtractedText::new(text)
                .with_warning("markdown strip produced no text; kept verbatim")),
        }
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["text/markdown", "text/x-markdown"]
    }

    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["md", "markdown"]
    }

    fn name(&self) -> &'static str {
        "markdown"
    }
}
