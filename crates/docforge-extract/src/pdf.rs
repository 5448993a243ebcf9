//! PDF extractor.
//!
//! Pulls literal text from uncompressed content streams when a text layer is
//! present, and emits per-page structural placeholders when it is not. Real
//! text-layer reflow (compressed streams, CID fonts) is a pluggable concern:
//! register a richer extractor for `application/pdf` ahead of this one and
//! the registry dispatch picks it up unchanged.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::extractor::{ContentExtractor, ExtractedText};
use crate::{ExtractError, Result};

static PAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/Type\s*/Page\b").unwrap());
static TEXT_BLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\bBT\b(.*?)\bET\b").unwrap());
static LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(((?:\\.|[^\\()])*)\)").unwrap());

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    fn unescape_literal(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => break,
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Literal strings from every `BT ... ET` text block, in stream order.
    fn extract_text_layer(decoded: &str) -> String {
        let mut lines = Vec::new();
        for block in TEXT_BLOCK_RE.captures_iter(decoded) {
            let mut parts = Vec::new();
            for literal in LITERAL_RE.captures_iter(&block[1]) {
                let text = Self::unescape_literal(&literal[1]);
                if !text.trim().is_empty() {
                    parts.push(text);
                }
            }
            if !parts.is_empty() {
                lines.push(parts.join(" "));
            }
        }
        lines.join("\n")
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for PdfExtractor {
    async fn extract(&self, content: &[u8], filename: &str) -> Result<ExtractedText> {
        if !content.starts_with(b"%PDF") {
            return Err(ExtractError::MalformedContainer(
                "missing %PDF header".to_string(),
            ));
        }

        let decoded = String::from_utf8_lossy(content);
        let page_count = PAGE_RE.find_iter(&decoded).count().max(1) as u32;

        let text = Self::extract_text_layer(&decoded);
        if !text.trim().is_empty() {
            debug!(filename = %filename, pages = page_count, "Extracted PDF text layer");
            return Ok(ExtractedText::new(text).with_page_count(page_count));
        }

        // No recoverable text layer: structural placeholders per page.
        let placeholders: Vec<String> = (1..=page_count)
            .map(|page| format!("[Page {} of {}: no extractable text layer]", page, page_count))
            .collect();

        debug!(filename = %filename, pages = page_count, "PDF has no embedded text layer");

        Ok(ExtractedText::new(placeholders.join("\n"))
            .with_page_count(page_count)
            .with_warning("no embedded text layer; returned page placeholders"))
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["application/pdf"]
    }

    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["pdf"]
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}
