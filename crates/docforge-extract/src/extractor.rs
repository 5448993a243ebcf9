//! Extractor contract and format dispatch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use docforge_core::{FileInput, ProcessedDocument, ProcessingConfig};

use crate::{ExtractError, Result};

/// Result of one extraction: normalized text plus format-specific metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: Option<u32>,
    pub warnings: Vec<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page_count: None,
            warnings: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_page_count(mut self, pages: u32) -> Self {
        self.page_count = Some(pages);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Trait for format-family content extractors.
///
/// Implementations receive raw bytes and a filename and must produce UTF-8
/// text with no side effects beyond logging.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Extract normalized text from raw file content.
    async fn extract(&self, content: &[u8], filename: &str) -> Result<ExtractedText>;

    /// MIME types this extractor handles.
    fn supported_types(&self) -> Vec<&'static str>;

    /// Filename extensions this extractor handles (lowercase, no dot).
    fn supported_extensions(&self) -> Vec<&'static str>;

    fn can_handle_type(&self, content_type: &str) -> bool {
        self.supported_types()
            .iter()
            .any(|&t| content_type.starts_with(t))
    }

    fn can_handle_extension(&self, extension: &str) -> bool {
        self.supported_extensions().iter().any(|&e| e == extension)
    }

    /// Extractor name for logging.
    fn name(&self) -> &'static str;
}

/// Registry of content extractors with declared-type-first dispatch.
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn ContentExtractor>>,
    fallback: Arc<dyn ContentExtractor>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
            fallback: Arc::new(crate::text::PlainTextExtractor::new()),
        }
    }

    /// Create with the full default extractor set.
    pub fn with_defaults(config: &ProcessingConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::pdf::PdfExtractor::new()));
        registry.register(Arc::new(crate::office::DocxExtractor::new()));
        registry.register(Arc::new(crate::office::XlsxExtractor::new()));
        registry.register(Arc::new(crate::csv::CsvExtractor::new()));
        registry.register(Arc::new(crate::text::MarkdownExtractor::new()));
        registry.register(Arc::new(crate::image::ImageExtractor::new(
            config.ocr.clone(),
        )));
        registry.register(Arc::new(crate::text::PlainTextExtractor::new()));
        registry
    }

    pub fn register(&mut self, extractor: Arc<dyn ContentExtractor>) {
        self.extractors.push(extractor);
    }

    /// Resolve an extractor: declared MIME type first, filename extension
    /// second, raw-text decode fallback for everything else. A missing or
    /// generic declared type is replaced by a guess from the filename before
    /// dispatch.
    pub fn resolve(&self, mime_type: &str, filename: &str) -> Arc<dyn ContentExtractor> {
        let mime_type = if mime_type.is_empty() || mime_type == "application/octet-stream" {
            mime_guess::from_path(filename)
                .first_raw()
                .unwrap_or(mime_type)
        } else {
            mime_type
        };

        for extractor in &self.extractors {
            if extractor.can_handle_type(mime_type) {
                return extractor.clone();
            }
        }

        let extension = filename
            .rsplit('.')
            .next()
            .filter(|ext| *ext != filename)
            .map(|ext| ext.to_lowercase());
        if let Some(ext) = extension {
            for extractor in &self.extractors {
                if extractor.can_handle_extension(&ext) {
                    return extractor.clone();
                }
            }
        }

        debug!(mime_type = %mime_type, filename = %filename, "No extractor matched; using raw-text fallback");
        self.fallback.clone()
    }

    /// Extract a full [`FileInput`] into a [`ProcessedDocument`].
    ///
    /// Enforces the per-type size ceiling and wraps every failure with the
    /// filename so batch callers can attribute errors.
    pub async fn extract_file(
        &self,
        file: &FileInput,
        config: &ProcessingConfig,
    ) -> Result<ProcessedDocument> {
        let ceiling = config.size_ceiling(&file.mime_type);
        if file.bytes.len() > ceiling {
            return Err(ExtractError::for_file(
                &file.filename,
                ExtractError::TooLarge {
                    size: file.bytes.len(),
                    max: ceiling,
                },
            ));
        }

        let extractor = self.resolve(&file.mime_type, &file.filename);
        let start = Instant::now();

        let extracted = extractor
            .extract(&file.bytes, &file.filename)
            .await
            .map_err(|e| ExtractError::for_file(&file.filename, e))?;

        for warning in &extracted.warnings {
            warn!(filename = %file.filename, warning = %warning, "Extraction warning");
        }

        let mut doc = docforge_core::ProcessedDocument::new(
            &file.filename,
            &file.mime_type,
            file.bytes.len() as u64,
            extracted.text,
        )
        .with_processing_time(start.elapsed().as_millis() as u64)
        .with_source(file.bytes.clone());

        if let Some(pages) = extracted.page_count {
            doc = doc.with_page_count(pages);
        }

        debug!(
            filename = %file.filename,
            extractor = %extractor.name(),
            words = doc.stats.word_count,
            "File extracted"
        );

        Ok(doc)
    }

    pub fn list(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults(&ProcessingConfig::default())
    }
}
