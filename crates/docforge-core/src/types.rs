use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

// Newtype wrappers for type safety

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Input types

/// A file handed to the engine: raw bytes plus the caller's declared identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInput {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileInput {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Lowercased filename extension, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.filename.rsplit('.').next()?;
        if name == self.filename {
            None
        } else {
            Some(name.to_lowercase())
        }
    }
}

// Document types

/// Counts words the way every component in the workspace must: Unicode
/// whitespace splitting, empty tokens excluded.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Derived metadata attached to a processed document.
///
/// `word_count` and `character_count` are always computed from the content,
/// never supplied by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStats {
    pub word_count: usize,
    pub character_count: usize,
    /// Detected language code, refined after analysis.
    pub language: Option<String>,
    pub extracted_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub page_count: Option<u32>,
    /// Number of byte-range chunks used for large-file extraction.
    pub chunk_count: Option<u32>,
}

impl DocumentStats {
    pub fn from_text(text: &str) -> Self {
        Self {
            word_count: count_words(text),
            character_count: text.chars().count(),
            language: None,
            extracted_at: Utc::now(),
            processing_time_ms: 0,
            page_count: None,
            chunk_count: None,
        }
    }
}

/// A document after extraction: normalized text plus derived metadata.
///
/// Immutable once created except for metadata refinement (language
/// re-detection, processing duration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub id: DocumentId,
    pub name: String,
    pub mime_type: String,
    /// Declared byte size of the original file.
    pub size: u64,
    pub content: String,
    pub stats: DocumentStats,
    /// Content fingerprint (sha256 hex) for dedup-grade identity.
    pub fingerprint: String,
    pub thumbnail: Option<String>,
    /// Original byte source, retained when the caller needs re-export.
    pub source: Option<Vec<u8>>,
}

impl ProcessedDocument {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let stats = DocumentStats::from_text(&content);
        let fingerprint = hex::encode(Sha256::digest(content.as_bytes()));
        Self {
            id: DocumentId::new(),
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            content,
            stats,
            fingerprint,
            thumbnail: None,
            source: None,
        }
    }

    pub fn with_source(mut self, bytes: Vec<u8>) -> Self {
        self.source = Some(bytes);
        self
    }

    pub fn with_page_count(mut self, pages: u32) -> Self {
        self.stats.page_count = Some(pages);
        self
    }

    pub fn with_chunk_count(mut self, chunks: u32) -> Self {
        self.stats.chunk_count = Some(chunks);
        self
    }

    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.stats.processing_time_ms = ms;
        self
    }

    /// Metadata refinement: record the detected language after analysis.
    pub fn set_language(&mut self, code: impl Into<String>) {
        self.stats.language = Some(code.into());
    }
}

// Analysis types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Negative => write!(f, "negative"),
            SentimentLabel::Neutral => write!(f, "neutral"),
        }
    }
}

/// Per-class confidence scores, summing toward 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl SentimentScores {
    pub fn even() -> Self {
        Self {
            positive: 1.0 / 3.0,
            negative: 1.0 / 3.0,
            neutral: 1.0 / 3.0,
        }
    }

    pub fn sum(&self) -> f64 {
        self.positive + self.negative + self.neutral
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub scores: SentimentScores,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub category: String,
    pub confidence: f64,
}

impl Entity {
    pub fn new(text: impl Into<String>, category: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedLanguage {
    pub name: String,
    pub code: String,
    pub confidence: f64,
}

impl DetectedLanguage {
    pub fn new(name: impl Into<String>, code: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            confidence,
        }
    }
}

/// Full analysis of one document. At most one per document; latest overwrites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub sentiment: Sentiment,
    /// Ordered by relevance, most relevant first.
    pub key_phrases: Vec<String>,
    pub entities: Vec<Entity>,
    pub language: DetectedLanguage,
    pub summary: String,
    pub topics: Vec<String>,
    /// Reading-ease score, clamped to [0, 100].
    pub readability: f64,
    pub analyzed_at: DateTime<Utc>,
}

// Translation types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTranslation {
    pub source_language: String,
    pub target_language: String,
    pub translated_text: String,
    pub confidence: f64,
    /// True when the input was truncated before the provider call.
    pub truncated: bool,
    pub created_at: DateTime<Utc>,
}

// Compression types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMethod {
    Basic,
    Aggressive,
    External,
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionMethod::Basic => write!(f, "basic"),
            CompressionMethod::Aggressive => write!(f, "aggressive"),
            CompressionMethod::External => write!(f, "external"),
        }
    }
}

impl std::str::FromStr for CompressionMethod {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "aggressive" => Ok(Self::Aggressive),
            "external" => Ok(Self::External),
            other => Err(crate::CoreError::validation(format!(
                "unknown compression method: {}",
                other
            ))),
        }
    }
}

/// Outcome of one compression run. Sizes are measured, never estimated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionResult {
    pub original_size: usize,
    pub compressed_size: usize,
    /// `1 - compressed/original`; 0.0 for empty input.
    pub ratio: f64,
    /// Method that actually ran (after any degradation).
    pub method: CompressionMethod,
    pub data: Vec<u8>,
    pub duration_ms: u64,
    /// True when the requested external tool was unavailable and the engine
    /// fell back to basic normalization.
    pub degraded: bool,
}

impl CompressionResult {
    pub fn new(
        original_size: usize,
        data: Vec<u8>,
        method: CompressionMethod,
        duration_ms: u64,
    ) -> Self {
        let compressed_size = data.len();
        let ratio = if original_size == 0 {
            0.0
        } else {
            1.0 - compressed_size as f64 / original_size as f64
        };
        Self {
            original_size,
            compressed_size,
            ratio,
            method,
            data,
            duration_ms,
            degraded: false,
        }
    }

    pub fn degraded(mut self) -> Self {
        self.degraded = true;
        self
    }
}

// Merge types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOptions {
    /// MIME type of the merged artifact.
    pub output_type: String,
    /// Prepend a per-source header block (name, type, size, word count).
    pub include_metadata: bool,
    /// Insert a separator between sources (never after the last).
    pub add_page_breaks: bool,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            output_type: "text/plain".to_string(),
            include_metadata: false,
            add_page_breaks: false,
            title: None,
            author: None,
        }
    }
}

// Task types

/// Progress message used uniformly across extraction, compression, and batch
/// operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProgress {
    pub task_id: TaskId,
    /// 0–100.
    pub progress: u8,
    pub stage: String,
    pub message: Option<String>,
}

impl TaskProgress {
    pub fn new(task_id: TaskId, progress: u8, stage: impl Into<String>) -> Self {
        Self {
            task_id,
            progress: progress.min(100),
            stage: stage.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Error progress event delivered to in-flight callers on a worker crash.
    pub fn error(task_id: TaskId, message: impl Into<String>) -> Self {
        Self {
            task_id,
            progress: 100,
            stage: "error".to_string(),
            message: Some(message.into()),
        }
    }
}

// Export types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Original,
    Compressed,
    Translated,
}

impl ExportFormat {
    /// Filename prefix prepended to the document name on export.
    pub fn filename_prefix(&self) -> &'static str {
        match self {
            ExportFormat::Original => "",
            ExportFormat::Compressed => "compressed_",
            ExportFormat::Translated => "translated_",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_id_uniqueness() {
        let id1 = DocumentId::new();
        let id2 = DocumentId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_file_input_extension() {
        let file = FileInput::new("Report.PDF", "application/pdf", vec![1, 2, 3]);
        assert_eq!(file.extension(), Some("pdf".to_string()));
        assert_eq!(file.size(), 3);

        let no_ext = FileInput::new("README", "text/plain", vec![]);
        assert_eq!(no_ext.extension(), None);
    }

    #[test]
    fn test_processed_document_counts() {
        let doc = ProcessedDocument::new("a.txt", "text/plain", 11, "hello world");
        assert_eq!(doc.stats.word_count, 2);
        assert_eq!(doc.stats.character_count, 11);
        assert_eq!(doc.stats.character_count, doc.content.chars().count());
        assert!(!doc.fingerprint.is_empty());
    }

    #[test]
    fn test_processed_document_language_refinement() {
        let mut doc = ProcessedDocument::new("a.txt", "text/plain", 5, "hola mundo");
        assert!(doc.stats.language.is_none());
        doc.set_language("es");
        assert_eq!(doc.stats.language.as_deref(), Some("es"));
    }

    #[test]
    fn test_compression_result_ratio() {
        let result = CompressionResult::new(100, vec![0u8; 40], CompressionMethod::Basic, 5);
        assert_eq!(result.compressed_size, 40);
        assert!((result.ratio - 0.6).abs() < 1e-9);
        assert!(!result.degraded);

        let degraded = result.degraded();
        assert!(degraded.degraded);
    }

    #[test]
    fn test_compression_result_empty_input() {
        let result = CompressionResult::new(0, Vec::new(), CompressionMethod::Basic, 0);
        assert_eq!(result.ratio, 0.0);
    }

    #[test]
    fn test_compression_method_parse() {
        assert_eq!(
            "aggressive".parse::<CompressionMethod>().unwrap(),
            CompressionMethod::Aggressive
        );
        assert!("zippy".parse::<CompressionMethod>().is_err());
    }

    #[test]
    fn test_sentiment_scores_even() {
        let scores = SentimentScores::even();
        assert!((scores.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_task_progress_clamped() {
        let progress = TaskProgress::new(TaskId::new(), 250, "extracting");
        assert_eq!(progress.progress, 100);
    }

    #[test]
    fn test_export_format_prefix() {
        assert_eq!(ExportFormat::Compressed.filename_prefix(), "compressed_");
        assert_eq!(ExportFormat::Translated.filename_prefix(), "translated_");
        assert_eq!(ExportFormat::Original.filename_prefix(), "");
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("  one   two\nthree "), 3);
    }
}
