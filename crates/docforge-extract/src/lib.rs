//! # DocForge Extract
//!
//! Content extractors for the DocForge processing engine.
//!
//! One extraction routine per format family, each turning a file's raw bytes
//! into normalized UTF-8 text. Dispatch is by declared MIME type first,
//! filename extension second; unknown types fall back to a raw-text decode.
//!
//! # Failure policy
//!
//! A failure in one file's extraction is wrapped with the filename and
//! surfaced as an error to the caller. Extractors that front unreliable
//! backends (OCR, legacy binary formats) return documented placeholder
//! strings instead of erroring.

pub mod csv;
pub mod extractor;
pub mod image;
pub mod office;
pub mod pdf;
pub mod text;

pub use csv::CsvExtractor;
pub use extractor::{ContentExtractor, ExtractedText, ExtractorRegistry};
pub use image::ImageExtractor;
pub use office::{DocxExtractor, XlsxExtractor};
pub use pdf::PdfExtractor;
pub use text::{MarkdownExtractor, PlainTextExtractor};

/// Error types for extraction operations
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Extraction failed for {filename}: {message}")]
    Failed { filename: String, message: String },

    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("Content too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Wrap any extraction error with the originating filename.
    pub fn for_file(filename: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Failed {
            filename: filename.into(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
