//! Text compression and document merging.

pub mod compress;
pub mod merge;

pub use compress::CompressionEngine;
pub use merge::merge_documents;

/// Errors from compression and merge operations.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("No input documents to merge")]
    EmptyInput,

    #[error("External compression tool failed: {0}")]
    ExternalTool(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CompressError>;
