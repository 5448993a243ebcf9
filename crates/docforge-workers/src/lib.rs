//! Background worker offload.
//!
//! CPU-heavy operations (extraction, compression, batch processing) run on a
//! persistent background task reached over an RPC-style channel, with
//! per-task progress streams, cooperative cancellation, and crash recovery.

pub mod chunking;
pub mod manager;
pub mod protocol;

pub use manager::{ProgressSender, WorkerManager, WorkerState};
pub use protocol::{BatchItemOutcome, TaskPayload, WorkerRequest};

use docforge_compress::CompressError;
use docforge_extract::ExtractError;

/// Errors from worker dispatch and execution.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Worker is not ready (current state: {0})")]
    NotReady(String),

    #[error("Task was cancelled")]
    Cancelled,

    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Compress(#[from] CompressError),

    #[error("Worker channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, WorkerError>;
