//! Request and result types exchanged with the worker loop.

use docforge_core::{CompressionMethod, CompressionResult, FileInput, ProcessedDocument, TaskId};

/// RPC-style request sent to the worker loop.
#[derive(Debug)]
pub enum WorkerRequest {
    ExtractContent {
        task_id: TaskId,
        file: FileInput,
    },
    CompressContent {
        task_id: TaskId,
        text: String,
        method: CompressionMethod,
    },
    ProcessBatch {
        task_id: TaskId,
        files: Vec<FileInput>,
    },
    CancelTask {
        task_id: TaskId,
    },
    CancelAllTasks,
    /// Cancel everything and drop all registrations.
    Cleanup,
    /// Fault injection for crash-recovery tests.
    #[cfg(test)]
    CrashForTesting {
        task_id: TaskId,
    },
    /// Timed job for cancellation tests; runs to completion regardless of
    /// its cancel token so post-cancel output suppression is exercised.
    #[cfg(test)]
    StallForTesting {
        task_id: TaskId,
        duration: std::time::Duration,
    },
}

/// Successful result of a worker task.
#[derive(Debug)]
pub enum TaskPayload {
    Extracted(ProcessedDocument),
    Compressed(CompressionResult),
    Batch(Vec<BatchItemOutcome>),
}

/// Per-file outcome inside a batch: failures carry the message instead of
/// aborting sibling files.
#[derive(Debug)]
pub struct BatchItemOutcome {
    pub filename: String,
    pub outcome: std::result::Result<ProcessedDocument, String>,
}
