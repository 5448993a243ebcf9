//! Worker lifecycle and dispatch.
//!
//! One persistent loop owns the request channel. Work items run as spawned
//! tasks so cancellation requests are serviced while work is in flight; a
//! panic in a work task trips the crash protocol (notify in-flight callers,
//! clear registrations, bounded-delay return to `Ready`).

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use docforge_compress::CompressionEngine;
use docforge_core::{
    CompressionMethod, CompressionResult, FileInput, ProcessedDocument, ProcessingConfig,
    TaskId, TaskProgress,
};
use docforge_extract::ExtractorRegistry;

use crate::chunking;
use crate::protocol::{BatchItemOutcome, TaskPayload, WorkerRequest};
use crate::{Result, WorkerError};

const REQUEST_BUFFER: usize = 64;
const RESTART_DELAY: Duration = Duration::from_millis(500);

/// Per-task progress stream.
pub type ProgressSender = mpsc::UnboundedSender<TaskProgress>;

/// Manager lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Uninitialized,
    Ready,
    Crashed,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkerState::Uninitialized => "uninitialized",
            WorkerState::Ready => "ready",
            WorkerState::Crashed => "crashed",
        };
        f.write_str(s)
    }
}

struct TaskEntry {
    progress: Option<ProgressSender>,
    result: oneshot::Sender<Result<TaskPayload>>,
    cancel: CancellationToken,
}

type Registry = Arc<DashMap<TaskId, TaskEntry>>;

/// Removes the caller's registration on every exit path, including caller
/// future cancellation.
struct Unregister {
    registry: Registry,
    task_id: TaskId,
}

impl Drop for Unregister {
    fn drop(&mut self) {
        self.registry.remove(&self.task_id);
    }
}

/// Offloads extraction, compression, and batch processing to a background
/// worker loop.
pub struct WorkerManager {
    config: ProcessingConfig,
    state: Arc<RwLock<WorkerState>>,
    registry: Registry,
    sender: RwLock<Option<mpsc::Sender<WorkerRequest>>>,
    restart_delay: Duration,
}

impl WorkerManager {
    pub fn new(config: ProcessingConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(WorkerState::Uninitialized)),
            registry: Arc::new(DashMap::new()),
            sender: RwLock::new(None),
            restart_delay: RESTART_DELAY,
        }
    }

    /// Spawn the worker loop and transition to `Ready`.
    pub async fn initialize(&self) {
        let mut sender = self.sender.write().await;
        if sender.is_some() {
            return;
        }

        let (tx, rx) = mpsc::channel(REQUEST_BUFFER);
        tokio::spawn(worker_loop(
            rx,
            self.registry.clone(),
            self.state.clone(),
            self.config.clone(),
            self.restart_delay,
        ));
        *sender = Some(tx);
        *self.state.write().await = WorkerState::Ready;
        info!("Worker manager initialized");
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Extract a file on the worker, streaming progress to `progress`.
    #[instrument(skip(self, file, progress), fields(filename = %file.filename))]
    pub async fn extract_content(
        &self,
        file: FileInput,
        progress: Option<ProgressSender>,
    ) -> Result<ProcessedDocument> {
        let task_id = TaskId::new();
        let payload = self
            .dispatch(
                task_id,
                progress,
                WorkerRequest::ExtractContent { task_id, file },
            )
            .await?;
        match payload {
            TaskPayload::Extracted(doc) => Ok(doc),
            other => Err(WorkerError::TaskFailed(format!(
                "unexpected payload for extract task: {:?}",
                other
            ))),
        }
    }

    /// Compress text on the worker.
    #[instrument(skip(self, text, progress), fields(method = %method, input_len = text.len()))]
    pub async fn compress_content(
        &self,
        text: String,
        method: CompressionMethod,
        progress: Option<ProgressSender>,
    ) -> Result<CompressionResult> {
        let task_id = TaskId::new();
        let payload = self
            .dispatch(
                task_id,
                progress,
                WorkerRequest::CompressContent {
                    task_id,
                    text,
                    method,
                },
            )
            .await?;
        match payload {
            TaskPayload::Compressed(result) => Ok(result),
            other => Err(WorkerError::TaskFailed(format!(
                "unexpected payload for compress task: {:?}",
                other
            ))),
        }
    }

    /// Process a batch of files; one aggregate progress stream, per-file
    /// outcomes. Returns the task id up front via the progress stream.
    #[instrument(skip(self, files, progress), fields(count = files.len()))]
    pub async fn process_batch(
        &self,
        files: Vec<FileInput>,
        progress: Option<ProgressSender>,
    ) -> Result<Vec<BatchItemOutcome>> {
        let task_id = TaskId::new();
        let payload = self
            .dispatch(
                task_id,
                progress,
                WorkerRequest::ProcessBatch { task_id, files },
            )
            .await?;
        match payload {
            TaskPayload::Batch(outcomes) => Ok(outcomes),
            other => Err(WorkerError::TaskFailed(format!(
                "unexpected payload for batch task: {:?}",
                other
            ))),
        }
    }

    /// Cancel a single in-flight task. The caller's pending dispatch resolves
    /// to [`WorkerError::Cancelled`]; any late result is discarded.
    pub async fn cancel_task(&self, task_id: TaskId) -> Result<()> {
        self.send(WorkerRequest::CancelTask { task_id }).await
    }

    pub async fn cancel_all_tasks(&self) -> Result<()> {
        self.send(WorkerRequest::CancelAllTasks).await
    }

    /// Cancel everything and drop all registrations.
    pub async fn cleanup(&self) -> Result<()> {
        self.send(WorkerRequest::Cleanup).await
    }

    pub fn active_tasks(&self) -> usize {
        self.registry.len()
    }

    async fn send(&self, request: WorkerRequest) -> Result<()> {
        let sender = self.sender.read().await;
        let sender = sender
            .as_ref()
            .ok_or(WorkerError::NotReady("uninitialized".to_string()))?;
        sender
            .send(request)
            .await
            .map_err(|_| WorkerError::ChannelClosed)
    }

    async fn dispatch(
        &self,
        task_id: TaskId,
        progress: Option<ProgressSender>,
        request: WorkerRequest,
    ) -> Result<TaskPayload> {
        let state = self.state().await;
        if state != WorkerState::Ready {
            return Err(WorkerError::NotReady(state.to_string()));
        }

        let (result_tx, result_rx) = oneshot::channel();
        self.registry.insert(
            task_id,
            TaskEntry {
                progress,
                result: result_tx,
                cancel: CancellationToken::new(),
            },
        );
        let _guard = Unregister {
            registry: self.registry.clone(),
            task_id,
        };

        self.send(request).await?;

        match result_rx.await {
            Ok(result) => result,
            // Sender dropped without a result: crash protocol cleared the
            // registration.
            Err(_) => Err(WorkerError::TaskFailed(
                "task terminated before completion".to_string(),
            )),
        }
    }

    #[cfg(test)]
    async fn inject_panic(&self) -> Result<TaskPayload> {
        let task_id = TaskId::new();
        self.dispatch(task_id, None, WorkerRequest::CrashForTesting { task_id })
            .await
    }

    #[cfg(test)]
    async fn stall(
        &self,
        task_id: TaskId,
        duration: Duration,
        progress: Option<ProgressSender>,
    ) -> Result<TaskPayload> {
        self.dispatch(
            task_id,
            progress,
            WorkerRequest::StallForTesting { task_id, duration },
        )
        .await
    }
}

async fn worker_loop(
    mut rx: mpsc::Receiver<WorkerRequest>,
    registry: Registry,
    state: Arc<RwLock<WorkerState>>,
    config: ProcessingConfig,
    restart_delay: Duration,
) {
    let extractors = Arc::new(ExtractorRegistry::with_defaults(&config));
    let compressor = Arc::new(CompressionEngine::new());
    let config = Arc::new(config);

    while let Some(request) = rx.recv().await {
        match request {
            WorkerRequest::ExtractContent { task_id, file } => {
                let job = {
                    let registry = registry.clone();
                    let extractors = extractors.clone();
                    let config = config.clone();
                    async move {
                        run_extract(task_id, file, &extractors, &config, &registry).await;
                    }
                };
                supervise(
                    tokio::spawn(job),
                    registry.clone(),
                    state.clone(),
                    restart_delay,
                );
            }
            WorkerRequest::CompressContent {
                task_id,
                text,
                method,
            } => {
                let job = {
                    let registry = registry.clone();
                    let compressor = compressor.clone();
                    async move {
                        run_compress(task_id, text, method, &compressor, &registry).await;
                    }
                };
                supervise(
                    tokio::spawn(job),
                    registry.clone(),
                    state.clone(),
                    restart_delay,
                );
            }
            WorkerRequest::ProcessBatch { task_id, files } => {
                let job = {
                    let registry = registry.clone();
                    let extractors = extractors.clone();
                    let config = config.clone();
                    async move {
                        run_batch(task_id, files, &extractors, &config, &registry).await;
                    }
                };
                supervise(
                    tokio::spawn(job),
                    registry.clone(),
                    state.clone(),
                    restart_delay,
                );
            }
            WorkerRequest::CancelTask { task_id } => {
                if let Some((_, entry)) = registry.remove(&task_id) {
                    debug!(%task_id, "Cancelling task");
                    entry.cancel.cancel();
                    let _ = entry.result.send(Err(WorkerError::Cancelled));
                }
            }
            WorkerRequest::CancelAllTasks | WorkerRequest::Cleanup => {
                let ids: Vec<TaskId> = registry.iter().map(|e| *e.key()).collect();
                debug!(count = ids.len(), "Cancelling all tasks");
                for task_id in ids {
                    if let Some((_, entry)) = registry.remove(&task_id) {
                        entry.cancel.cancel();
                        let _ = entry.result.send(Err(WorkerError::Cancelled));
                    }
                }
            }
            #[cfg(test)]
            WorkerRequest::CrashForTesting { .. } => {
                supervise(
                    tokio::spawn(async { panic!("injected crash") }),
                    registry.clone(),
                    state.clone(),
                    restart_delay,
                );
            }
            #[cfg(test)]
            WorkerRequest::StallForTesting { task_id, duration } => {
                let job = {
                    let registry = registry.clone();
                    async move {
                        send_progress(&registry, task_id, TaskProgress::new(task_id, 0, "stalling"));
                        // Deliberately ignores its cancel token: the work
                        // finishes anyway and its output must be dropped.
                        tokio::time::sleep(duration).await;
                        send_progress(&registry, task_id, TaskProgress::new(task_id, 100, "complete"));
                        deliver(&registry, task_id, Ok(TaskPayload::Batch(Vec::new())));
                    }
                };
                supervise(
                    tokio::spawn(job),
                    registry.clone(),
                    state.clone(),
                    restart_delay,
                );
            }
        }
    }
    debug!("Worker loop shut down (channel closed)");
}

/// Watch a work task; a panic trips the crash protocol.
fn supervise(
    handle: tokio::task::JoinHandle<()>,
    registry: Registry,
    state: Arc<RwLock<WorkerState>>,
    restart_delay: Duration,
) {
    tokio::spawn(async move {
        if let Err(e) = handle.await {
            if e.is_panic() {
                error!("Worker task panicked; notifying in-flight callers");
                *state.write().await = WorkerState::Crashed;

                let ids: Vec<TaskId> = registry.iter().map(|entry| *entry.key()).collect();
                for task_id in ids {
                    if let Some((_, entry)) = registry.remove(&task_id) {
                        if let Some(progress) = &entry.progress {
                            let _ = progress.send(TaskProgress::error(
                                task_id,
                                "Worker crashed during processing",
                            ));
                        }
                        entry.cancel.cancel();
                        // Dropping the result sender fails the caller's await.
                    }
                }

                tokio::time::sleep(restart_delay).await;
                *state.write().await = WorkerState::Ready;
                info!("Worker restarted after crash");
            }
        }
    });
}

/// Snapshot the task's cancel token; `None` means the caller already
/// unregistered (cancelled before we started).
fn cancel_token(registry: &Registry, task_id: TaskId) -> Option<CancellationToken> {
    registry.get(&task_id).map(|entry| entry.cancel.clone())
}

/// Progress goes through a live registry lookup, never a start-of-task
/// snapshot: once a task is cancelled its stream sees no further update,
/// even when the work races the cancellation and finishes anyway.
fn send_progress(registry: &Registry, task_id: TaskId, update: TaskProgress) {
    if let Some(entry) = registry.get(&task_id) {
        if let Some(tx) = &entry.progress {
            let _ = tx.send(update);
        }
    }
}

fn deliver(registry: &Registry, task_id: TaskId, result: Result<TaskPayload>) {
    // Registration gone means the task was cancelled; discard the result.
    if let Some((_, entry)) = registry.remove(&task_id) {
        let _ = entry.result.send(result);
    } else {
        debug!(%task_id, "Discarding result for unregistered task");
    }
}

async fn run_extract(
    task_id: TaskId,
    file: FileInput,
    extractors: &ExtractorRegistry,
    config: &ProcessingConfig,
    registry: &Registry,
) {
    let Some(cancel) = cancel_token(registry, task_id) else {
        return;
    };

    send_progress(
        registry,
        task_id,
        TaskProgress::new(task_id, 0, "extracting").with_message(file.filename.clone()),
    );

    let outcome = tokio::select! {
        _ = cancel.cancelled() => return,
        result = chunking::extract_possibly_chunked(&file, extractors, config) => result,
    };

    match outcome {
        Ok(doc) => {
            send_progress(registry, task_id, TaskProgress::new(task_id, 100, "complete"));
            deliver(registry, task_id, Ok(TaskPayload::Extracted(doc)));
        }
        Err(e) => {
            send_progress(registry, task_id, TaskProgress::error(task_id, e.to_string()));
            deliver(registry, task_id, Err(e.into()));
        }
    }
}

async fn run_compress(
    task_id: TaskId,
    text: String,
    method: CompressionMethod,
    compressor: &CompressionEngine,
    registry: &Registry,
) {
    let Some(cancel) = cancel_token(registry, task_id) else {
        return;
    };

    send_progress(registry, task_id, TaskProgress::new(task_id, 0, "compressing"));

    let outcome = tokio::select! {
        _ = cancel.cancelled() => return,
        result = compressor.compress(&text, method) => result,
    };

    match outcome {
        Ok(result) => {
            send_progress(registry, task_id, TaskProgress::new(task_id, 100, "complete"));
            deliver(registry, task_id, Ok(TaskPayload::Compressed(result)));
        }
        Err(e) => {
            send_progress(registry, task_id, TaskProgress::error(task_id, e.to_string()));
            deliver(registry, task_id, Err(e.into()));
        }
    }
}

async fn run_batch(
    task_id: TaskId,
    files: Vec<FileInput>,
    extractors: &ExtractorRegistry,
    config: &ProcessingConfig,
    registry: &Registry,
) {
    let Some(cancel) = cancel_token(registry, task_id) else {
        return;
    };

    let total = files.len().max(1);
    let mut outcomes = Vec::with_capacity(files.len());

    for (completed, file) in files.into_iter().enumerate() {
        if cancel.is_cancelled() {
            return;
        }

        send_progress(
            registry,
            task_id,
            TaskProgress::new(task_id, (completed * 100 / total) as u8, "batch")
                .with_message(format!("{}/{}: {}", completed, total, file.filename)),
        );

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return,
            result = chunking::extract_possibly_chunked(&file, extractors, config) => result,
        };

        match outcome {
            Ok(doc) => outcomes.push(BatchItemOutcome {
                filename: file.filename,
                outcome: Ok(doc),
            }),
            Err(e) => {
                warn!(filename = %file.filename, error = %e, "Batch item failed");
                outcomes.push(BatchItemOutcome {
                    filename: file.filename,
                    outcome: Err(e.to_string()),
                });
            }
        }
    }

    send_progress(
        registry,
        task_id,
        TaskProgress::new(task_id, 100, "batch").with_message("complete"),
    );
    deliver(registry, task_id, Ok(TaskPayload::Batch(outcomes)));
}
