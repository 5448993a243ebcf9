//! Workspace state and operation orchestration.
//!
//! All mutation flows through [`state::StateIntent`] so every state change
//! is enumerable; public operations validate inputs, offload heavy work to
//! the worker manager, and commit results back through intents.

pub mod orchestrator;
pub mod state;

pub use orchestrator::DocumentOrchestrator;
pub use state::{ErrorEntry, StateIntent, WorkspaceInsights, WorkspaceState};

use docforge_analysis::AnalysisError;
use docforge_compress::CompressError;
use docforge_core::{CoreError, DocumentId};
use docforge_workers::WorkerError;

/// Errors surfaced by orchestrator operations.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("No {kind} artifact for document {id}")]
    MissingArtifact { id: DocumentId, kind: &'static str },

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Compress(#[from] CompressError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
