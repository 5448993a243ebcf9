//! # DocForge Core
//!
//! Shared types, configuration, and error taxonomy for the DocForge document
//! processing engine.
//!
//! This crate is dependency-light on purpose: every other workspace crate
//! (extractors, analysis, compression, workers, orchestrator) builds on the
//! data model defined here, so nothing heavier than serialization, ids, and
//! configuration loading belongs at this layer.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    EnvironmentStatus, OcrConfig, ProcessingConfig, ProviderConfig, RetryConfig,
    validate_environment, OPTIONAL_ENV_VARS, REQUIRED_ENV_VARS,
};
pub use error::{CoreError, Result};
pub use types::{
    CompressionMethod, CompressionResult, DetectedLanguage, DocumentAnalysis, DocumentId,
    DocumentStats, DocumentTranslation, Entity, ExportFormat, FileInput, MergeOptions,
    ProcessedDocument, Sentiment, SentimentLabel, SentimentScores, TaskId, TaskProgress,
};
