//! # DocForge Analysis
//!
//! Sentiment, key-phrase, entity, language, summary, topic, and readability
//! analysis plus translation, with a remote-provider-first / local-fallback
//! strategy.
//!
//! Every facet independently attempts the configured remote provider; on any
//! provider error (network, auth, quota) the error is logged and a local
//! heuristic runs instead. Callers never see the provider failure, only a
//! possibly lower-quality result tagged with its origin.

pub mod engine;
pub mod entities;
pub mod keywords;
pub mod language;
pub mod provider;
pub mod readability;
pub mod retry;
pub mod sentiment;
pub mod summary;
pub mod translation;

pub use engine::AnalysisEngine;
pub use provider::{HttpProvider, ProviderError, RemoteProvider};
pub use retry::RetryPolicy;
pub use translation::TranslationEngine;

use serde::{Deserialize, Serialize};

/// Result of one analysis facet, tagged with where it came from.
///
/// New providers slot in without touching fallback logic: anything producing
/// a `Remote` short-circuits the heuristic, anything failing degrades to
/// `Local`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetOutcome<T> {
    Remote(T),
    Local(T),
}

impl<T> FacetOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            FacetOutcome::Remote(value) | FacetOutcome::Local(value) => value,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, FacetOutcome::Remote(_))
    }
}

/// Error types for analysis operations
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Empty input text")]
    EmptyInput,

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_outcome_unwraps_both_variants() {
        assert_eq!(FacetOutcome::Remote(1).into_inner(), 1);
        assert_eq!(FacetOutcome::Local(2).into_inner(), 2);
        assert!(FacetOutcome::Remote(()).is_remote());
        assert!(!FacetOutcome::Local(()).is_remote());
    }
}
