//! Analysis engine: provider-first, heuristic-second, per facet.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use docforge_core::{DocumentAnalysis, ProcessingConfig};

use crate::provider::{HttpProvider, RemoteProvider};
use crate::{entities, keywords, language, readability, sentiment, summary};
use crate::{AnalysisError, FacetOutcome, Result};

/// Content length (chars) above which a generative summary is requested.
const GENERATIVE_SUMMARY_THRESHOLD: usize = 600;

/// Produces a [`DocumentAnalysis`] from text.
///
/// Each sub-facet (sentiment, key phrases, entities, summary) independently
/// attempts the remote provider first; on any provider error the failure is
/// logged and the local heuristic runs instead. Language, topics, and
/// readability are always computed locally.
pub struct AnalysisEngine {
    provider: Option<Arc<dyn RemoteProvider>>,
    summary_threshold: usize,
}

impl AnalysisEngine {
    /// Engine with local heuristics only.
    pub fn new() -> Self {
        Self {
            provider: None,
            summary_threshold: GENERATIVE_SUMMARY_THRESHOLD,
        }
    }

    pub fn with_provider(provider: Arc<dyn RemoteProvider>) -> Self {
        Self {
            provider: Some(provider),
            summary_threshold: GENERATIVE_SUMMARY_THRESHOLD,
        }
    }

    /// Build from configuration: remote provider when an API key is present,
    /// local-only otherwise.
    pub fn from_config(config: &ProcessingConfig) -> Self {
        if config.provider.is_configured() {
            Self::with_provider(Arc::new(HttpProvider::new(
                config.provider.clone(),
                &config.retry,
            )))
        } else {
            debug!("No provider configured; analysis runs local heuristics only");
            Self::new()
        }
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn analyze(&self, text: &str) -> Result<DocumentAnalysis> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let sentiment = match &self.provider {
            Some(p) => match p.sentiment(text).await {
                Ok(s) => FacetOutcome::Remote(s),
                Err(e) => {
                    warn!(facet = "sentiment", error = %e, "Provider failed; using local fallback");
                    FacetOutcome::Local(sentiment::analyze_sentiment(text))
                }
            },
            None => FacetOutcome::Local(sentiment::analyze_sentiment(text)),
        };

        let key_phrases = match &self.provider {
            Some(p) => match p.key_phrases(text).await {
                Ok(phrases) => FacetOutcome::Remote(phrases),
                Err(e) => {
                    warn!(facet = "key_phrases", error = %e, "Provider failed; using local fallback");
                    FacetOutcome::Local(keywords::extract_key_phrases(text))
                }
            },
            None => FacetOutcome::Local(keywords::extract_key_phrases(text)),
        };

        let entity_list = match &self.provider {
            Some(p) => match p.entities(text).await {
                Ok(found) => FacetOutcome::Remote(found),
                Err(e) => {
                    warn!(facet = "entities", error = %e, "Provider failed; using local fallback");
                    FacetOutcome::Local(entities::extract_entities(text))
                }
            },
            None => FacetOutcome::Local(entities::extract_entities(text)),
        };

        // Generative summary only for long content; everything else gets the
        // extractive first/middle/last form.
        let summary_text = match &self.provider {
            Some(p) if text.chars().count() > self.summary_threshold => {
                match p.summarize(text).await {
                    Ok(s) => FacetOutcome::Remote(s),
                    Err(e) => {
                        warn!(facet = "summary", error = %e, "Provider failed; using extractive fallback");
                        FacetOutcome::Local(summary::extractive_summary(text))
                    }
                }
            }
            _ => FacetOutcome::Local(summary::extractive_summary(text)),
        };

        let analysis = DocumentAnalysis {
            sentiment: sentiment.into_inner(),
            key_phrases: key_phrases.into_inner(),
            entities: entity_list.into_inner(),
            language: language::detect_language(text),
            summary: summary_text.into_inner(),
            topics: keywords::extract_topics(text),
            readability: readability::readability_score(text),
            analyzed_at: Utc::now(),
        };

        debug!(
            sentiment = %analysis.sentiment.label,
            language = %analysis.language.code,
            entities = analysis.entities.len(),
            "Analysis complete"
        );

        Ok(analysis)
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
