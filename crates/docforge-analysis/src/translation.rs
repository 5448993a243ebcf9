//! Document translation.
//!
//! Remote translation when a provider is configured, with an identity
//! passthrough fallback so a translation record is always produced.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use docforge_core::{DocumentTranslation, ProcessingConfig};

use crate::language;
use crate::provider::{HttpProvider, RemoteProvider};
use crate::{AnalysisError, Result};

const REMOTE_CONFIDENCE: f64 = 0.9;
const FALLBACK_CONFIDENCE: f64 = 0.1;

pub struct TranslationEngine {
    provider: Option<Arc<dyn RemoteProvider>>,
    max_input_chars: usize,
}

impl TranslationEngine {
    pub fn new(max_input_chars: usize) -> Self {
        Self {
            provider: None,
            max_input_chars,
        }
    }

    pub fn with_provider(provider: Arc<dyn RemoteProvider>, max_input_chars: usize) -> Self {
        Self {
            provider: Some(provider),
            max_input_chars,
        }
    }

    pub fn from_config(config: &ProcessingConfig) -> Self {
        let max_input_chars = config.provider.max_input_chars;
        if config.provider.is_configured() {
            Self::with_provider(
                Arc::new(HttpProvider::new(config.provider.clone(), &config.retry)),
                max_input_chars,
            )
        } else {
            Self::new(max_input_chars)
        }
    }

    /// Translate `text` into `target_language`.
    ///
    /// Source language is detected from the input. Content over the input
    /// ceiling is truncated before the provider call and the result marked
    /// `truncated`. A failing or absent provider degrades to an identity
    /// passthrough at low confidence; this never returns a provider error.
    #[instrument(skip(self, text), fields(target = target_language, text_len = text.len()))]
    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<DocumentTranslation> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let source = language::detect_language(text);
        let (input, truncated) = self.bounded(text);
        if truncated {
            debug!(
                original_chars = text.chars().count(),
                limit = self.max_input_chars,
                "Input truncated before translation"
            );
        }

        let (translated_text, confidence) = match &self.provider {
            Some(p) => match p.translate(input, target_language).await {
                Ok(t) => (t, REMOTE_CONFIDENCE),
                Err(e) => {
                    warn!(error = %e, "Translation provider failed; returning passthrough");
                    (input.to_string(), FALLBACK_CONFIDENCE)
                }
            },
            None => (input.to_string(), FALLBACK_CONFIDENCE),
        };

        Ok(DocumentTranslation {
            source_language: source.code,
            target_language: target_language.to_string(),
            translated_text,
            confidence,
            truncated,
            created_at: Utc::now(),
        })
    }

    fn bounded<'a>(&self, text: &'a str) -> (&'a str, bool) {
        match text.char_indices().nth(self.max_input_chars) {
            Some((i, _)) => (&text[..i], true),
            None => (text, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docforge_core::{Entity, Sentiment};

    use crate::provider::{ProviderError, ProviderResult};

    struct EchoProvider;

    #[async_trait]
    impl RemoteProvider for EchoProvider {
        async fn sentiment(&self, _: &str) -> ProviderResult<Sentiment> {
            unimplemented!()
        }
        async fn key_phrases(&self, _: &str) -> ProviderResult<Vec<String>> {
            unimplemented!()
        }
        async fn entities(&self, _: &str) -> ProviderResult<Vec<Entity>> {
            unimplemented!()
        }
        async fn summarize(&self, _: &str) -> ProviderResult<String> {
            unimplemented!()
        }
        async fn translate(&self, text: &str, target: &str) -> ProviderResult<String> {
            Ok(format!("[{}] {}", target, text))
        }
    }

    struct DownProvider;

    #[async_trait]
    impl RemoteProvider for DownProvider {
        async fn sentiment(&self, _: &str) -> ProviderResult<Sentiment> {
            unimplemented!()
        }
        async fn key_phrases(&self, _: &str) -> ProviderResult<Vec<String>> {
            unimplemented!()
        }
        async fn entities(&self, _: &str) -> ProviderResult<Vec<Entity>> {
            unimplemented!()
        }
        async fn summarize(&self, _: &str) -> ProviderResult<String> {
            unimplemented!()
        }
        async fn translate(&self, _: &str, _: &str) -> ProviderResult<String> {
            Err(ProviderError::Unavailable("503".to_string()))
        }
    }

    #[tokio::test]
    async fn test_remote_translation() {
        let engine = TranslationEngine::with_provider(Arc::new(EchoProvider), 1000);
        let result = engine
            .translate("The report is ready and it was sent to the team.", "es")
            .await
            .unwrap();

        assert_eq!(result.source_language, "en");
        assert_eq!(result.target_language, "es");
        assert!(result.translated_text.starts_with("[es]"));
        assert_eq!(result.confidence, 0.9);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn test_fallback_is_identity_passthrough() {
        let engine = TranslationEngine::with_provider(Arc::new(DownProvider), 1000);
        let text = "The report is ready.";
        let result = engine.translate(text, "fr").await.unwrap();

        assert_eq!(result.translated_text, text);
        assert_eq!(result.confidence, 0.1);
    }

    #[tokio::test]
    async fn test_no_provider_is_identity_passthrough() {
        let engine = TranslationEngine::new(1000);
        let result = engine.translate("Hello there.", "de").await.unwrap();

        assert_eq!(result.translated_text, "Hello there.");
        assert_eq!(result.confidence, 0.1);
    }

    #[tokio::test]
    async fn test_long_input_truncated_and_flagged() {
        let engine = TranslationEngine::with_provider(Arc::new(EchoProvider), 10);
        let result = engine
            .translate("the and of to in is that it for was", "es")
            .await
            .unwrap();

        assert!(result.truncated);
        // "[es] " prefix plus exactly 10 chars of input.
        assert_eq!(result.translated_text, "[es] the and of");
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let engine = TranslationEngine::new(1000);
        assert!(engine.translate("", "es").await.is_err());
    }
}
