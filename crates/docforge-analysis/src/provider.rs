//! Remote analysis/translation provider.
//!
//! Provider failures are always absorbed by a local fallback at the engine
//! boundary; nothing in this module surfaces to end callers directly.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use docforge_core::{Entity, ProviderConfig, RetryConfig, Sentiment, SentimentLabel, SentimentScores};

use crate::retry::RetryPolicy;

/// Errors from a remote provider call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider not configured (missing API key)")]
    Unconfigured,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Quota exceeded: {0}")]
    Quota(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Unavailable(_) | ProviderError::Quota(_) | ProviderError::Request(_) => {
                true
            }
            ProviderError::Unconfigured
            | ProviderError::Auth(_)
            | ProviderError::InvalidResponse(_) => false,
        }
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Contract for a remote analysis/translation provider.
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    async fn sentiment(&self, text: &str) -> ProviderResult<Sentiment>;
    async fn key_phrases(&self, text: &str) -> ProviderResult<Vec<String>>;
    async fn entities(&self, text: &str) -> ProviderResult<Vec<Entity>>;
    async fn summarize(&self, text: &str) -> ProviderResult<String>;
    async fn translate(&self, text: &str, target_language: &str) -> ProviderResult<String>;
}

/// Chat-completions provider over HTTP, with retry applied per call.
pub struct HttpProvider {
    config: ProviderConfig,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(config: ProviderConfig, retry: &RetryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            config,
            retry: RetryPolicy::from_config(retry),
            client,
        }
    }

    async fn completion_once(&self, system: &str, user: &str) -> ProviderResult<String> {
        if !self.config.is_configured() {
            return Err(ProviderError::Unconfigured);
        }

        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.endpoint))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::Auth(status.to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Quota(status.to_string()));
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable(status.to_string()));
        }

        let payload: serde_json::Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| ProviderError::InvalidResponse("missing completion content".to_string()))
    }

    async fn completion(&self, system: &str, user: &str) -> ProviderResult<String> {
        let result = self
            .retry
            .execute(|| self.completion_once(system, user))
            .await?;
        debug!(chars = result.len(), "Provider completion received");
        Ok(result)
    }

    /// Truncate text to the provider's input ceiling, on a char boundary.
    fn bounded<'a>(&self, text: &'a str) -> &'a str {
        if text.chars().count() <= self.config.max_input_chars {
            return text;
        }
        let end = text
            .char_indices()
            .nth(self.config.max_input_chars)
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        &text[..end]
    }
}

#[async_trait]
impl RemoteProvider for HttpProvider {
    async fn sentiment(&self, text: &str) -> ProviderResult<Sentiment> {
        let reply = self
            .completion(
                "Classify the sentiment of the user's text. Reply with JSON only: \
                 {\"label\": \"positive|negative|neutral\", \"positive\": 0.0, \
                 \"negative\": 0.0, \"neutral\": 0.0}",
                self.bounded(text),
            )
            .await?;

        let parsed: serde_json::Value = serde_json::from_str(&reply)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let label = match parsed["label"].as_str() {
            Some("positive") => SentimentLabel::Positive,
            Some("negative") => SentimentLabel::Negative,
            Some("neutral") => SentimentLabel::Neutral,
            other => {
                return Err(ProviderError::InvalidResponse(format!(
                    "unknown sentiment label: {:?}",
                    other
                )))
            }
        };

        Ok(Sentiment {
            label,
            scores: SentimentScores {
                positive: parsed["positive"].as_f64().unwrap_or(0.0),
                negative: parsed["negative"].as_f64().unwrap_or(0.0),
                neutral: parsed["neutral"].as_f64().unwrap_or(0.0),
            },
        })
    }

    async fn key_phrases(&self, text: &str) -> ProviderResult<Vec<String>> {
        let reply = self
            .completion(
                "Extract the 10 most important key phrases from the user's text. \
                 Reply with a JSON array of strings only.",
                self.bounded(text),
            )
            .await?;

        serde_json::from_str(&reply).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn entities(&self, text: &str) -> ProviderResult<Vec<Entity>> {
        let reply = self
            .completion(
                "Extract named entities from the user's text. Reply with a JSON array \
                 of {\"text\": str, \"category\": str, \"confidence\": number} only.",
                self.bounded(text),
            )
            .await?;

        serde_json::from_str(&reply).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn summarize(&self, text: &str) -> ProviderResult<String> {
        self.completion(
            "Summarize the user's text in 2-3 sentences. Reply with the summary only.",
            self.bounded(text),
        )
        .await
    }

    async fn translate(&self, text: &str, target_language: &str) -> ProviderResult<String> {
        self.completion(
            &format!(
                "Translate the user's text to {}. Reply with the translation only.",
                target_language
            ),
            self.bounded(text),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> HttpProvider {
        HttpProvider::new(ProviderConfig::default(), &RetryConfig::default())
    }

    #[tokio::test]
    async fn test_unconfigured_provider_fails_fast() {
        let result = provider().sentiment("some text").await;
        assert!(matches!(result, Err(ProviderError::Unconfigured)));
    }

    #[test]
    fn test_unconfigured_is_not_retryable() {
        assert!(!ProviderError::Unconfigured.is_retryable());
        assert!(!ProviderError::Auth("401".to_string()).is_retryable());
        assert!(ProviderError::Quota("429".to_string()).is_retryable());
        assert!(ProviderError::Unavailable("503".to_string()).is_retryable());
    }

    #[test]
    fn test_bounded_truncates_on_char_boundary() {
        let config = ProviderConfig {
            max_input_chars: 3,
            ..Default::default()
        };
        let provider = HttpProvider::new(config, &RetryConfig::default());

        assert_eq!(provider.bounded("abcdef"), "abc");
        // Multi-byte chars must not split.
        assert_eq!(provider.bounded("ééééé"), "ééé");
        assert_eq!(provider.bounded("ab"), "ab");
    }
}
