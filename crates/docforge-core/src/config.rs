use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

/// Environment variables that must be present for full-quality analysis and
/// translation. Extraction works without them; only provider quality degrades.
pub const REQUIRED_ENV_VARS: &[&str] = &["DOCFORGE_AI_API_KEY"];

/// Optional provider credentials. Absence is reported but never blocking.
pub const OPTIONAL_ENV_VARS: &[&str] = &["DOCFORGE_NLP_API_KEY", "DOCFORGE_CODEASSIST_API_KEY"];

/// Main processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    pub provider: ProviderConfig,
    pub ocr: OcrConfig,
    pub retry: RetryConfig,
    /// Files above this many bytes are extracted in byte-range chunks.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Ceiling for plain-text family files, in bytes.
    #[serde(default = "default_max_text_size")]
    pub max_text_size: usize,
    /// Ceiling for binary document formats (pdf, docx, xlsx), in bytes.
    #[serde(default = "default_max_document_size")]
    pub max_document_size: usize,
    /// Ceiling for image files, in bytes.
    #[serde(default = "default_max_image_size")]
    pub max_image_size: usize,
    #[serde(default = "default_supported_extensions")]
    pub supported_extensions: Vec<String>,
    #[serde(default = "default_target_language")]
    pub default_target_language: String,
}

impl ProcessingConfig {
    /// Load configuration from `DOCFORGE`-prefixed environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from_env("DOCFORGE")
    }

    /// Load configuration from the environment with a custom prefix.
    pub fn load_from_env(prefix: &str) -> Result<Self> {
        let builder = Config::builder()
            .add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("provider.endpoint", "https://api.openai.com/v1")?
            .set_default("provider.api_key", "")?
            .set_default("provider.model", "gpt-4o-mini")?
            .set_default("provider.timeout_secs", 30)?
            .set_default("provider.max_input_chars", 12_000)?
            .set_default("ocr.enabled", false)?
            .set_default("ocr.languages", vec!["eng".to_string(), "ara".to_string()])?
            .set_default("retry.max_attempts", 3)?
            .set_default("retry.initial_delay_ms", 200)?
            .set_default("retry.backoff_multiplier", 2.0)?;

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Ceiling for a declared MIME type, in bytes.
    pub fn size_ceiling(&self, mime_type: &str) -> usize {
        if mime_type.starts_with("image/") {
            self.max_image_size
        } else if mime_type.starts_with("text/") || mime_type == "application/json" {
            self.max_text_size
        } else {
            self.max_document_size
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            ocr: OcrConfig::default(),
            retry: RetryConfig::default(),
            chunk_size: default_chunk_size(),
            max_text_size: default_max_text_size(),
            max_document_size: default_max_document_size(),
            max_image_size: default_max_image_size(),
            supported_extensions: default_supported_extensions(),
            default_target_language: default_target_language(),
        }
    }
}

/// Remote analysis/translation provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Inputs longer than this are truncated before a provider call.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl ProviderConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: default_timeout_secs(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

/// OCR settings for image extraction.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub enabled: bool,
    /// Tesseract language codes. Defaults cover one LTR and one RTL script.
    #[serde(default = "default_ocr_languages")]
    pub languages: Vec<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            languages: default_ocr_languages(),
        }
    }
}

/// Retry policy applied to remote provider calls.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

fn default_chunk_size() -> usize {
    4 * 1024 * 1024
}

fn default_max_text_size() -> usize {
    10 * 1024 * 1024
}

fn default_max_document_size() -> usize {
    50 * 1024 * 1024
}

fn default_max_image_size() -> usize {
    20 * 1024 * 1024
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_input_chars() -> usize {
    12_000
}

fn default_ocr_languages() -> Vec<String> {
    vec!["eng".to_string(), "ara".to_string()]
}

fn default_max_attempts() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    200
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_supported_extensions() -> Vec<String> {
    [
        "pdf", "docx", "doc", "xlsx", "txt", "md", "markdown", "csv", "json", "png", "jpg",
        "jpeg", "gif", "bmp", "tiff",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_target_language() -> String {
    "en".to_string()
}

/// Result of validating provider credentials in the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentStatus {
    /// True when every required variable is present and non-empty.
    pub valid: bool,
    pub missing_required: Vec<String>,
    /// Absent optional variables; reported but non-blocking.
    pub missing_optional: Vec<String>,
}

/// Pure validation of a name→value map against the fixed required and
/// optional variable lists. Empty values count as missing.
pub fn validate_environment(vars: &HashMap<String, String>) -> EnvironmentStatus {
    let is_missing = |name: &str| vars.get(name).map(|v| v.is_empty()).unwrap_or(true);

    let missing_required: Vec<String> = REQUIRED_ENV_VARS
        .iter()
        .filter(|name| is_missing(name))
        .map(|name| name.to_string())
        .collect();

    let missing_optional: Vec<String> = OPTIONAL_ENV_VARS
        .iter()
        .filter(|name| is_missing(name))
        .map(|name| name.to_string())
        .collect();

    EnvironmentStatus {
        valid: missing_required.is_empty(),
        missing_required,
        missing_optional,
    }
}

impl EnvironmentStatus {
    /// Validate against the process environment.
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = std::env::vars().collect();
        validate_environment(&vars)
    }
}
