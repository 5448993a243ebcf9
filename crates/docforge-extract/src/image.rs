//! Image extractor with OCR support.
//!
//! Uses the system `tesseract` binary with the configured language set.
//! Extraction never errors for an image it cannot read: every failure mode
//! maps to a documented placeholder string.

use async_trait::async_trait;
use std::io::Write;
use tracing::{debug, warn};

use docforge_core::OcrConfig;

use crate::extractor::{ContentExtractor, ExtractedText};
use crate::Result;

pub struct ImageExtractor {
    config: OcrConfig,
}

impl ImageExtractor {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    fn language_arg(&self) -> String {
        if self.config.languages.is_empty() {
            "eng".to_string()
        } else {
            self.config.languages.join("+")
        }
    }

    /// Run tesseract over the image bytes via a temp file.
    async fn run_ocr(&self, content: &[u8]) -> std::io::Result<String> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(content)?;
        file.flush()?;

        let output = tokio::process::Command::new("tesseract")
            .arg(file.path())
            .arg("stdout")
            .args(["-l", &self.language_arg()])
            .output()
            .await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(std::io::Error::other(format!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )))
        }
    }
}

#[async_trait]
impl ContentExtractor for ImageExtractor {
    async fn extract(&self, content: &[u8], filename: &str) -> Result<ExtractedText> {
        if !self.config.enabled {
            debug!(filename = %filename, "OCR disabled; returning placeholder");
            return Ok(ExtractedText::new(format!(
                "[Image file: {} (OCR disabled)]",
                filename
            )));
        }

        match self.run_ocr(content).await {
            Ok(text) if text.trim().is_empty() => Ok(ExtractedText::new(format!(
                "[No text detected in image: {}]",
                filename
            ))),
            Ok(text) => {
                debug!(filename = %filename, chars = text.len(), "OCR complete");
                Ok(ExtractedText::new(text.trim().to_string())
                    .with_metadata("ocr_languages", serde_json::json!(self.language_arg())))
            }
            Err(e) => {
                warn!(filename = %filename, error = %e, "OCR failed");
                Ok(ExtractedText::new(format!("[OCR failed for image: {}]", filename))
                    .with_warning(e.to_string()))
            }
        }
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["image/"]
    }

    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["png", "jpg", "jpeg", "gif", "bmp", "tiff"]
    }

    fn name(&self) -> &'static str {
        "image_ocr"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ocr_disabled_placeholder() {
        let extractor = ImageExtractor::new(OcrConfig {
            enabled: false,
            ..Default::default()
        });

        let result = extractor.extract(&[0x89, 0x50], "chart.png").await.unwrap();
        assert_eq!(result.text, "[Image file: chart.png (OCR disabled)]");
    }

    #[tokio::test]
    async fn test_ocr_failure_returns_placeholder_not_error() {
        // Garbage bytes: whether tesseract is installed or not, extraction
        // must come back with a placeholder rather than an error.
        let extractor = ImageExtractor::new(OcrConfig {
            enabled: true,
            languages: vec!["eng".to_string(), "ara".to_string()],
        });

        let result = extractor
            .extract(b"definitely not an image", "broken.png")
            .await
            .unwrap();
        assert!(result.text.starts_with('['));
        assert!(result.text.contains("broken.png"));
    }

    #[test]
    fn test_language_arg_joins_with_plus() {
        let extractor = ImageExtractor::new(OcrConfig {
            enabled: true,
            languages: vec!["eng".to_string(), "ara".to_string()],
        });
        assert_eq!(extractor.language_arg(), "eng+ara");
    }

    #[test]
    fn test_language_arg_defaults_to_english() {
        let extractor = ImageExtractor::new(OcrConfig {
            enabled: true,
            languages: Vec::new(),
        });
        assert_eq!(extractor.language_arg(), "eng");
    }
}
