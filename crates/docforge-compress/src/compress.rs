//! Text compression strategies.
//!
//! `basic` and `aggressive` are lossless-ish whitespace normalizations that
//! keep the output as readable text; `external` shells out to the system
//! `gzip` and degrades to `basic` when the tool is missing.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use docforge_core::{CompressionMethod, CompressionResult};

use crate::{CompressError, Result};

/// Applies a [`CompressionMethod`] to document text.
pub struct CompressionEngine;

impl CompressionEngine {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, text), fields(method = %method, input_len = text.len()))]
    pub async fn compress(
        &self,
        text: &str,
        method: CompressionMethod,
    ) -> Result<CompressionResult> {
        let started = Instant::now();
        let original_size = text.len();

        let result = match method {
            CompressionMethod::Basic => {
                let data = basic_normalize(text).into_bytes();
                CompressionResult::new(
                    original_size,
                    data,
                    CompressionMethod::Basic,
                    started.elapsed().as_millis() as u64,
                )
            }
            CompressionMethod::Aggressive => {
                let data = aggressive_normalize(text).into_bytes();
                CompressionResult::new(
                    original_size,
                    data,
                    CompressionMethod::Aggressive,
                    started.elapsed().as_millis() as u64,
                )
            }
            CompressionMethod::External => match external_gzip(text.as_bytes()).await {
                Ok(data) => CompressionResult::new(
                    original_size,
                    data,
                    CompressionMethod::External,
                    started.elapsed().as_millis() as u64,
                ),
                Err(CompressError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                    warn!("gzip not found on PATH; degrading to basic compression");
                    let data = basic_normalize(text).into_bytes();
                    CompressionResult::new(
                        original_size,
                        data,
                        CompressionMethod::Basic,
                        started.elapsed().as_millis() as u64,
                    )
                    .degraded()
                }
                Err(e) => return Err(e),
            },
        };

        debug!(
            original = result.original_size,
            compressed = result.compressed_size,
            ratio = result.ratio,
            degraded = result.degraded,
            "Compression complete"
        );

        Ok(result)
    }
}

impl Default for CompressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse space/tab runs within each line and strip trailing whitespace.
/// Line structure is preserved. Idempotent.
fn basic_normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut last_was_space = false;
        for c in line.trim_end().chars() {
            if c == ' ' || c == '\t' {
                if !last_was_space {
                    out.push(' ');
                }
                last_was_space = true;
            } else {
                out.push(c);
                last_was_space = false;
            }
        }
    }
    out
}

/// Basic normalization plus blank-line removal.
fn aggressive_normalize(text: &str) -> String {
    basic_normalize(text)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run the system `gzip` over `data` via stdin/stdout.
async fn external_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut child = Command::new("gzip")
        .arg("-c")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(data).await?;
        // Closing stdin signals EOF so gzip can finish the stream.
        drop(stdin);
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(CompressError::ExternalTool(format!(
            "gzip exited with {}",
            output.status
        )));
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_basic_collapses_whitespace_runs() {
        let engine = CompressionEngine::new();
        let result = engine
            .compress("hello    world\t\tagain   \nnext  line", CompressionMethod::Basic)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(result.data).unwrap(),
            "hello world again\nnext line"
        );
        assert!(result.compressed_size < result.original_size);
        assert!(!result.degraded);
    }

    #[tokio::test]
    async fn test_basic_is_idempotent() {
        let engine = CompressionEngine::new();
        let once = engine
            .compress("a   b\t c  \n\n d", CompressionMethod::Basic)
            .await
            .unwrap();
        let first = String::from_utf8(once.data).unwrap();

        let twice = engine
            .compress(&first, CompressionMethod::Basic)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(twice.data).unwrap(), first);
    }

    #[tokio::test]
    async fn test_basic_never_grows() {
        let engine = CompressionEngine::new();
        for text in ["", "x", "no extra whitespace here", "  lots\t\t of   gaps  "] {
            let result = engine.compress(text, CompressionMethod::Basic).await.unwrap();
            assert!(result.compressed_size <= result.original_size, "{:?}", text);
        }
    }

    #[tokio::test]
    async fn test_aggressive_removes_blank_lines() {
        let engine = CompressionEngine::new();
        let result = engine
            .compress("first\n\n\nsecond\n   \nthird", CompressionMethod::Aggressive)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(result.data).unwrap(),
            "first\nsecond\nthird"
        );
        assert_eq!(result.method, CompressionMethod::Aggressive);
    }

    #[tokio::test]
    async fn test_ratio_reflects_measured_sizes() {
        let engine = CompressionEngine::new();
        let result = engine
            .compress("ab    cd", CompressionMethod::Basic)
            .await
            .unwrap();

        assert_eq!(result.original_size, 8);
        assert_eq!(result.compressed_size, 5);
        assert!((result.ratio - 0.375).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let engine = CompressionEngine::new();
        let result = engine.compress("", CompressionMethod::Basic).await.unwrap();
        assert_eq!(result.compressed_size, 0);
        assert_eq!(result.ratio, 0.0);
    }
}
