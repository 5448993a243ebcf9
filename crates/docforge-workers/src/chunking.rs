//! Chunked extraction for large text files.
//!
//! Files above the configured chunk size are split into sequential byte
//! ranges and extracted independently, so one bad region does not sink the
//! whole file. Only text-like inputs are chunked; container formats (zip,
//! pdf) are not byte-splittable.

use tracing::{debug, warn};

use docforge_core::{FileInput, ProcessedDocument, ProcessingConfig};
use docforge_extract::{ExtractError, ExtractorRegistry};

/// Split `bytes` into chunks of at most `chunk_size`, backing each boundary
/// off to a UTF-8 character boundary so decodable text stays decodable.
pub fn split_chunks(bytes: &[u8], chunk_size: usize) -> Vec<&[u8]> {
    // A zero size from misconfiguration degrades to single-byte chunks
    // rather than panicking inside the worker task.
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < bytes.len() {
        let mut end = (start + chunk_size).min(bytes.len());
        if end < bytes.len() {
            // A UTF-8 continuation byte is 0b10xxxxxx; back off at most 3.
            let mut backoff = 0;
            while backoff < 3 && end > start + 1 && bytes[end] & 0xC0 == 0x80 {
                end -= 1;
                backoff += 1;
            }
        }
        chunks.push(&bytes[start..end]);
        start = end;
    }

    chunks
}

fn is_chunkable(file: &FileInput) -> bool {
    file.mime_type.starts_with("text/")
        || matches!(
            file.extension().as_deref(),
            Some("txt") | Some("md") | Some("csv") | Some("log")
        )
}

/// Extract a file, splitting text-like inputs above the chunk size into
/// independently extracted byte ranges. Per-chunk failures are logged and
/// skipped; the final document concatenates the surviving chunks and records
/// the chunk count.
pub async fn extract_possibly_chunked(
    file: &FileInput,
    extractors: &ExtractorRegistry,
    config: &ProcessingConfig,
) -> docforge_extract::Result<ProcessedDocument> {
    // The per-type ceiling applies to the whole file; chunking must not let
    // an oversized input through as under-ceiling pieces.
    let ceiling = config.size_ceiling(&file.mime_type);
    if file.bytes.len() > ceiling {
        return Err(ExtractError::for_file(
            &file.filename,
            ExtractError::TooLarge {
                size: file.bytes.len(),
                max: ceiling,
            },
        ));
    }

    if file.bytes.len() <= config.chunk_size || !is_chunkable(file) {
        return extractors.extract_file(file, config).await;
    }

    let chunks = split_chunks(&file.bytes, config.chunk_size);
    let total = chunks.len();
    debug!(filename = %file.filename, chunks = total, "Extracting large file in chunks");

    let mut content = String::new();
    let mut survived = 0usize;

    for (i, chunk) in chunks.into_iter().enumerate() {
        let part = FileInput {
            filename: file.filename.clone(),
            mime_type: file.mime_type.clone(),
            bytes: chunk.to_vec(),
        };
        match extractors.extract_file(&part, config).await {
            Ok(doc) => {
                content.push_str(&doc.content);
                survived += 1;
            }
            Err(e) => {
                warn!(
                    filename = %file.filename,
                    chunk = i,
                    error = %e,
                    "Chunk extraction failed; skipping"
                );
            }
        }
    }

    if survived == 0 {
        return Err(ExtractError::for_file(
            &file.filename,
            "all chunks failed to extract",
        ));
    }

    Ok(
        ProcessedDocument::new(&file.filename, &file.mime_type, file.bytes.len() as u64, content)
            .with_source(file.bytes.clone())
            .with_chunk_count(total as u32),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_exact_multiples() {
        let data = vec![0u8; 12];
        let chunks = split_chunks(&data, 4);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 4));
    }

    #[test]
    fn test_split_remainder() {
        let data = vec![0u8; 10];
        let chunks = split_chunks(&data, 4);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 2);
    }

    #[test]
    fn test_split_respects_utf8_boundaries() {
        // 'é' is two bytes; a naive split at 3 would cut it in half.
        let text = "aaéaa";
        let chunks = split_chunks(text.as_bytes(), 3);
        for chunk in &chunks {
            assert!(std::str::from_utf8(chunk).is_ok());
        }
        let rejoined: Vec<u8> = chunks.concat();
        assert_eq!(rejoined, text.as_bytes());
    }

    #[test]
    fn test_small_input_single_chunk() {
        let chunks = split_chunks(b"tiny", 1024);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_zero_chunk_size_does_not_panic() {
        let chunks = split_chunks(b"abc", 0);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 1));
    }

    #[tokio::test]
    async fn test_chunked_extraction_concatenates() {
        let config = ProcessingConfig {
            chunk_size: 8,
            ..Default::default()
        };
        let extractors = ExtractorRegistry::with_defaults(&config);
        let file = FileInput {
            filename: "big.txt".to_string(),
            mime_type: "text/plain".to_string(),
            bytes: b"0123456789abcdefghij".to_vec(),
        };

        let doc = extract_possibly_chunked(&file, &extractors, &config)
            .await
            .unwrap();

        assert_eq!(doc.content, "0123456789abcdefghij");
        assert_eq!(doc.stats.chunk_count, Some(3));
    }

    #[tokio::test]
    async fn test_chunking_does_not_bypass_size_ceiling() {
        // Splitting an oversized file into under-ceiling pieces must not
        // smuggle it past the per-type limit.
        let config = ProcessingConfig {
            chunk_size: 4,
            max_text_size: 8,
            ..Default::default()
        };
        let extractors = ExtractorRegistry::with_defaults(&config);
        let file = FileInput {
            filename: "over.txt".to_string(),
            mime_type: "text/plain".to_string(),
            bytes: b"0123456789ab".to_vec(),
        };

        let err = extract_possibly_chunked(&file, &extractors, &config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("over.txt"));
        assert!(err.to_string().contains("too large"));
    }

    #[tokio::test]
    async fn test_container_formats_never_chunked() {
        let config = ProcessingConfig {
            chunk_size: 8,
            ..Default::default()
        };
        let file = FileInput {
            filename: "doc.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![0u8; 100],
        };
        assert!(!is_chunkable(&file));
    }
}
