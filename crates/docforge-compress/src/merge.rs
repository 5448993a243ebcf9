//! Merging multiple processed documents into one.

use tracing::{debug, instrument};

use docforge_core::{MergeOptions, ProcessedDocument};

use crate::{CompressError, Result};

const PAGE_BREAK: &str = "\n\n--- Page Break ---\n\n";
const PLAIN_SEPARATOR: &str = "\n\n";

/// Concatenate documents in input order into a single new document.
///
/// Word and character counts are recounted over the merged text; the byte
/// size is the sum of the source sizes, since merged text length is not a
/// meaningful stand-in for the original binaries.
#[instrument(skip(documents, options), fields(count = documents.len()))]
pub fn merge_documents(
    documents: &[ProcessedDocument],
    options: &MergeOptions,
) -> Result<ProcessedDocument> {
    if documents.is_empty() {
        return Err(CompressError::EmptyInput);
    }

    let mut body = String::new();

    if let Some(title) = &options.title {
        body.push_str(title);
        body.push('\n');
        if let Some(author) = &options.author {
            body.push_str(author);
            body.push('\n');
        }
        body.push('\n');
    }

    let separator = if options.add_page_breaks {
        PAGE_BREAK
    } else {
        PLAIN_SEPARATOR
    };

    for (i, doc) in documents.iter().enumerate() {
        if i > 0 {
            body.push_str(separator);
        }
        if options.include_metadata {
            body.push_str(&format!(
                "=== {} ===\nType: {}\nSize: {} bytes\nWords: {}\n\n",
                doc.name, doc.mime_type, doc.size, doc.stats.word_count
            ));
        }
        body.push_str(&doc.content);
    }

    let name = options
        .title
        .clone()
        .unwrap_or_else(|| "Merged Document".to_string());
    let total_size: u64 = documents.iter().map(|d| d.size).sum();

    let merged = ProcessedDocument::new(name, options.output_type.clone(), total_size, body);
    debug!(
        merged_id = %merged.id,
        words = merged.stats.word_count,
        size = merged.size,
        "Merge complete"
    );

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(name: &str, content: &str, size: u64) -> ProcessedDocument {
        ProcessedDocument::new(name, "text/plain", size, content)
    }

    #[test]
    fn test_merge_order_preserved() {
        let docs = vec![doc("a.txt", "alpha", 10), doc("b.txt", "beta", 20)];
        let merged = merge_documents(&docs, &MergeOptions::default()).unwrap();

        assert_eq!(merged.content, "alpha\n\nbeta");
        assert_eq!(merged.size, 30);
    }

    #[test]
    fn test_separator_never_after_last() {
        let docs = vec![
            doc("a.txt", "one", 1),
            doc("b.txt", "two", 1),
            doc("c.txt", "three", 1),
        ];
        let options = MergeOptions {
            add_page_breaks: true,
            ..Default::default()
        };
        let merged = merge_documents(&docs, &options).unwrap();

        assert_eq!(merged.content.matches("--- Page Break ---").count(), 2);
        assert!(merged.content.ends_with("three"));
    }

    #[test]
    fn test_metadata_headers() {
        let docs = vec![doc("report.txt", "two words", 9)];
        let options = MergeOptions {
            include_metadata: true,
            ..Default::default()
        };
        let merged = merge_documents(&docs, &options).unwrap();

        assert!(merged.content.contains("=== report.txt ==="));
        assert!(merged.content.contains("Type: text/plain"));
        assert!(merged.content.contains("Size: 9 bytes"));
        assert!(merged.content.contains("Words: 2"));
    }

    #[test]
    fn test_counts_recomputed_over_merged_text() {
        let docs = vec![doc("a.txt", "one two", 7), doc("b.txt", "three", 5)];
        let merged = merge_documents(&docs, &MergeOptions::default()).unwrap();

        assert_eq!(merged.stats.word_count, 3);
        assert_eq!(merged.size, 12);
    }

    #[test]
    fn test_title_and_author_banner() {
        let docs = vec![doc("a.txt", "body", 4)];
        let options = MergeOptions {
            title: Some("Quarterly Bundle".to_string()),
            author: Some("Ops".to_string()),
            ..Default::default()
        };
        let merged = merge_documents(&docs, &options).unwrap();

        assert!(merged.content.starts_with("Quarterly Bundle\nOps\n\n"));
        assert_eq!(merged.name, "Quarterly Bundle");
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(merge_documents(&[], &MergeOptions::default()).is_err());
    }

    #[test]
    fn test_single_document_no_separator() {
        let docs = vec![doc("only.txt", "solo", 4)];
        let options = MergeOptions {
            add_page_breaks: true,
            ..Default::default()
        };
        let merged = merge_documents(&docs, &options).unwrap();
        assert_eq!(merged.content, "solo");
    }
}
