//! CSV extractor.
//!
//! Output deliberately contains the literal CSV text (not a reformatted
//! table) so downstream analysis sees exactly what the file said; the row
//! count and detected column names are prepended as a summary.

use async_trait::async_trait;

use crate::extractor::{ContentExtractor, ExtractedText};
use crate::text::PlainTextExtractor;
use crate::Result;

pub struct CsvExtractor;

impl CsvExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Split one CSV record, honouring double-quoted fields.
    fn split_record(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '"' if in_quotes && chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    fields.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        fields.push(current.trim().to_string());
        fields
    }

    /// Header heuristic: the first record is a header when every field is
    /// non-empty and none parses as a number.
    fn looks_like_header(fields: &[String]) -> bool {
        !fields.is_empty()
            && fields
                .iter()
                .all(|f| !f.is_empty() && f.parse::<f64>().is_err())
    }
}

impl Default for CsvExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for CsvExtractor {
    async fn extract(&self, content: &[u8], _filename: &str) -> Result<ExtractedText> {
        let (text, _) = PlainTextExtractor::decode(content);

        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            return Ok(ExtractedText::new("Rows: 0\nColumns: (none)\n"));
        }

        let first = Self::split_record(lines[0]);
        let has_header = Self::looks_like_header(&first);
        let row_count = if has_header {
            lines.len() - 1
        } else {
            lines.len()
        };
        let columns = if has_header {
            first.join(", ")
        } else {
            (1..=first.len())
                .map(|i| format!("column_{}", i))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let output = format!("Rows: {}\nColumns: {}\n\n{}", row_count, columns, text);

        Ok(ExtractedText::new(output)
            .with_metadata("row_count", serde_json::json!(row_count))
            .with_metadata("has_header", serde_json::json!(has_header)))
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["text/csv", "application/csv"]
    }

    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["csv", "tsv"]
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
