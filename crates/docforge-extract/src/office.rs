//! Word-processor and spreadsheet extractors.
//!
//! Both modern formats are OOXML zip containers; the extractors open the
//! archive and strip the relevant XML parts down to text. Styling is
//! discarded by design.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read};
use tracing::debug;

use crate::extractor::{ContentExtractor, ExtractedText};
use crate::{ExtractError, Result};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static PRINTABLE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x20-\x7E]{4,}").unwrap());
static SHEET_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<sheet\b[^>]*>").unwrap());
static NAME_ATTR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"name="([^"]*)""#).unwrap());
static SHARED_STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<t[^>]*>(.*?)</t>").unwrap());
static ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<row[^>]*>(.*?)</row>").unwrap());
static CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<c\b([^>]*?)(?:/>|>(.*?)</c>)").unwrap());
static CELL_VALUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<v>(.*?)</v>").unwrap());
static INLINE_STR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<t[^>]*>(.*?)</t>").unwrap());

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Read one entry out of a zip container held in memory.
fn read_zip_entry(bytes: &[u8], path: &str) -> Result<Option<String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::MalformedContainer(e.to_string()))?;

    // The entry borrows the archive; keep it scoped to the statement.
    let result = match archive.by_name(path) {
        Ok(mut entry) => {
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            Ok(Some(content))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(ExtractError::MalformedContainer(e.to_string())),
    };
    result
}

/// Word-processor extractor: docx via the OOXML container, legacy binary
/// `.doc` via printable-run salvage.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_docx(bytes: &[u8]) -> Result<String> {
        let xml = read_zip_entry(bytes, "word/document.xml")?.ok_or_else(|| {
            ExtractError::MalformedContainer("word/document.xml missing".to_string())
        })?;

        let xml = xml
            .replace("</w:p>", "\n")
            .replace("<w:tab/>", "\t")
            .replace("<w:br/>", "\n");

        let text = TAG_RE.replace_all(&xml, "");
        let text = decode_entities(&text);

        Ok(text
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string())
    }

    /// Legacy binary `.doc` files are not parsed structurally; salvage the
    /// printable character runs so at least the body text survives.
    fn salvage_legacy(bytes: &[u8]) -> String {
        let lossy = String::from_utf8_lossy(bytes);
        PRINTABLE_RUN_RE
            .find_iter(&lossy)
            .map(|m| m.as_str().trim())
            .filter(|run| !run.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for DocxExtractor {
    async fn extract(&self, content: &[u8], filename: &str) -> Result<ExtractedText> {
        match Self::extract_docx(content) {
            Ok(text) => {
                debug!(filename = %filename, chars = text.len(), "Extracted docx");
                Ok(ExtractedText::new(text))
            }
            Err(_) => {
                // Not a valid OOXML container; treat as legacy binary format.
                let text = Self::salvage_legacy(content);
                Ok(ExtractedText::new(text).with_warning(format!(
                    "{} is not an OOXML container; salvaged printable text only",
                    filename
                )))
            }
        }
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec![
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/msword",
        ]
    }

    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["docx", "doc"]
    }

    fn name(&self) -> &'static str {
        "wordprocessor"
    }
}

/// Spreadsheet extractor: for every sheet, a `Sheet: <name>` header followed
/// by a tab-separated rendering of the rows, sheets concatenated in file
/// order.
pub struct XlsxExtractor;

impl XlsxExtractor {
    pub fn new() -> Self {
        Self
    }

    fn sheet_names(bytes: &[u8]) -> Result<Vec<String>> {
        let workbook = read_zip_entry(bytes, "xl/workbook.xml")?
            .ok_or_else(|| ExtractError::MalformedContainer("xl/workbook.xml missing".to_string()))?;

        Ok(SHEET_TAG_RE
            .find_iter(&workbook)
            .filter_map(|tag| {
                NAME_ATTR_RE
                    .captures(tag.as_str())
                    .map(|c| decode_entities(&c[1]))
            })
            .collect())
    }

    fn shared_strings(bytes: &[u8]) -> Result<Vec<String>> {
        match read_zip_entry(bytes, "xl/sharedStrings.xml")? {
            Some(xml) => Ok(SHARED_STRING_RE
                .captures_iter(&xml)
                .map(|c| decode_entities(&c[1]))
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    fn render_sheet(xml: &str, shared: &[String]) -> String {
        let mut rows = Vec::new();
        for row in ROW_RE.captures_iter(xml) {
            let mut cells = Vec::new();
            for cell in CELL_RE.captures_iter(&row[1]) {
                let attrs = cell.get(1).map(|m| m.as_str()).unwrap_or("");
                let body = cell.get(2).map(|m| m.as_str()).unwrap_or("");

                let value = if let Some(v) = CELL_VALUE_RE.captures(body) {
                    if attrs.contains(r#"t="s""#) {
                        v[1].trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|idx| shared.get(idx).cloned())
                            .unwrap_or_default()
                    } else {
                        decode_entities(&v[1])
                    }
                } else if let Some(t) = INLINE_STR_RE.captures(body) {
                    decode_entities(&t[1])
                } else {
                    String::new()
                };
                cells.push(value);
            }
            rows.push(cells.join("\t"));
        }
        rows.join("\n")
    }
}

impl Default for XlsxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for XlsxExtractor {
    async fn extract(&self, content: &[u8], filename: &str) -> Result<ExtractedText> {
        let names = Self::sheet_names(content)?;
        let shared = Self::shared_strings(content)?;

        let mut sections = Vec::new();
        for (index, name) in names.iter().enumerate() {
            let path = format!("xl/worksheets/sheet{}.xml", index + 1);
            let rendered = match read_zip_entry(content, &path)? {
                Some(xml) => Self::render_sheet(&xml, &shared),
                None => String::new(),
            };
            sections.push(format!("Sheet: {}\n{}", name, rendered));
        }

        debug!(filename = %filename, sheets = names.len(), "Extracted spreadsheet");

        Ok(ExtractedText::new(sections.join("\n\n"))
            .with_metadata("sheet_count", serde_json::json!(names.len())))
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec![
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/vnd.ms-excel",
        ]
    }

    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["xlsx", "xls"]
    }

    fn name(&self) -> &'static str {
        "spreadsheet"
    }
}
