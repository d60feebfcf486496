//! PDF extractor — text extraction via `pdftotext` (poppler-utils).

use std::collections::BTreeMap;
use std::io::Write;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::warn;

use parley_core::defaults::EXTRACTION_CMD_TIMEOUT_SECS;
use parley_core::{
    ContentExtractor, ContentMetadata, Error, ExtractionOutcome, ExtractionStrategy, Result,
};

use super::{normalize_text, run_cmd_with_timeout};

/// Extractor for PDF files using `pdftotext` and `pdfinfo`.
///
/// Parser failures (invalid header, pdftotext exit codes, command timeout)
/// propagate as errors; the pipeline boundary converts them into a terminal
/// `failed` outcome. A missing `pdfinfo` only costs metadata, never the
/// extraction itself.
pub struct PdfExtractor;

/// Parse `pdfinfo` output into page count and a key/value info map.
fn parse_pdfinfo(output: &str) -> (Option<u64>, BTreeMap<String, String>) {
    let mut page_count = None;
    let mut info = BTreeMap::new();

    for line in output.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_lowercase().replace(' ', "_");
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if key == "pages" {
                if let Ok(pages) = value.parse::<u64>() {
                    page_count = Some(pages);
                    continue;
                }
            }
            info.insert(key, value.to_string());
        }
    }

    (page_count, info)
}

#[async_trait]
impl ContentExtractor for PdfExtractor {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Pdf
    }

    async fn extract(
        &self,
        data: &[u8],
        filename: &str,
        _mime_type: &str,
    ) -> Result<ExtractionOutcome> {
        if data.is_empty() {
            return Err(Error::InvalidInput(
                "Cannot extract text from empty PDF data".to_string(),
            ));
        }

        // Validate PDF magic bytes (%PDF)
        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(Error::InvalidInput(format!(
                "File '{}' is not a valid PDF (missing %PDF header)",
                filename
            )));
        }

        // Write data to a temporary file (pdftotext reads from file path)
        let mut tmpfile = NamedTempFile::new()
            .map_err(|e| Error::Extraction(format!("Failed to create temp file: {}", e)))?;
        tmpfile
            .write_all(data)
            .map_err(|e| Error::Extraction(format!("Failed to write temp file: {}", e)))?;
        let tmp_path = tmpfile.path().to_string_lossy().to_string();

        // Document info from pdfinfo; metadata-only, extraction continues
        // without it
        let (page_count, document_info) = match run_cmd_with_timeout(
            Command::new("pdfinfo").arg(&tmp_path),
            EXTRACTION_CMD_TIMEOUT_SECS,
        )
        .await
        {
            Ok(output) => parse_pdfinfo(&output),
            Err(e) => {
                warn!(filename, error = %e, "pdfinfo failed, continuing without metadata");
                (None, BTreeMap::new())
            }
        };

        let raw = run_cmd_with_timeout(
            Command::new("pdftotext").arg(&tmp_path).arg("-"),
            EXTRACTION_CMD_TIMEOUT_SECS,
        )
        .await?;

        let text = normalize_text(&raw);

        Ok(ExtractionOutcome::completed(
            text,
            ContentMetadata::Pdf {
                page_count,
                document_info,
            },
        ))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(
            run_cmd_with_timeout(Command::new("pdftotext").arg("-v"), 5)
                .await
                .is_ok(),
        )
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_data_is_rejected() {
        let extractor = PdfExtractor;
        let result = extractor.extract(b"", "report.pdf", "application/pdf").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_magic_bytes_rejected() {
        let extractor = PdfExtractor;
        let err = extractor
            .extract(b"not a pdf at all", "report.pdf", "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("%PDF"));
    }

    #[test]
    fn test_parse_pdfinfo() {
        let output = "Title:          Q3 Forecast\nPages:          12\nEncrypted:      no\nEmpty:\n";
        let (pages, info) = parse_pdfinfo(output);
        assert_eq!(pages, Some(12));
        assert_eq!(info.get("title").map(String::as_str), Some("Q3 Forecast"));
        assert_eq!(info.get("encrypted").map(String::as_str), Some("no"));
        assert!(!info.contains_key("pages"));
        assert!(!info.contains_key("empty"));
    }

    #[test]
    fn test_parse_pdfinfo_non_numeric_pages() {
        let (pages, info) = parse_pdfinfo("Pages: many\n");
        assert_eq!(pages, None);
        assert_eq!(info.get("pages").map(String::as_str), Some("many"));
    }
}
