//! Document extractor — word-processor files converted to plain text.

use std::io::Write;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;

use parley_core::defaults::EXTRACTION_CMD_TIMEOUT_SECS;
use parley_core::{
    file_extension, ContentExtractor, ContentMetadata, DocumentFormat, Error, ExtractionOutcome,
    ExtractionStrategy, Result,
};

use super::{normalize_text, run_cmd_with_timeout};

/// Extractor for word-processor documents.
///
/// OOXML (.docx) goes through `pandoc --to plain`; legacy binary (.doc)
/// through `catdoc`. Raw text only, no formatting — metadata marks the
/// container format and nothing else. Conversion failures propagate to the
/// pipeline boundary.
pub struct DocumentExtractor;

const OOXML_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Container format from MIME type, with extension fallback for generic
/// declared types.
fn document_format(mime_type: &str, filename: &str) -> Result<DocumentFormat> {
    match mime_type {
        "application/msword" => return Ok(DocumentFormat::LegacyBinary),
        OOXML_MIME => return Ok(DocumentFormat::Ooxml),
        _ => {}
    }
    match file_extension(filename).as_deref() {
        Some("doc") => Ok(DocumentFormat::LegacyBinary),
        Some("docx") => Ok(DocumentFormat::Ooxml),
        _ => Err(Error::Extraction(format!(
            "Unrecognized word-processor format: {} ({})",
            mime_type, filename
        ))),
    }
}

#[async_trait]
impl ContentExtractor for DocumentExtractor {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Document
    }

    async fn extract(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<ExtractionOutcome> {
        if data.is_empty() {
            return Err(Error::InvalidInput(
                "Cannot convert empty document".to_string(),
            ));
        }

        let format = document_format(mime_type, filename)?;

        let mut tmpfile = NamedTempFile::new()
            .map_err(|e| Error::Extraction(format!("Failed to create temp file: {}", e)))?;
        tmpfile
            .write_all(data)
            .map_err(|e| Error::Extraction(format!("Failed to write temp file: {}", e)))?;
        let tmp_path = tmpfile.path().to_string_lossy().to_string();

        let raw = match format {
            DocumentFormat::Ooxml => {
                run_cmd_with_timeout(
                    Command::new("pandoc")
                        .arg("--from")
                        .arg("docx")
                        .arg("--to")
                        .arg("plain")
                        .arg(&tmp_path),
                    EXTRACTION_CMD_TIMEOUT_SECS,
                )
                .await?
            }
            DocumentFormat::LegacyBinary => {
                run_cmd_with_timeout(
                    Command::new("catdoc").arg(&tmp_path),
                    EXTRACTION_CMD_TIMEOUT_SECS,
                )
                .await?
            }
        };

        let text = normalize_text(&raw);

        Ok(ExtractionOutcome::completed(
            text,
            ContentMetadata::Document { format },
        ))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(
            run_cmd_with_timeout(Command::new("pandoc").arg("--version"), 5)
                .await
                .is_ok(),
        )
    }

    fn name(&self) -> &str {
        "document"
    }
}
