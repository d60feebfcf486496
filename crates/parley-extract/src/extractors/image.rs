//! Image extractor — visual reference placeholder.

use async_trait::async_trait;

use parley_core::{
    ContentExtractor, ContentMetadata, ExtractionOutcome, ExtractionStrategy, Result,
};

/// Extractor for image files.
///
/// No OCR engine is wired into this pipeline, so images complete with a
/// descriptive placeholder: the attachment remains usable as a visual
/// reference and its byte size is recorded in metadata.
pub struct ImageExtractor;

#[async_trait]
impl ContentExtractor for ImageExtractor {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Image
    }

    async fn extract(
        &self,
        data: &[u8],
        filename: &str,
        _mime_type: &str,
    ) -> Result<ExtractionOutcome> {
        let content = format!(
            "[Image: {}. Attached as a visual reference; text recognition is not part of this pipeline.]",
            filename
        );

        Ok(ExtractionOutcome::completed(
            content,
            ContentMetadata::Image {
                byte_size: data.len(),
            },
        ))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true) // No external dependencies
    }

    fn name(&self) -> &str {
        "image"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::AttachmentStatus;

    #[tokio::test]
    async fn test_image_placeholder() {
        let extractor = ImageExtractor;
        let result = extractor
            .extract(&[0u8; 2048], "roadmap.png", "image/png")
            .await
            .unwrap();

        assert_eq!(result.status, AttachmentStatus::Completed);
        assert!(result.extracted_content.contains("roadmap.png"));
        assert_eq!(
            result.metadata,
            Some(ContentMetadata::Image { byte_size: 2048 })
        );
    }
}
