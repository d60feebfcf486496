//! Video extractor — explicit scope-boundary placeholder.

use async_trait::async_trait;

use parley_core::{
    ContentExtractor, ContentMetadata, ExtractionOutcome, ExtractionStrategy, Result,
};

/// Extractor for video files.
///
/// Frame and audio-track tooling is not present in this pipeline, so video
/// attachments always complete with a placeholder. This is a scope
/// boundary, not a failure: the attachment stays visible and usable as a
/// reference.
pub struct VideoExtractor;

#[async_trait]
impl ContentExtractor for VideoExtractor {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Video
    }

    async fn extract(
        &self,
        _data: &[u8],
        filename: &str,
        _mime_type: &str,
    ) -> Result<ExtractionOutcome> {
        let content = format!(
            "[Video: {}. Video processing requires additional tooling not present in this pipeline.]",
            filename
        );

        Ok(ExtractionOutcome::completed(content, ContentMetadata::Video))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true) // No external dependencies
    }

    fn name(&self) -> &str {
        "video"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::AttachmentStatus;

    #[tokio::test]
    async fn test_video_placeholder_completes() {
        let extractor = VideoExtractor;
        let result = extractor
            .extract(b"\x00\x00\x00", "demo.mp4", "video/mp4")
            .await
            .unwrap();

        assert_eq!(result.status, AttachmentStatus::Completed);
        assert!(result.extracted_content.contains("demo.mp4"));
        assert_eq!(result.metadata, Some(ContentMetadata::Video));
    }
}
