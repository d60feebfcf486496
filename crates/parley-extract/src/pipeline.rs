//! Extraction pipeline — the single entry point for file processing.

use std::sync::Arc;

use tracing::{error, info};

use parley_core::{ExtractionOutcome, ExtractionStrategy};

use crate::extractors::{
    AudioExtractor, DocumentExtractor, ImageExtractor, PdfExtractor, TextExtractor,
    VideoExtractor,
};
use crate::registry::ExtractorRegistry;

/// Coordinates classification, dispatch, and failure normalization for one
/// file.
///
/// `process_file` is the pipeline's entire public surface and it never
/// errors past its own boundary: extraction failure is data, not control
/// flow, because the caller's job is to persist exactly one terminal state
/// regardless of what went wrong.
pub struct ExtractionPipeline {
    registry: ExtractorRegistry,
}

impl ExtractionPipeline {
    /// Create a pipeline over an explicit registry.
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self { registry }
    }

    /// Create a pipeline with the full extractor set, wiring the audio
    /// extractor from the environment.
    pub fn from_env() -> Self {
        let mut registry = ExtractorRegistry::new();
        registry.register(Arc::new(ImageExtractor));
        registry.register(Arc::new(PdfExtractor));
        registry.register(Arc::new(DocumentExtractor));
        registry.register(Arc::new(TextExtractor));
        registry.register(Arc::new(AudioExtractor::from_env()));
        registry.register(Arc::new(VideoExtractor));
        Self::new(registry)
    }

    /// Process one file into exactly one terminal outcome.
    pub async fn process_file(
        &self,
        data: &[u8],
        content_type: &str,
        filename: &str,
    ) -> ExtractionOutcome {
        let Some(strategy) = ExtractionStrategy::classify(content_type, filename) else {
            return ExtractionOutcome::failed(format!(
                "Unsupported file type: {}",
                content_type
            ));
        };

        let outcome = match self
            .registry
            .extract(strategy, data, filename, content_type)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    subsystem = "extract",
                    component = "pipeline",
                    strategy = %strategy,
                    filename,
                    error = %e,
                    "Extraction failed"
                );
                ExtractionOutcome::failed(e.to_string())
            }
        };

        info!(
            subsystem = "extract",
            component = "pipeline",
            op = "process_file",
            strategy = %strategy,
            filename,
            success = !outcome.is_failed(),
            byte_size = outcome.extracted_content.len(),
            "Processed file"
        );

        outcome
    }

    /// Access the underlying registry (health checks, introspection).
    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }
}
