//! Audio extractor — transcription via a Whisper-compatible backend.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use parley_core::{
    ContentExtractor, ContentMetadata, ExtractionOutcome, ExtractionStrategy, Result,
};
use parley_inference::transcription::{TranscriptionBackend, WhisperBackend};

use super::normalize_text;

/// Extractor for audio files.
///
/// Without a configured transcription backend, audio attachments complete
/// with a degraded placeholder — the attachment is still usable, just
/// without a transcript. With a backend, service failures become terminal
/// `failed` outcomes carrying the service's error message; they are data
/// here, never control flow.
pub struct AudioExtractor {
    backend: Option<Arc<dyn TranscriptionBackend>>,
}

impl AudioExtractor {
    /// Create a new extractor with the given transcription backend.
    pub fn new(backend: Option<Arc<dyn TranscriptionBackend>>) -> Self {
        Self { backend }
    }

    /// Create from environment variables. The backend is absent when
    /// `WHISPER_BASE_URL` is not set.
    pub fn from_env() -> Self {
        Self::new(
            WhisperBackend::from_env().map(|b| Arc::new(b) as Arc<dyn TranscriptionBackend>),
        )
    }
}

#[async_trait]
impl ContentExtractor for AudioExtractor {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Audio
    }

    async fn extract(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<ExtractionOutcome> {
        let Some(backend) = &self.backend else {
            return Ok(ExtractionOutcome::completed(
                format!(
                    "[Audio: {}. Transcription is unavailable because no transcription backend is configured.]",
                    filename
                ),
                ContentMetadata::Audio {
                    transcript_available: false,
                    duration_secs: None,
                    language: None,
                },
            ));
        };

        match backend.transcribe(data, mime_type, None).await {
            Ok(transcription) => {
                let content = normalize_text(&format!(
                    "[Transcription of {}]\n\n{}",
                    filename, transcription.full_text
                ));
                Ok(ExtractionOutcome::completed(
                    content,
                    ContentMetadata::Audio {
                        transcript_available: true,
                        duration_secs: transcription.duration_secs,
                        language: transcription.language,
                    },
                ))
            }
            Err(e) => {
                warn!(filename, error = %e, "Transcription service failed");
                Ok(ExtractionOutcome::failed(format!(
                    "Transcription failed: {}",
                    e
                )))
            }
        }
    }

    async fn health_check(&self) -> Result<bool> {
        match &self.backend {
            Some(backend) => backend.health_check().await,
            None => Ok(true), // Degraded mode has nothing to check
        }
    }

    fn name(&self) -> &str {
        "audio"
    }
}
