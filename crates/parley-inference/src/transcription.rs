//! Transcription backend traits and implementations for audio-to-text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use parley_core::defaults::{
    DEFAULT_WHISPER_MODEL, ENV_WHISPER_BASE_URL, ENV_WHISPER_MODEL, TRANSCRIBE_TIMEOUT_SECS,
};
use parley_core::{Error, Result};

/// Result of audio transcription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionResult {
    /// Full transcribed text.
    pub full_text: String,
    /// Detected language (ISO 639-1 code).
    pub language: Option<String>,
    /// Total audio duration in seconds.
    pub duration_secs: Option<f64>,
}

/// Backend for transcribing audio files.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe audio data.
    async fn transcribe(
        &self,
        audio_data: &[u8],
        mime_type: &str,
        language: Option<&str>,
    ) -> Result<TranscriptionResult>;

    /// Check if the transcription backend is available.
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible Whisper backend (works with Speaches/faster-whisper-server).
pub struct WhisperBackend {
    base_url: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl WhisperBackend {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
            timeout_secs: TRANSCRIBE_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    /// Returns None if WHISPER_BASE_URL is not set.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(ENV_WHISPER_BASE_URL).ok()?;
        if base_url.is_empty() {
            return None;
        }
        let model = std::env::var(ENV_WHISPER_MODEL)
            .unwrap_or_else(|_| DEFAULT_WHISPER_MODEL.to_string());
        Some(Self::new(base_url, model))
    }
}

/// OpenAI Whisper API response format.
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[async_trait]
impl TranscriptionBackend for WhisperBackend {
    async fn transcribe(
        &self,
        audio_data: &[u8],
        mime_type: &str,
        language: Option<&str>,
    ) -> Result<TranscriptionResult> {
        let url = format!("{}/v1/audio/transcriptions", self.base_url);

        // Determine file extension from MIME type
        let ext = match mime_type {
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/wav" | "audio/x-wav" => "wav",
            "audio/mp4" | "audio/x-m4a" => "m4a",
            "audio/ogg" => "ogg",
            "audio/flac" => "flac",
            "audio/webm" => "webm",
            _ => "wav",
        };

        let file_part = reqwest::multipart::Part::bytes(audio_data.to_vec())
            .file_name(format!("audio.{}", ext))
            .mime_str(mime_type)
            .map_err(|e| Error::Transcription(format!("Failed to create multipart: {}", e)))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Transcription(format!("Transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transcription(format!(
                "Whisper API returned {}: {}",
                status, body
            )));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            Error::Transcription(format!("Failed to parse whisper response: {}", e))
        })?;

        Ok(TranscriptionResult {
            full_text: result.text,
            language: result.language,
            duration_secs: result.duration,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
