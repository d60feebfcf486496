//! Ollama generation backend (title generation).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use parley_core::defaults::{GEN_MODEL, GEN_TIMEOUT_SECS, OLLAMA_URL};
use parley_core::{Error, GenerationBackend, Result};

/// Ollama inference backend.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    gen_model: String,
    gen_timeout_secs: u64,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

impl OllamaBackend {
    /// Create a new Ollama backend with custom configuration.
    pub fn with_config(base_url: String, gen_model: String) -> Self {
        let gen_timeout_secs = std::env::var("GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(GEN_TIMEOUT_SECS);

        info!(
            subsystem = "inference",
            component = "ollama",
            base_url = %base_url,
            model = %gen_model,
            "Initializing Ollama backend"
        );

        Self {
            client: Client::new(),
            base_url,
            gen_model,
            gen_timeout_secs,
        }
    }

    /// Create from environment variables (with defaults).
    pub fn from_env() -> Self {
        let base_url = std::env::var("OLLAMA_URL").unwrap_or_else(|_| OLLAMA_URL.to_string());
        let gen_model = std::env::var("GEN_MODEL").unwrap_or_else(|_| GEN_MODEL.to_string());
        Self::with_config(base_url, gen_model)
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let request = ChatRequest {
            model: self.gen_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(Duration::from_secs(self.gen_timeout_secs))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!(
                        "Generation exceeded {}s",
                        self.gen_timeout_secs
                    ))
                } else {
                    Error::Inference(format!("Generation request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(result.message.content)
    }

    fn model_name(&self) -> &str {
        &self.gen_model
    }
}
