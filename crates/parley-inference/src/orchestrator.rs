//! Agent orchestrator client.
//!
//! The orchestrator is a black box to this system: it consumes an
//! `AgentRequest` and produces a stream of opaque JSON events plus one
//! final result. The relay forwards the events verbatim, so nothing here
//! interprets event payloads beyond recognizing the terminal frame.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;
use tracing::debug;

use parley_core::defaults::{
    DEFAULT_ORCHESTRATOR_URL, ENV_ORCHESTRATOR_URL, ORCHESTRATOR_TIMEOUT_SECS,
};
use parley_core::{AgentRequest, Error, Result};

/// Sink for incremental orchestrator events. Sends fail silently when the
/// receiving stream is gone (client disconnect); the exchange still runs to
/// completion and its result is discarded by the caller.
pub type EventSink = mpsc::Sender<JsonValue>;

/// Orchestrator interface: one request in, a stream of events out, one
/// final result.
#[async_trait]
pub trait AgentOrchestrator: Send + Sync {
    /// Process one chat turn. Events are delivered through `events` in
    /// emission order; the resolved value is the final result.
    async fn process_query(&self, request: AgentRequest, events: EventSink) -> Result<JsonValue>;
}

/// One parsed frame of the orchestrator's SSE stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    /// An incremental event, forwarded verbatim.
    Event(JsonValue),
    /// The terminal frame carrying the final result.
    Final(JsonValue),
}

/// Parse one SSE line into a frame. Blank lines, comments, and `[DONE]`
/// markers yield nothing; malformed JSON is an error.
pub fn parse_sse_frame(line: &str) -> Result<Option<SseFrame>> {
    let line = line.trim();

    if line.is_empty() || line.starts_with(':') {
        return Ok(None);
    }

    let Some(data) = line.strip_prefix("data: ") else {
        return Ok(None);
    };

    if data == "[DONE]" {
        return Ok(None);
    }

    let value: JsonValue = serde_json::from_str(data)
        .map_err(|e| Error::Inference(format!("Failed to parse orchestrator frame: {}", e)))?;

    if value.get("type").and_then(|t| t.as_str()) == Some("final") {
        let result = value.get("data").cloned().unwrap_or(JsonValue::Null);
        return Ok(Some(SseFrame::Final(result)));
    }

    Ok(Some(SseFrame::Event(value)))
}

/// HTTP orchestrator client speaking SSE.
pub struct HttpOrchestrator {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpOrchestrator {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
            timeout_secs: ORCHESTRATOR_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var(ENV_ORCHESTRATOR_URL)
            .unwrap_or_else(|_| DEFAULT_ORCHESTRATOR_URL.to_string());
        Self::new(base_url)
    }

    /// Override the overall exchange deadline.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    async fn exchange(&self, request: &AgentRequest, events: &EventSink) -> Result<JsonValue> {
        let url = format!("{}/v1/agent/query", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Orchestrator request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Orchestrator returned {}: {}",
                status, body
            )));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut final_result = None;
        let mut event_count: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::Inference(format!("Orchestrator stream error: {}", e)))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            // Frames are newline-delimited; a chunk may carry partial lines
            while let Some(pos) = buffer.find('\n') {
                let line: String = buffer.drain(..=pos).collect();
                match parse_sse_frame(&line)? {
                    Some(SseFrame::Event(event)) => {
                        event_count += 1;
                        // Receiver gone means the client disconnected;
                        // keep draining so the final result still resolves
                        let _ = events.send(event).await;
                    }
                    Some(SseFrame::Final(result)) => {
                        final_result = Some(result);
                    }
                    None => {}
                }
            }
        }

        debug!(
            subsystem = "inference",
            component = "orchestrator",
            event_count,
            "Orchestrator stream drained"
        );

        final_result
            .ok_or_else(|| Error::Inference("Orchestrator stream ended without a final frame".into()))
    }
}

#[async_trait]
impl AgentOrchestrator for HttpOrchestrator {
    async fn process_query(&self, request: AgentRequest, events: EventSink) -> Result<JsonValue> {
        tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            self.exchange(&request, &events),
        )
        .await
        .map_err(|_| {
            Error::Timeout(format!(
                "Orchestrator exchange exceeded {}s",
                self.timeout_secs
            ))
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> AgentRequest {
        AgentRequest {
            conversation_id: Uuid::now_v7(),
            message: "What changed in the Q3 forecast?".to_string(),
            history: vec![],
        }
    }

    #[test]
    fn test_parse_frame_event() {
        let frame = parse_sse_frame(r#"data: {"type":"token","content":"Hi"}"#)
            .unwrap()
            .unwrap();
        match frame {
            SseFrame::Event(value) => assert_eq!(value["content"], "Hi"),
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_frame_final() {
        let frame = parse_sse_frame(r#"data: {"type":"final","data":{"content":"done"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            frame,
            SseFrame::Final(serde_json::json!({"content": "done"}))
        );
    }

    #[test]
    fn test_parse_frame_skips_noise() {
        assert_eq!(parse_sse_frame("").unwrap(), None);
        assert_eq!(parse_sse_frame(": keepalive").unwrap(), None);
        assert_eq!(parse_sse_frame("data: [DONE]").unwrap(), None);
        assert_eq!(parse_sse_frame("event: message").unwrap(), None);
    }

    #[test]
    fn test_parse_frame_malformed_json() {
        assert!(parse_sse_frame("data: {broken").is_err());
    }

    #[tokio::test]
    async fn test_process_query_streams_events_in_order() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"type\":\"token\",\"content\":\"The\"}\n\n",
            "data: {\"type\":\"token\",\"content\":\" forecast\"}\n\n",
            "data: {\"type\":\"tool_use\",\"name\":\"crm_lookup\"}\n\n",
            "data: {\"type\":\"final\",\"data\":{\"content\":\"The forecast moved.\"}}\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/v1/agent/query"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let orchestrator = HttpOrchestrator::new(server.uri());
        let (tx, mut rx) = mpsc::channel(16);
        let result = orchestrator.process_query(request(), tx).await.unwrap();

        assert_eq!(result["content"], "The forecast moved.");

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["content"], "The");
        assert_eq!(events[1]["content"], " forecast");
        assert_eq!(events[2]["type"], "tool_use");
    }

    #[tokio::test]
    async fn test_process_query_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/agent/query"))
            .respond_with(ResponseTemplate::new(500).set_body_string("agent crashed"))
            .mount(&server)
            .await;

        let orchestrator = HttpOrchestrator::new(server.uri());
        let (tx, _rx) = mpsc::channel(16);
        let err = orchestrator.process_query(request(), tx).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_process_query_missing_final_frame() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/agent/query"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("data: {\"type\":\"token\",\"content\":\"hi\"}\n\n"),
            )
            .mount(&server)
            .await;

        let orchestrator = HttpOrchestrator::new(server.uri());
        let (tx, _rx) = mpsc::channel(16);
        let err = orchestrator.process_query(request(), tx).await.unwrap_err();
        assert!(err.to_string().contains("without a final frame"));
    }
}
