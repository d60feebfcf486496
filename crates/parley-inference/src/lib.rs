//! # parley-inference
//!
//! External model plumbing for parley:
//! - Whisper-compatible audio transcription
//! - Agent orchestrator client (SSE streaming)
//! - Ollama generation backend and the title service built on it

pub mod generation;
pub mod orchestrator;
pub mod titling;
pub mod transcription;

pub use generation::OllamaBackend;
pub use orchestrator::{
    parse_sse_frame, AgentOrchestrator, EventSink, HttpOrchestrator, SseFrame,
};
pub use titling::{sanitize_title, title_prompt, TitleService};
pub use transcription::{TranscriptionBackend, TranscriptionResult, WhisperBackend};
