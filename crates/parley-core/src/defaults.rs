//! Centralized default constants for the parley system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates reference these constants instead of defining their
//! own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Maximum upload size accepted at the transport boundary (25 MiB).
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// =============================================================================
// CONVERSATIONS
// =============================================================================

/// Title assigned to a conversation at creation. Auto-titling only runs
/// while the title still equals this placeholder.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New conversation";

/// Minimum number of persisted turns before auto-titling is attempted.
pub const TITLE_MIN_TURNS: i64 = 2;

/// Number of leading turns fed to the title generator.
pub const TITLE_SOURCE_TURNS: i64 = 4;

/// Maximum generated title length in characters.
pub const TITLE_MAX_LENGTH: usize = 80;

/// Minimum generated title length; shorter results are discarded.
pub const TITLE_MIN_LENGTH: usize = 3;

// =============================================================================
// EXTRACTION WORKERS
// =============================================================================

/// Maximum concurrent extraction workers.
pub const EXTRACT_MAX_WORKERS: usize = 4;

/// Capacity of the in-process extraction queue.
pub const EXTRACT_QUEUE_CAPACITY: usize = 64;

/// Overall deadline for one extraction job (load + extract + persist).
pub const EXTRACTION_JOB_TIMEOUT_SECS: u64 = 300;

/// Per-invocation timeout for external extraction commands
/// (pdftotext, pdfinfo, pandoc).
pub const EXTRACTION_CMD_TIMEOUT_SECS: u64 = 60;

/// Capacity of the worker event broadcast channel.
pub const WORKER_EVENT_CAPACITY: usize = 256;

// =============================================================================
// RECONCILIATION SWEEP
// =============================================================================

/// Interval between reconciliation sweeps for stuck attachments.
pub const SWEEP_INTERVAL_SECS: u64 = 60;

/// Age past which a `processing` attachment is considered stuck.
pub const STUCK_THRESHOLD_SECS: u64 = 600;

/// Maximum re-queue attempts before a stuck attachment is failed outright.
pub const EXTRACT_MAX_RETRIES: i32 = 3;

// =============================================================================
// TRANSCRIPTION (Whisper-compatible)
// =============================================================================

/// Environment variable naming the Whisper-compatible base URL.
/// Unset (or empty) means transcription is unavailable and audio
/// attachments complete with a degraded placeholder.
pub const ENV_WHISPER_BASE_URL: &str = "WHISPER_BASE_URL";

/// Environment variable naming the Whisper model slug.
pub const ENV_WHISPER_MODEL: &str = "WHISPER_MODEL";

/// Default Whisper model when only the base URL is configured.
pub const DEFAULT_WHISPER_MODEL: &str = "Systran/faster-distil-whisper-large-v3";

/// Timeout for one transcription request (long audio is slow).
pub const TRANSCRIBE_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// AGENT ORCHESTRATOR
// =============================================================================

/// Environment variable naming the orchestrator base URL.
pub const ENV_ORCHESTRATOR_URL: &str = "AGENT_ORCHESTRATOR_URL";

/// Default orchestrator base URL.
pub const DEFAULT_ORCHESTRATOR_URL: &str = "http://127.0.0.1:8200";

/// Overall deadline for one orchestrator exchange (stream + final result).
pub const ORCHESTRATOR_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// GENERATION (title service)
// =============================================================================

/// Default Ollama endpoint.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default generation model for title generation.
pub const GEN_MODEL: &str = "gpt-oss:20b";

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 60;
