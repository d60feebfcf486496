//! Structured logging schema and field name constants for parley.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → job → sub-calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "extract", "inference"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pipeline", "worker", "sweep", "relay", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "process_file", "upload", "chat", "generate_title"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Attachment UUID being operated on.
pub const ATTACHMENT_ID: &str = "attachment_id";

/// Conversation UUID being operated on.
pub const CONVERSATION_ID: &str = "conversation_id";

/// Extraction strategy selected for a file.
pub const STRATEGY: &str = "strategy";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of an uploaded file or extracted text.
pub const BYTE_SIZE: &str = "byte_size";

/// Number of events forwarded on a relay stream.
pub const EVENT_COUNT: &str = "event_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
