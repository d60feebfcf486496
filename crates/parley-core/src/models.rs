//! Core data model: attachments, extraction outcomes, conversations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ATTACHMENT LIFECYCLE
// =============================================================================

/// Processing status for attachments.
///
/// `Processing` is the only non-terminal state. An attachment transitions
/// exactly once, to `Completed` or `Failed`; re-processing is an explicit
/// operation handled by the reconciliation sweep, never an automatic
/// transition out of a terminal state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentStatus {
    #[default]
    Processing,
    Completed,
    Failed,
}

impl AttachmentStatus {
    /// Whether this status admits no further automatic transition.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl std::fmt::Display for AttachmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for AttachmentStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid attachment status: {}", s)),
        }
    }
}

/// Extraction strategy for processing file attachments.
///
/// Determines how content is extracted from an uploaded file. One strategy
/// per content family; classification is a pure function of the declared
/// MIME type and the filename extension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Visual reference placeholder (no OCR engine is wired in)
    Image,
    /// PDF text extraction using pdftotext
    Pdf,
    /// Word-processor conversion using pandoc (legacy binary or OOXML)
    Document,
    /// Plain/structured text decoded as UTF-8
    Text,
    /// Audio transcription via a Whisper-compatible backend
    Audio,
    /// Video placeholder (frame/audio tooling not present in this pipeline)
    Video,
}

/// Text-format extensions handled by the text strategy.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "json", "csv"];

/// Audio extensions handled by the audio strategy.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg"];

/// Video extensions handled by the video strategy.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// Lowercased extension of a filename, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

impl ExtractionStrategy {
    /// Classify a file into an extraction strategy, first match wins.
    ///
    /// Pure function — no database lookup. The declared MIME type leads;
    /// the filename extension is the fallback for generic or missing
    /// types. Returns `None` for unsupported files, which the pipeline
    /// turns into a terminal `failed` outcome naming the type.
    pub fn classify(mime_type: &str, filename: &str) -> Option<Self> {
        let mime = mime_type.to_lowercase();
        let ext = file_extension(filename);
        let ext = ext.as_deref();

        if mime.starts_with("image/") {
            return Some(Self::Image);
        }
        if mime == "application/pdf" {
            return Some(Self::Pdf);
        }
        if mime == "application/msword"
            || mime == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        {
            return Some(Self::Document);
        }
        if mime.starts_with("text/") || ext.is_some_and(|e| TEXT_EXTENSIONS.contains(&e)) {
            return Some(Self::Text);
        }
        if mime.starts_with("audio/") || ext.is_some_and(|e| AUDIO_EXTENSIONS.contains(&e)) {
            return Some(Self::Audio);
        }
        if mime.starts_with("video/") || ext.is_some_and(|e| VIDEO_EXTENSIONS.contains(&e)) {
            return Some(Self::Video);
        }
        None
    }
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Pdf => write!(f, "pdf"),
            Self::Document => write!(f, "document"),
            Self::Text => write!(f, "text"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

impl std::str::FromStr for ExtractionStrategy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "pdf" => Ok(Self::Pdf),
            "document" => Ok(Self::Document),
            "text" => Ok(Self::Text),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            _ => Err(format!("Invalid extraction strategy: {}", s)),
        }
    }
}

// =============================================================================
// EXTRACTION METADATA (tagged by content family)
// =============================================================================

/// Word-processor container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// Legacy binary .doc
    LegacyBinary,
    /// OOXML .docx
    Ooxml,
}

/// Shallow structural summary of a parsed JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum JsonShape {
    Object {
        keys: Vec<String>,
    },
    Array {
        length: usize,
        /// Key set of the first element, when it is an object.
        element_keys: Vec<String>,
    },
    Scalar {
        value_type: String,
    },
}

/// Structure detected inside a text attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum TextStructure {
    Json(JsonShape),
    Csv {
        /// Line count, not a real CSV parse.
        row_count: usize,
    },
}

/// Format-specific extraction metadata, one variant per content family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentMetadata {
    Image {
        byte_size: usize,
    },
    Pdf {
        page_count: Option<u64>,
        /// Key/value pairs reported by `pdfinfo`.
        document_info: BTreeMap<String, String>,
    },
    Document {
        format: DocumentFormat,
    },
    Text {
        char_count: usize,
        line_count: usize,
        structure: Option<TextStructure>,
    },
    Audio {
        transcript_available: bool,
        duration_secs: Option<f64>,
        language: Option<String>,
    },
    Video,
}

// =============================================================================
// EXTRACTION OUTCOME
// =============================================================================

/// Result of running the extraction pipeline on one file.
///
/// Transient — the worker folds it into a single terminal attachment
/// update. `status` is always terminal here (`Completed` or `Failed`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Extracted text, or a human-readable placeholder. Never empty.
    pub extracted_content: String,
    /// Format-specific metadata; absent on failure.
    pub metadata: Option<ContentMetadata>,
    /// Terminal status for the attachment.
    pub status: AttachmentStatus,
    /// Set exactly when `status` is `Failed`.
    pub error_message: Option<String>,
}

impl ExtractionOutcome {
    /// Successful extraction.
    pub fn completed(content: impl Into<String>, metadata: ContentMetadata) -> Self {
        Self {
            extracted_content: content.into(),
            metadata: Some(metadata),
            status: AttachmentStatus::Completed,
            error_message: None,
        }
    }

    /// Failed extraction. The content placeholder keeps in-memory
    /// consumers from ever seeing an empty body.
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            extracted_content: format!("[Error processing file: {}]", message),
            metadata: None,
            status: AttachmentStatus::Failed,
            error_message: Some(message),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == AttachmentStatus::Failed
    }
}

// =============================================================================
// ATTACHMENT ROWS
// =============================================================================

/// A persisted file attachment and its extraction lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Attachment {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    /// Sanitized on-disk name (uuid-prefixed).
    pub stored_filename: String,
    /// Name the file was uploaded under.
    pub original_filename: String,
    /// Declared MIME type (may be generic or wrong; classification falls
    /// back to the extension).
    pub content_type: String,
    pub size_bytes: i64,
    /// Storage backend key for the blob.
    pub storage_path: String,
    /// Content hash in `blake3:<hex>` form.
    pub content_hash: String,
    pub status: AttachmentStatus,
    /// Non-null exactly when `status` is `Completed`.
    pub extracted_content: Option<String>,
    /// Format-specific metadata; null until terminal.
    pub metadata: Option<ContentMetadata>,
    /// Non-null exactly when `status` is `Failed`.
    pub error_message: Option<String>,
    /// Times this attachment was re-queued by the reconciliation sweep.
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    /// Set on the terminal transition.
    pub processed_at: Option<DateTime<Utc>>,
}

impl Attachment {
    /// Public-safe projection for API responses.
    pub fn summary(&self) -> AttachmentSummary {
        AttachmentSummary {
            id: self.id,
            conversation_id: self.conversation_id,
            file_name: self.stored_filename.clone(),
            original_name: self.original_filename.clone(),
            file_type: self.content_type.clone(),
            file_size: self.size_bytes,
            processing_status: self.status,
            metadata: self.metadata.clone(),
            error_message: self.error_message.clone(),
            created_at: self.created_at,
            processed_at: self.processed_at,
        }
    }
}

/// Fields required to insert a new attachment row.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub stored_filename: String,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub content_hash: String,
}

/// Attachment projection for API responses. Raw extracted content is
/// deliberately excluded — list views communicate status, not content.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AttachmentSummary {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub file_name: String,
    pub original_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub processing_status: AttachmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ContentMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// CONVERSATIONS
// =============================================================================

/// A conversation between an advisor and the embedded agent.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for TurnRole {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("Invalid turn role: {}", s)),
        }
    }
}

/// One persisted turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: TurnRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// AGENT REQUESTS
// =============================================================================

/// One turn of wire-level conversation history, as supplied by the client.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Request forwarded to the agent orchestrator.
///
/// `message` already carries the assembled attachment context block when
/// the conversation has completed attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub conversation_id: Uuid,
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            AttachmentStatus::Processing,
            AttachmentStatus::Completed,
            AttachmentStatus::Failed,
        ] {
            let parsed: AttachmentStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_terminal() {
        assert!(!AttachmentStatus::Processing.is_terminal());
        assert!(AttachmentStatus::Completed.is_terminal());
        assert!(AttachmentStatus::Failed.is_terminal());
    }

    #[test]
    fn test_classify_by_mime_prefix() {
        assert_eq!(
            ExtractionStrategy::classify("image/png", "photo.png"),
            Some(ExtractionStrategy::Image)
        );
        assert_eq!(
            ExtractionStrategy::classify("text/plain", "notes"),
            Some(ExtractionStrategy::Text)
        );
        assert_eq!(
            ExtractionStrategy::classify("audio/mpeg", "call"),
            Some(ExtractionStrategy::Audio)
        );
        assert_eq!(
            ExtractionStrategy::classify("video/mp4", "demo"),
            Some(ExtractionStrategy::Video)
        );
    }

    #[test]
    fn test_classify_exact_mime() {
        assert_eq!(
            ExtractionStrategy::classify("application/pdf", "report.pdf"),
            Some(ExtractionStrategy::Pdf)
        );
        assert_eq!(
            ExtractionStrategy::classify("application/msword", "old.doc"),
            Some(ExtractionStrategy::Document)
        );
        assert_eq!(
            ExtractionStrategy::classify(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "new.docx"
            ),
            Some(ExtractionStrategy::Document)
        );
    }

    #[test]
    fn test_classify_extension_fallback() {
        // Generic MIME type, recognized extensions
        assert_eq!(
            ExtractionStrategy::classify("application/octet-stream", "README.md"),
            Some(ExtractionStrategy::Text)
        );
        assert_eq!(
            ExtractionStrategy::classify("application/octet-stream", "voice.M4A"),
            Some(ExtractionStrategy::Audio)
        );
        assert_eq!(
            ExtractionStrategy::classify("application/octet-stream", "clip.mkv"),
            Some(ExtractionStrategy::Video)
        );
    }

    #[test]
    fn test_classify_first_match_wins() {
        // Image prefix beats the .txt extension
        assert_eq!(
            ExtractionStrategy::classify("image/png", "weird.txt"),
            Some(ExtractionStrategy::Image)
        );
    }

    #[test]
    fn test_classify_unsupported() {
        assert_eq!(
            ExtractionStrategy::classify("application/x-unknown", "data.bin"),
            None
        );
        assert_eq!(
            ExtractionStrategy::classify("application/octet-stream", "no-extension"),
            None
        );
    }

    #[test]
    fn test_outcome_failed_invariants() {
        let outcome = ExtractionOutcome::failed("Unsupported file type: application/x-unknown");
        assert!(outcome.is_failed());
        assert!(outcome.error_message.is_some());
        assert!(!outcome.extracted_content.is_empty());
        assert!(outcome
            .extracted_content
            .contains("application/x-unknown"));
        assert!(outcome.metadata.is_none());
    }

    #[test]
    fn test_outcome_completed_invariants() {
        let outcome = ExtractionOutcome::completed(
            "hello",
            ContentMetadata::Text {
                char_count: 5,
                line_count: 1,
                structure: None,
            },
        );
        assert!(!outcome.is_failed());
        assert!(outcome.error_message.is_none());
        assert!(outcome.metadata.is_some());
    }

    #[test]
    fn test_content_metadata_tagged_serialization() {
        let metadata = ContentMetadata::Audio {
            transcript_available: true,
            duration_secs: Some(12.5),
            language: Some("en".to_string()),
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["kind"], "audio");
        assert_eq!(json["duration_secs"], 12.5);

        let back: ContentMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn test_text_structure_serialization() {
        let structure = TextStructure::Json(JsonShape::Array {
            length: 3,
            element_keys: vec!["id".to_string(), "name".to_string()],
        });
        let json = serde_json::to_value(&structure).unwrap();
        assert_eq!(json["format"], "json");
        assert_eq!(json["shape"], "array");
        assert_eq!(json["length"], 3);
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("a/b/report.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension(".hidden"), None);
    }

    #[test]
    fn test_summary_excludes_content() {
        let attachment = Attachment {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            stored_filename: "0194-notes.txt".to_string(),
            original_filename: "notes.txt".to_string(),
            content_type: "text/plain".to_string(),
            size_bytes: 11,
            storage_path: "blobs/01/94/x.bin".to_string(),
            content_hash: "blake3:abc".to_string(),
            status: AttachmentStatus::Completed,
            extracted_content: Some("hello world".to_string()),
            metadata: None,
            error_message: None,
            retry_count: 0,
            created_at: Utc::now(),
            processed_at: Some(Utc::now()),
        };

        let summary = attachment.summary();
        assert_eq!(summary.processing_status, AttachmentStatus::Completed);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("extracted_content").is_none());
    }
}
