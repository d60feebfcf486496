//! Trait definitions shared across parley crates.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Attachment, AttachmentSummary, ContentMetadata, Conversation, ConversationTurn,
    ExtractionOutcome, ExtractionStrategy, NewAttachment, TurnRole,
};
use crate::Result;

// =============================================================================
// EXTRACTION TRAITS
// =============================================================================

/// Extractor for one content family.
///
/// Each extractor handles one `ExtractionStrategy` and is registered in an
/// `ExtractorRegistry`. Extractors may return `Err` freely — the pipeline
/// boundary converts any error into a terminal `Failed` outcome — except
/// where a strategy deliberately returns a degraded-success placeholder
/// (audio without a credential, video, images without OCR).
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// The extraction strategy this extractor handles.
    fn strategy(&self) -> ExtractionStrategy;

    /// Extract content from raw file data.
    async fn extract(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<ExtractionOutcome>;

    /// Check if the extractor's external dependencies are available.
    async fn health_check(&self) -> Result<bool>;

    /// Human-readable name of this extractor.
    fn name(&self) -> &str;
}

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

/// Persistence operations for attachment rows.
///
/// The row is created once (status `processing`) before extraction is
/// scheduled; `mark_completed`/`mark_failed` are the only asynchronous
/// mutations and each writes exactly one terminal state.
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Insert a new attachment in `processing` state.
    async fn insert(&self, new: NewAttachment) -> Result<Attachment>;

    /// Fetch one attachment by id.
    async fn get(&self, id: Uuid) -> Result<Attachment>;

    /// Fetch one attachment scoped to its owner. Ownership mismatch reads
    /// as not-found so callers cannot probe for existence.
    async fn get_owned(&self, id: Uuid, user_id: Uuid) -> Result<Attachment>;

    /// List all attachments for a conversation, newest first.
    async fn list_for_conversation(&self, conversation_id: Uuid)
        -> Result<Vec<AttachmentSummary>>;

    /// Completed attachments for a conversation, creation time ascending
    /// (oldest context first, matching conversation chronology).
    async fn completed_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Attachment>>;

    /// Record a successful extraction.
    async fn mark_completed(
        &self,
        id: Uuid,
        extracted_content: &str,
        metadata: Option<&ContentMetadata>,
    ) -> Result<()>;

    /// Record a failed extraction.
    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<()>;

    /// Attachments stuck in `processing` longer than `threshold_secs`.
    async fn stuck_processing(&self, threshold_secs: u64) -> Result<Vec<Attachment>>;

    /// Increment the retry counter, returning the new count.
    async fn bump_retry(&self, id: Uuid) -> Result<i32>;

    /// Delete an attachment row, returning it so the caller can remove the
    /// backing blob.
    async fn delete(&self, id: Uuid) -> Result<Attachment>;
}

/// Persistence operations for conversations and their turns.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Fetch one conversation by id.
    async fn get(&self, id: Uuid) -> Result<Conversation>;

    /// Fetch a conversation scoped to its owner; mismatch is not-found.
    async fn get_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Conversation>;

    /// Append a turn to a conversation.
    async fn append_turn(
        &self,
        conversation_id: Uuid,
        role: TurnRole,
        content: &str,
    ) -> Result<ConversationTurn>;

    /// The first `limit` turns of a conversation, oldest first.
    async fn first_turns(&self, conversation_id: Uuid, limit: i64)
        -> Result<Vec<ConversationTurn>>;

    /// Number of persisted turns.
    async fn turn_count(&self, conversation_id: Uuid) -> Result<i64>;

    /// Update the conversation title and touch its timestamp.
    async fn set_title(&self, conversation_id: Uuid, title: &str) -> Result<()>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Text generation backend (title generation).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
