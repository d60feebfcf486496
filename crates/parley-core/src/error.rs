//! Error types for parley.

use thiserror::Error;

/// Result type alias using parley's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for parley operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Attachment not found
    #[error("Attachment not found: {0}")]
    AttachmentNotFound(uuid::Uuid),

    /// Conversation not found (or not owned by the caller)
    #[error("Conversation not found: {0}")]
    ConversationNotFound(uuid::Uuid),

    /// Content extraction failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Audio transcription failed
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// An external call exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Authentication/authorization failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_attachment_not_found() {
        let id = Uuid::nil();
        let err = Error::AttachmentNotFound(id);
        assert_eq!(err.to_string(), format!("Attachment not found: {}", id));
    }

    #[test]
    fn test_error_display_conversation_not_found() {
        let id = Uuid::new_v4();
        let err = Error::ConversationNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_display_extraction() {
        let err = Error::Extraction("pdftotext exited nonzero".to_string());
        assert_eq!(err.to_string(), "Extraction error: pdftotext exited nonzero");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout("orchestrator call after 120s".to_string());
        assert_eq!(err.to_string(), "Timeout: orchestrator call after 120s");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
