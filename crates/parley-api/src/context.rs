//! Attachment context assembly for outbound chat turns.

use parley_core::{Attachment, AttachmentStatus};

/// Opening marker of the attachment context block.
pub const CONTEXT_OPEN: &str = "=== Attached files ===";

/// Closing marker of the attachment context block.
pub const CONTEXT_CLOSE: &str = "=== End attached files ===";

/// Separator between per-file sections.
pub const FILE_SEPARATOR: &str = "---";

/// Prepend a delimited context block summarizing completed attachments to
/// the user's message.
///
/// Only attachments in terminal-success state with extracted content
/// qualify, in the order given (callers pass creation-time ascending).
/// Pending and failed attachments contribute nothing — status is
/// communicated by the attachment list, never inline in the conversation.
/// With zero qualifying attachments the message passes through unmodified.
pub fn assemble_context(attachments: &[Attachment], message: &str) -> String {
    let qualifying: Vec<&Attachment> = attachments
        .iter()
        .filter(|a| a.status == AttachmentStatus::Completed && a.extracted_content.is_some())
        .collect();

    if qualifying.is_empty() {
        return message.to_string();
    }

    let mut block = String::new();
    block.push_str(CONTEXT_OPEN);
    block.push('\n');
    for attachment in qualifying {
        block.push_str(&format!("[File: {}]\n", attachment.original_filename));
        block.push_str(attachment.extracted_content.as_deref().unwrap_or_default());
        block.push('\n');
        block.push_str(FILE_SEPARATOR);
        block.push('\n');
    }
    block.push_str(CONTEXT_CLOSE);
    block.push_str("\n\n");
    block.push_str(message);
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn attachment(name: &str, status: AttachmentStatus, content: Option<&str>) -> Attachment {
        Attachment {
            id: Uuid::now_v7(),
            conversation_id: Uuid::nil(),
            user_id: Uuid::nil(),
            stored_filename: format!("stored-{}", name),
            original_filename: name.to_string(),
            content_type: "text/plain".to_string(),
            size_bytes: content.map(|c| c.len() as i64).unwrap_or(0),
            storage_path: "blobs/00/00/x.bin".to_string(),
            content_hash: "blake3:0".to_string(),
            status,
            extracted_content: content.map(String::from),
            metadata: None,
            error_message: (status == AttachmentStatus::Failed).then(|| "boom".to_string()),
            retry_count: 0,
            created_at: Utc::now(),
            processed_at: status.is_terminal().then(Utc::now),
        }
    }

    #[test]
    fn test_no_attachments_passes_through_byte_identical() {
        let message = "What changed \u{1F914} since last week?";
        assert_eq!(assemble_context(&[], message), message);
    }

    #[test]
    fn test_only_pending_and_failed_passes_through() {
        let attachments = vec![
            attachment("pending.pdf", AttachmentStatus::Processing, None),
            attachment("broken.bin", AttachmentStatus::Failed, None),
        ];
        assert_eq!(assemble_context(&attachments, "hello"), "hello");
    }

    #[test]
    fn test_headers_in_creation_order() {
        let attachments = vec![
            attachment("report.pdf", AttachmentStatus::Completed, Some("pdf text")),
            attachment("notes.txt", AttachmentStatus::Completed, Some("note text")),
        ];
        let assembled = assemble_context(&attachments, "summarize both");

        let report_pos = assembled.find("[File: report.pdf]").unwrap();
        let notes_pos = assembled.find("[File: notes.txt]").unwrap();
        assert!(report_pos < notes_pos);
        assert_eq!(assembled.matches("[File: ").count(), 2);
    }

    #[test]
    fn test_block_structure() {
        let attachments = vec![attachment(
            "notes.txt",
            AttachmentStatus::Completed,
            Some("Hello\n\nWorld"),
        )];
        let assembled = assemble_context(&attachments, "what does it say?");

        assert!(assembled.starts_with(CONTEXT_OPEN));
        assert!(assembled.ends_with("what does it say?"));
        assert!(assembled.contains("Hello\n\nWorld"));
        let close_pos = assembled.find(CONTEXT_CLOSE).unwrap();
        let query_pos = assembled.find("what does it say?").unwrap();
        assert!(close_pos < query_pos);
    }

    #[test]
    fn test_excludes_non_completed_among_completed() {
        let attachments = vec![
            attachment("a.txt", AttachmentStatus::Completed, Some("a")),
            attachment("b.txt", AttachmentStatus::Processing, None),
            attachment("c.txt", AttachmentStatus::Failed, None),
            attachment("d.txt", AttachmentStatus::Completed, Some("d")),
        ];
        let assembled = assemble_context(&attachments, "q");

        assert!(assembled.contains("[File: a.txt]"));
        assert!(assembled.contains("[File: d.txt]"));
        assert!(!assembled.contains("[File: b.txt]"));
        assert!(!assembled.contains("[File: c.txt]"));
    }
}
