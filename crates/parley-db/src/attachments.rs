//! Attachment repository.
//!
//! The attachment row is the durable record of one upload's extraction
//! lifecycle. It is inserted exactly once in `processing` state, and the
//! terminal update (`mark_completed` / `mark_failed`) is the only mutation
//! the pipeline performs afterwards. Both terminal writes are guarded on
//! `status = 'processing'` so a terminal state can never be overwritten.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use parley_core::{
    Attachment, AttachmentRepository, AttachmentStatus, AttachmentSummary, ContentMetadata,
    Error, NewAttachment, Result,
};

/// PostgreSQL attachment repository.
#[derive(Clone)]
pub struct PgAttachmentRepository {
    pool: PgPool,
}

impl PgAttachmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ATTACHMENT_COLUMNS: &str = r#"id, conversation_id, user_id, stored_filename,
    original_filename, content_type, size_bytes, storage_path, content_hash,
    status, extracted_content, metadata, error_message, retry_count,
    created_at, processed_at"#;

/// Parse attachment status from its database string, defaulting to
/// `processing` for unknown values.
fn parse_status(s: &str) -> AttachmentStatus {
    s.parse().unwrap_or_default()
}

fn attachment_from_row(row: &sqlx::postgres::PgRow) -> Result<Attachment> {
    let metadata: Option<JsonValue> = row.get("metadata");
    let metadata = metadata
        .map(serde_json::from_value::<ContentMetadata>)
        .transpose()
        .map_err(|e| Error::Serialization(format!("attachment metadata: {}", e)))?;

    Ok(Attachment {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        user_id: row.get("user_id"),
        stored_filename: row.get("stored_filename"),
        original_filename: row.get("original_filename"),
        content_type: row.get("content_type"),
        size_bytes: row.get("size_bytes"),
        storage_path: row.get("storage_path"),
        content_hash: row.get("content_hash"),
        status: parse_status(row.get("status")),
        extracted_content: row.get("extracted_content"),
        metadata,
        error_message: row.get("error_message"),
        retry_count: row.get("retry_count"),
        created_at: row.get("created_at"),
        processed_at: row.get("processed_at"),
    })
}

#[async_trait]
impl AttachmentRepository for PgAttachmentRepository {
    async fn insert(&self, new: NewAttachment) -> Result<Attachment> {
        let id = Uuid::now_v7();
        let row = sqlx::query(&format!(
            r#"INSERT INTO attachment
               (id, conversation_id, user_id, stored_filename, original_filename,
                content_type, size_bytes, storage_path, content_hash, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'processing')
               RETURNING {ATTACHMENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(new.conversation_id)
        .bind(new.user_id)
        .bind(&new.stored_filename)
        .bind(&new.original_filename)
        .bind(&new.content_type)
        .bind(new.size_bytes)
        .bind(&new.storage_path)
        .bind(&new.content_hash)
        .fetch_one(&self.pool)
        .await?;

        attachment_from_row(&row)
    }

    async fn get(&self, id: Uuid) -> Result<Attachment> {
        let row = sqlx::query(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachment WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AttachmentNotFound(id))?;

        attachment_from_row(&row)
    }

    async fn get_owned(&self, id: Uuid, user_id: Uuid) -> Result<Attachment> {
        let row = sqlx::query(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachment WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AttachmentNotFound(id))?;

        attachment_from_row(&row)
    }

    async fn list_for_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<AttachmentSummary>> {
        let rows = sqlx::query(&format!(
            r#"SELECT {ATTACHMENT_COLUMNS} FROM attachment
               WHERE conversation_id = $1
               ORDER BY created_at DESC"#
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| attachment_from_row(row).map(|a| a.summary()))
            .collect()
    }

    async fn completed_for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Attachment>> {
        let rows = sqlx::query(&format!(
            r#"SELECT {ATTACHMENT_COLUMNS} FROM attachment
               WHERE conversation_id = $1
                 AND status = 'completed'
                 AND extracted_content IS NOT NULL
               ORDER BY created_at ASC"#
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(attachment_from_row).collect()
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        extracted_content: &str,
        metadata: Option<&ContentMetadata>,
    ) -> Result<()> {
        let metadata_json = metadata.map(serde_json::to_value).transpose()?;

        let result = sqlx::query(
            r#"UPDATE attachment
               SET status = 'completed',
                   extracted_content = $2,
                   metadata = $3,
                   error_message = NULL,
                   processed_at = now()
               WHERE id = $1 AND status = 'processing'"#,
        )
        .bind(id)
        .bind(extracted_content)
        .bind(metadata_json)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AttachmentNotFound(id));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<()> {
        let result = sqlx::query(
            r#"UPDATE attachment
               SET status = 'failed',
                   extracted_content = NULL,
                   metadata = NULL,
                   error_message = $2,
                   processed_at = now()
               WHERE id = $1 AND status = 'processing'"#,
        )
        .bind(id)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AttachmentNotFound(id));
        }
        Ok(())
    }

    async fn stuck_processing(&self, threshold_secs: u64) -> Result<Vec<Attachment>> {
        let rows = sqlx::query(&format!(
            r#"SELECT {ATTACHMENT_COLUMNS} FROM attachment
               WHERE status = 'processing'
                 AND created_at < now() - make_interval(secs => $1)
               ORDER BY created_at ASC"#
        ))
        .bind(threshold_secs as f64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(attachment_from_row).collect()
    }

    async fn bump_retry(&self, id: Uuid) -> Result<i32> {
        let row = sqlx::query(
            "UPDATE attachment SET retry_count = retry_count + 1 WHERE id = $1 RETURNING retry_count",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AttachmentNotFound(id))?;

        Ok(row.get("retry_count"))
    }

    async fn delete(&self, id: Uuid) -> Result<Attachment> {
        let row = sqlx::query(&format!(
            "DELETE FROM attachment WHERE id = $1 RETURNING {ATTACHMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::AttachmentNotFound(id))?;

        attachment_from_row(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_known() {
        assert_eq!(parse_status("completed"), AttachmentStatus::Completed);
        assert_eq!(parse_status("failed"), AttachmentStatus::Failed);
        assert_eq!(parse_status("processing"), AttachmentStatus::Processing);
    }

    #[test]
    fn test_parse_status_unknown_defaults_to_processing() {
        assert_eq!(parse_status("quarantined"), AttachmentStatus::Processing);
    }
}
