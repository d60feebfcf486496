//! Attachment HTTP handlers: upload, list, get, delete.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{error, info, warn};
use uuid::Uuid;

use parley_core::{
    detect_content_type, is_admitted_type, sanitize_filename, AttachmentRepository,
    ConversationRepository, NewAttachment,
};
use parley_db::{compute_content_hash, generate_storage_path};
use parley_extract::ExtractionJob;

use crate::auth::AuthUser;
use crate::{ApiError, AppState};

/// Upload a file attachment to a conversation.
///
/// Side effect ordering is load-bearing: the blob is written and the row
/// inserted (state `processing`) synchronously, the response is built, and
/// only then is extraction scheduled as a detached task. The client gets an
/// immediate acknowledgment with a stable attachment id it can poll,
/// independent of how long extraction takes.
///
/// # Multipart Fields
/// - `file`: the file to attach (required)
///
/// # Returns
/// - 201 Created with `{ success, attachment }` (no extracted content — it
///   does not exist yet)
/// - 400 Bad Request when the file part is missing or empty
/// - 404 Not Found when the conversation does not belong to the caller
/// - 415 Unsupported Media Type for types outside the admission list
#[utoipa::path(post, path = "/api/v1/conversations/{id}/attachments", tag = "Attachments",
    responses((status = 201, description = "Attachment created, extraction scheduled")))]
pub async fn upload_attachment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    // Ownership is checked by scoped lookup; a mismatch reads as not-found
    // so callers cannot probe for other users' conversations.
    state
        .db
        .conversations
        .get_for_user(conversation_id, user_id)
        .await?;

    let mut file_data: Option<Vec<u8>> = None;
    let mut declared_type: Option<String> = None;
    let mut original_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("file") => {
                declared_type = field.content_type().map(|c| c.to_string());
                original_name = field.file_name().map(|n| n.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?
                        .to_vec(),
                );
            }
            _ => {} // ignore unknown fields
        }
    }

    let data =
        file_data.ok_or_else(|| ApiError::BadRequest("Missing file in multipart form".into()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".into()));
    }

    let original_name = sanitize_filename(original_name.as_deref().unwrap_or("unnamed_file"));
    let content_type = declared_type
        .unwrap_or_else(|| detect_content_type(&data, "application/octet-stream"));

    // Admission control happens before any row or blob exists. This list is
    // deliberately coarser than the extraction dispatch table.
    if !is_admitted_type(&content_type) {
        return Err(ApiError::UnsupportedMediaType(format!(
            "File type not allowed: {}",
            content_type
        )));
    }

    let storage = state.db.storage()?;
    let blob_id = Uuid::now_v7();
    let storage_path = generate_storage_path(&blob_id);
    storage.write(&storage_path, &data).await?;

    let new_attachment = NewAttachment {
        conversation_id,
        user_id,
        stored_filename: format!("{}-{}", blob_id, original_name),
        original_filename: original_name,
        content_type,
        size_bytes: data.len() as i64,
        storage_path: storage_path.clone(),
        content_hash: compute_content_hash(&data),
    };

    let attachment = match state.db.attachments.insert(new_attachment).await {
        Ok(attachment) => attachment,
        Err(e) => {
            // No orphaned blobs on a failed request
            if let Err(cleanup) = storage.delete(&storage_path).await {
                warn!(storage_path = %storage_path, error = %cleanup, "Failed to clean up blob after insert failure");
            }
            return Err(e.into());
        }
    };

    info!(
        subsystem = "api",
        op = "upload",
        attachment_id = %attachment.id,
        conversation_id = %conversation_id,
        byte_size = attachment.size_bytes,
        "Attachment stored, scheduling extraction"
    );

    let response = Json(serde_json::json!({
        "success": true,
        "attachment": attachment.summary(),
    }));

    // Scheduled as a detached task once the response value exists, so a
    // full queue can never delay the acknowledgment.
    let queue = state.queue.clone();
    let attachment_id = attachment.id;
    tokio::spawn(async move {
        if let Err(e) = queue.submit(ExtractionJob { attachment_id }).await {
            error!(attachment_id = %attachment_id, error = %e, "Failed to schedule extraction");
        }
    });

    Ok((StatusCode::CREATED, response))
}

/// List attachments for a conversation.
///
/// Returns status, metadata, and timestamps — never raw extracted content.
#[utoipa::path(get, path = "/api/v1/conversations/{id}/attachments", tag = "Attachments",
    responses((status = 200, description = "Attachment summaries")))]
pub async fn list_attachments(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .conversations
        .get_for_user(conversation_id, user_id)
        .await?;

    let attachments = state
        .db
        .attachments
        .list_for_conversation(conversation_id)
        .await?;
    Ok(Json(attachments))
}

/// Get one attachment, including its extracted content.
#[utoipa::path(get, path = "/api/v1/attachments/{attachment_id}", tag = "Attachments",
    responses((status = 200, description = "Full attachment row")))]
pub async fn get_attachment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(attachment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let attachment = state.db.attachments.get_owned(attachment_id, user_id).await?;
    Ok(Json(attachment))
}

/// Delete an attachment row and its backing blob.
#[utoipa::path(delete, path = "/api/v1/attachments/{attachment_id}", tag = "Attachments",
    responses((status = 200, description = "Attachment deleted")))]
pub async fn delete_attachment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(attachment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // Scoped fetch first so deletion is ownership-checked
    state.db.attachments.get_owned(attachment_id, user_id).await?;
    let attachment = state.db.attachments.delete(attachment_id).await?;

    let storage = state.db.storage()?;
    if let Err(e) = storage.delete(&attachment.storage_path).await {
        warn!(attachment_id = %attachment_id, error = %e, "Failed to delete attachment blob");
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Attachment deleted successfully"
    })))
}
