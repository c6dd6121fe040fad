//! Ticket attachment handlers and multipart parsing.

use std::collections::HashMap;

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;

use mafs_core::error::AppError;
use mafs_entity::ticket::{AttachmentKind, TicketAttachment};
use mafs_service::UploadedFile;

use crate::dto::response::{ApiResponse, MessageResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("Upload exceeds the request size limit").with_code("FILE_TOO_LARGE")
    } else {
        AppError::validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

/// Reads every file part whose field name is in `file_fields` plus all text
/// parts.
pub(crate) async fn read_files(
    mut multipart: Multipart,
    file_fields: &[&str],
) -> Result<(Vec<UploadedFile>, HashMap<String, String>), AppError> {
    let mut files = Vec::new();
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().trim_end_matches("[]").to_string();

        if file_fields.contains(&name.as_str()) {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;
            files.push(UploadedFile {
                file_name,
                content_type,
                data,
            });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            fields.insert(name, value);
        }
    }

    Ok((files, fields))
}

/// POST /api/tickets/{id}/attachments
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ticket_id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Vec<TicketAttachment>>>), AppError> {
    let (files, fields) = read_files(multipart, &["files", "file"]).await?;
    let kind: AttachmentKind = fields
        .get("kind")
        .map(|k| k.trim().parse())
        .transpose()?
        .unwrap_or_default();

    let attachments = state
        .upload_service
        .attach_to_ticket(&auth, ticket_id, kind, files)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(attachments))))
}

/// DELETE /api/attachments/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.upload_service.delete_attachment(&auth, id).await?;
    Ok(Json(MessageResponse::new("Attachment deleted")))
}
