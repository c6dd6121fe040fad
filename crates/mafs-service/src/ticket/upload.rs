//! Image uploads for ticket attachments and avatars.
//!
//! Every accepted file is decoded, downscaled to fit the configured maximum
//! edge and re-encoded as JPEG on a blocking thread before it is written
//! under the upload root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, info, warn};
use uuid::Uuid;

use mafs_auth::{RequestContext, require_form, require_level};
use mafs_core::config::UploadsConfig;
use mafs_core::error::{AppError, ErrorKind};
use mafs_core::result::AppResult;
use mafs_database::store::{TicketStore, UserStore};
use mafs_entity::permission::{FormAction, forms};
use mafs_entity::ticket::{AttachmentKind, NewAttachment, TicketAttachment};
use mafs_entity::user::{PermissionLevel, User};

/// MIME type of every stored image.
const STORED_MIME: &str = "image/jpeg";

/// One file taken from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-side file name.
    pub file_name: String,
    /// Declared content type.
    pub content_type: Option<String>,
    /// Raw bytes.
    pub data: Bytes,
}

/// Stores uploaded images and records them.
#[derive(Clone)]
pub struct UploadService {
    tickets: Arc<dyn TicketStore>,
    users: Arc<dyn UserStore>,
    config: UploadsConfig,
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService")
            .field("root", &self.config.root)
            .finish()
    }
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        users: Arc<dyn UserStore>,
        config: UploadsConfig,
    ) -> Self {
        Self {
            tickets,
            users,
            config,
        }
    }

    /// Stores photos against a ticket.
    pub async fn attach_to_ticket(
        &self,
        ctx: &RequestContext,
        ticket_id: i64,
        kind: AttachmentKind,
        files: Vec<UploadedFile>,
    ) -> AppResult<Vec<TicketAttachment>> {
        require_form(ctx, forms::TICKETS, FormAction::View)?;
        self.tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ticket {ticket_id} not found")))?;

        if files.is_empty() {
            return Err(AppError::validation("No files were uploaded").with_code("NO_FILES"));
        }
        if files.len() > self.config.max_files {
            return Err(AppError::validation(format!(
                "At most {} files may be uploaded at once",
                self.config.max_files
            ))
            .with_code("TOO_MANY_FILES"));
        }
        // Reject the whole batch before anything is written.
        for file in &files {
            self.check_file(file)?;
        }

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            let jpeg = self.process(file.data).await?;
            let relative = format!("tickets/{ticket_id}/{}.jpg", Uuid::new_v4());
            let size_bytes = i64::try_from(jpeg.len()).unwrap_or(i64::MAX);
            self.write(&relative, jpeg).await?;

            let attachment = self
                .tickets
                .add_attachment(NewAttachment {
                    ticket_id,
                    uploaded_by: ctx.user_id(),
                    kind,
                    file_name: file.file_name,
                    stored_path: relative,
                    mime_type: STORED_MIME.to_string(),
                    size_bytes,
                })
                .await?;
            stored.push(attachment);
        }

        info!(
            ticket_id,
            user_id = ctx.user_id(),
            count = stored.len(),
            kind = kind.as_str(),
            "Attachments stored"
        );
        Ok(stored)
    }

    /// Replaces the caller's avatar.
    pub async fn set_avatar(&self, ctx: &RequestContext, file: UploadedFile) -> AppResult<User> {
        self.check_file(&file)?;
        let jpeg = self.process(file.data).await?;
        let relative = format!("users/{}/avatar.jpg", ctx.user_id());
        self.write(&relative, jpeg).await?;

        let user = self.users.set_avatar(ctx.user_id(), &relative).await?;
        info!(user_id = user.id, "Avatar updated");
        Ok(user)
    }

    /// Deletes an attachment; its uploader or a manager may do this.
    pub async fn delete_attachment(&self, ctx: &RequestContext, attachment_id: i64) -> AppResult<()> {
        let attachment = self
            .tickets
            .find_attachment(attachment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Attachment {attachment_id} not found")))?;
        if attachment.uploaded_by != ctx.user_id() {
            require_level(ctx, PermissionLevel::Manager)?;
        }

        self.tickets.delete_attachment(attachment_id).await?;
        match tokio::fs::remove_file(self.absolute(&attachment.stored_path)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %attachment.stored_path, "Attachment file already missing");
            }
            Err(e) => return Err(e.into()),
        }

        info!(attachment_id, user_id = ctx.user_id(), "Attachment deleted");
        Ok(())
    }

    fn check_file(&self, file: &UploadedFile) -> AppResult<()> {
        let size = u64::try_from(file.data.len()).unwrap_or(u64::MAX);
        if size > self.config.max_file_size_bytes {
            return Err(AppError::payload_too_large(format!(
                "'{}' exceeds the {} byte limit",
                file.file_name, self.config.max_file_size_bytes
            ))
            .with_code("FILE_TOO_LARGE"));
        }
        let is_image = file
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("image/"));
        if !is_image {
            return Err(AppError::validation(format!(
                "'{}' is not an image",
                file.file_name
            ))
            .with_code("INVALID_FILE_TYPE"));
        }
        Ok(())
    }

    async fn process(&self, data: Bytes) -> AppResult<Vec<u8>> {
        let max_dimension = self.config.max_dimension;
        let quality = self.config.jpeg_quality;
        tokio::task::spawn_blocking(move || reencode_jpeg(&data, max_dimension, quality))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Image task panicked", e))?
    }

    async fn write(&self, relative: &str, bytes: Vec<u8>) -> AppResult<()> {
        let path = self.absolute(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), "Stored upload");
        Ok(())
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        Path::new(&self.config.root).join(relative)
    }
}

/// Decodes an image, shrinks it to fit `max_dimension` on its longest edge
/// and encodes it as JPEG.
pub fn reencode_jpeg(data: &[u8], max_dimension: u32, quality: u8) -> AppResult<Vec<u8>> {
    let img = image::load_from_memory(data).map_err(|e| {
        AppError::validation(format!("File is not a readable image: {e}")).with_code("INVALID_FILE_TYPE")
    })?;

    let img = if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, FilterType::Triangle)
    } else {
        img
    };

    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)))
        .map_err(|e| AppError::with_source(ErrorKind::Storage, "JPEG encoding failed", e))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, RgbImage};

    use super::*;
    use crate::testing;
    use crate::ticket::{CreateTicketRequest, TicketService};

    fn png(width: u32, height: u32) -> Bytes {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        Bytes::from(buf.into_inner())
    }

    fn file(name: &str, content_type: &str, data: Bytes) -> UploadedFile {
        UploadedFile {
            file_name: name.into(),
            content_type: Some(content_type.into()),
            data,
        }
    }

    #[test]
    fn test_reencode_downscales_longest_edge() {
        let out = reencode_jpeg(&png(400, 200), 100, 80).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_reencode_rejects_garbage() {
        let err = reencode_jpeg(b"definitely not an image", 100, 80).unwrap_err();
        assert_eq!(err.code, Some("INVALID_FILE_TYPE"));
    }

    #[tokio::test]
    async fn test_attach_limits_and_storage() {
        let dir = tempfile::tempdir().unwrap();
        let (_, stores) = testing::stores();
        let op = testing::user(&stores, "op", "OPERATOR", PermissionLevel::Operator, None).await;
        let ctx = testing::ctx(&stores, &op).await;
        let ticket = TicketService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            Arc::clone(&stores.hierarchy),
        )
        .create(
            &ctx,
            CreateTicketRequest {
                title: "Cracked guard".into(),
                ..CreateTicketRequest::default()
            },
        )
        .await
        .unwrap();

        let svc = UploadService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            UploadsConfig {
                root: dir.path().to_string_lossy().into_owned(),
                max_file_size_bytes: 64 * 1024,
                max_files: 2,
                max_dimension: 64,
                jpeg_quality: 70,
            },
        );

        let err = svc
            .attach_to_ticket(&ctx, ticket.id, AttachmentKind::Before, vec![
                file("a.txt", "text/plain", Bytes::from_static(b"hello")),
            ])
            .await
            .unwrap_err();
        assert_eq!(err.code, Some("INVALID_FILE_TYPE"));

        let err = svc
            .attach_to_ticket(&ctx, ticket.id, AttachmentKind::Before, vec![
                file("big.png", "image/png", Bytes::from(vec![0u8; 65 * 1024])),
            ])
            .await
            .unwrap_err();
        assert_eq!(err.code, Some("FILE_TOO_LARGE"));
        assert_eq!(err.kind, ErrorKind::PayloadTooLarge);

        let three = vec![
            file("1.png", "image/png", png(8, 8)),
            file("2.png", "image/png", png(8, 8)),
            file("3.png", "image/png", png(8, 8)),
        ];
        let err = svc
            .attach_to_ticket(&ctx, ticket.id, AttachmentKind::Before, three)
            .await
            .unwrap_err();
        assert_eq!(err.code, Some("TOO_MANY_FILES"));

        let stored = svc
            .attach_to_ticket(&ctx, ticket.id, AttachmentKind::After, vec![
                file("photo.png", "image/png", png(200, 100)),
            ])
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].mime_type, "image/jpeg");
        assert!(stored[0].stored_path.starts_with(&format!("tickets/{}/", ticket.id)));
        let on_disk = dir.path().join(&stored[0].stored_path);
        let decoded = image::open(&on_disk).unwrap();
        assert_eq!(decoded.width(), 64);

        svc.delete_attachment(&ctx, stored[0].id).await.unwrap();
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_avatar_path() {
        let dir = tempfile::tempdir().unwrap();
        let (_, stores) = testing::stores();
        let op = testing::user(&stores, "op", "OPERATOR", PermissionLevel::Operator, None).await;
        let ctx = testing::ctx(&stores, &op).await;
        let svc = UploadService::new(
            Arc::clone(&stores.tickets),
            Arc::clone(&stores.users),
            UploadsConfig {
                root: dir.path().to_string_lossy().into_owned(),
                ..UploadsConfig::default()
            },
        );

        let user = svc
            .set_avatar(&ctx, file("me.png", "image/png", png(16, 16)))
            .await
            .unwrap();
        let expected = format!("users/{}/avatar.jpg", op.id);
        assert_eq!(user.avatar_path.as_deref(), Some(expected.as_str()));
        assert!(dir.path().join(expected).exists());
    }
}
