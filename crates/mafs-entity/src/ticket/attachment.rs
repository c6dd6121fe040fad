//! Ticket attachment entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// What an attached photo documents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "attachment_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Condition as found.
    Before,
    /// Condition after the fix.
    After,
    /// Anything else.
    #[default]
    Other,
}

impl AttachmentKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Other => "other",
        }
    }
}

impl FromStr for AttachmentKind {
    type Err = mafs_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "other" | "" => Ok(Self::Other),
            _ => Err(mafs_core::AppError::validation(format!(
                "Invalid attachment kind: '{s}'. Expected one of: before, after, other"
            ))),
        }
    }
}

/// A stored image attached to a ticket.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TicketAttachment {
    /// Row ID.
    pub id: i64,
    /// Ticket ID.
    pub ticket_id: i64,
    /// Uploader.
    pub uploaded_by: i64,
    /// Before/after/other.
    pub kind: AttachmentKind,
    /// Original client file name.
    pub file_name: String,
    /// Path relative to the upload root.
    pub stored_path: String,
    /// MIME type of the stored file.
    pub mime_type: String,
    /// Stored size in bytes.
    pub size_bytes: i64,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

/// Data for recording a stored attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttachment {
    /// Ticket ID.
    pub ticket_id: i64,
    /// Uploader.
    pub uploaded_by: i64,
    /// Kind.
    pub kind: AttachmentKind,
    /// Original client file name.
    pub file_name: String,
    /// Path relative to the upload root.
    pub stored_path: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
}
