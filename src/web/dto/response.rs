//! Response DTOs for Web API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::library::{FileRecord, FileStatus, Folder, SignedUrl, UploadTicket};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Folder response.
#[derive(Debug, Serialize)]
pub struct FolderResponse {
    /// Folder ID.
    pub id: i64,
    /// Parent folder ID.
    pub parent_id: Option<i64>,
    /// Folder name.
    pub name: String,
    /// Materialized path.
    pub path: String,
    /// Nesting level, 0 for root folders.
    pub depth: usize,
    /// Creator user ID.
    pub created_by: i64,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Updated at.
    pub updated_at: DateTime<Utc>,
}

impl From<Folder> for FolderResponse {
    fn from(f: Folder) -> Self {
        Self {
            depth: f.depth(),
            id: f.id,
            parent_id: f.parent_id,
            name: f.name,
            path: f.path,
            created_by: f.created_by,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

/// File response. The storage key is not exposed.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    /// File ID.
    pub id: i64,
    /// Folder ID.
    pub folder_id: i64,
    /// Display name.
    pub name: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Lifecycle status.
    pub status: FileStatus,
    /// Uploader.
    pub created_by: i64,
    /// Last editor.
    pub updated_by: Option<i64>,
    /// Deleter.
    pub deleted_by: Option<i64>,
    /// Deleted at.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Updated at.
    pub updated_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponse {
    fn from(f: FileRecord) -> Self {
        Self {
            id: f.id,
            folder_id: f.folder_id,
            name: f.original_name,
            content_type: f.content_type,
            size_bytes: f.size_bytes,
            status: f.status,
            created_by: f.created_by,
            updated_by: f.updated_by,
            deleted_by: f.deleted_by,
            deleted_at: f.deleted_at,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

/// Upload ticket response.
#[derive(Debug, Serialize)]
pub struct UploadTicketResponse {
    /// The pending file.
    pub file: FileResponse,
    /// Where to PUT the bytes.
    pub upload: SignedUrl,
}

impl From<UploadTicket> for UploadTicketResponse {
    fn from(ticket: UploadTicket) -> Self {
        Self {
            file: ticket.file.into(),
            upload: ticket.upload,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok".
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}
