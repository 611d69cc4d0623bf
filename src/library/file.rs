//! File metadata types and repository for the document library.
//!
//! Only metadata lives here; the bytes sit in blob storage under
//! `blob_name`. Deleted files stay in the table as tombstones.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use super::blob::generate_blob_name;
use super::folder::FolderRepository;
use super::{validate_filename, TenantScope};
use crate::{FolioError, Result};

/// Content type stored when the client sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Lifecycle status of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Upload requested, bytes not yet confirmed.
    Pending,
    /// Upload confirmed.
    Ready,
    /// Soft-deleted.
    Deleted,
}

impl FileStatus {
    /// Convert status to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Ready => "ready",
            FileStatus::Deleted => "deleted",
        }
    }

    /// Whether a file in this status may move to `next`.
    ///
    /// Allowed: pending to ready, and pending or ready to deleted.
    pub fn can_transition_to(self, next: FileStatus) -> bool {
        matches!(
            (self, next),
            (FileStatus::Pending, FileStatus::Ready)
                | (FileStatus::Pending, FileStatus::Deleted)
                | (FileStatus::Ready, FileStatus::Deleted)
        )
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for a status string that is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown file status: {0}")]
pub struct UnknownStatus(String);

impl FromStr for FileStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FileStatus::Pending),
            "ready" => Ok(FileStatus::Ready),
            "deleted" => Ok(FileStatus::Deleted),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for FileStatus {
    type Error = UnknownStatus;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// File metadata record.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Organization ID.
    pub org_id: i64,
    /// Project ID.
    pub project_id: i64,
    /// Containing folder ID.
    pub folder_id: i64,
    /// Display name supplied by the client.
    pub original_name: String,
    /// Server-generated storage key.
    pub blob_name: String,
    /// Lowercased MIME type.
    pub content_type: String,
    /// Size in bytes as declared at upload request.
    pub size_bytes: i64,
    /// Lifecycle status.
    #[sqlx(try_from = "String")]
    pub status: FileStatus,
    /// Uploader.
    pub created_by: i64,
    /// Last user to change the record.
    pub updated_by: Option<i64>,
    /// User who deleted the file.
    pub deleted_by: Option<i64>,
    /// When the file was deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Data for registering a new (pending) file.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Target folder ID.
    pub folder_id: i64,
    /// Display name (validated on create).
    pub original_name: String,
    /// MIME type as sent by the client.
    pub content_type: String,
    /// Declared size in bytes.
    pub size_bytes: i64,
    /// Uploader.
    pub created_by: i64,
}

impl NewFile {
    /// Create a new NewFile.
    pub fn new(
        folder_id: i64,
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        size_bytes: i64,
        created_by: i64,
    ) -> Self {
        Self {
            folder_id,
            original_name: original_name.into(),
            content_type: content_type.into(),
            size_bytes,
            created_by,
        }
    }
}

/// Builder for renaming and/or moving a file.
#[derive(Debug, Clone, Default)]
pub struct FileUpdate {
    /// New display name.
    pub original_name: Option<String>,
    /// New folder ID.
    pub folder_id: Option<i64>,
}

impl FileUpdate {
    /// Create a new FileUpdate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display name.
    pub fn original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    /// Set the folder.
    pub fn folder_id(mut self, folder_id: i64) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.original_name.is_none() && self.folder_id.is_none()
    }
}

/// Visibility flags for listing files. Ready files are always listed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileListOptions {
    /// Also list pending files.
    pub include_pending: bool,
    /// Also list deleted files.
    pub include_deleted: bool,
}

impl FileListOptions {
    /// Statuses selected by these options.
    pub fn statuses(&self) -> Vec<FileStatus> {
        let mut statuses = vec![FileStatus::Ready];
        if self.include_pending {
            statuses.push(FileStatus::Pending);
        }
        if self.include_deleted {
            statuses.push(FileStatus::Deleted);
        }
        statuses
    }
}

const FILE_COLUMNS: &str = "id, org_id, project_id, folder_id, original_name, blob_name, content_type, \
     size_bytes, status, created_by, updated_by, deleted_by, deleted_at, created_at, updated_at";

fn normalize_content_type(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_CONTENT_TYPE.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

fn file_deleted() -> FolioError {
    FolioError::Conflict("file is deleted".to_string())
}

/// Repository for file metadata.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a file in `pending` state with a fresh blob key.
    pub async fn create_pending(&self, scope: TenantScope, file: &NewFile) -> Result<FileRecord> {
        let original_name = validate_filename(&file.original_name)?;
        if file.size_bytes < 0 {
            return Err(FolioError::Validation(
                "size must not be negative".to_string(),
            ));
        }
        FolderRepository::new(self.pool)
            .require(scope, file.folder_id, "folder")
            .await?;

        let blob_name = generate_blob_name(scope);
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO files (org_id, project_id, folder_id, original_name, blob_name, content_type,
                                size_bytes, status, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING id",
        )
        .bind(scope.org_id)
        .bind(scope.project_id)
        .bind(file.folder_id)
        .bind(&original_name)
        .bind(&blob_name)
        .bind(normalize_content_type(&file.content_type))
        .bind(file.size_bytes)
        .bind(FileStatus::Pending.as_str())
        .bind(file.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        debug!(file_id = id, blob_name = %blob_name, "Pending file registered");

        self.require(scope, id).await
    }

    /// Get a file by ID, tombstones included.
    pub async fn get_by_id(&self, scope: TenantScope, id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = $1 AND org_id = $2 AND project_id = $3"
        ))
        .bind(id)
        .bind(scope.org_id)
        .bind(scope.project_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(file)
    }

    /// List the files of a folder, most recently updated first.
    ///
    /// # Errors
    /// - `NotFound` if the folder does not exist in scope
    pub async fn list(
        &self,
        scope: TenantScope,
        folder_id: i64,
        options: &FileListOptions,
    ) -> Result<Vec<FileRecord>> {
        FolderRepository::new(self.pool)
            .require(scope, folder_id, "folder")
            .await?;

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {FILE_COLUMNS} FROM files WHERE org_id = "));
        query.push_bind(scope.org_id);
        query.push(" AND project_id = ");
        query.push_bind(scope.project_id);
        query.push(" AND folder_id = ");
        query.push_bind(folder_id);
        query.push(" AND status IN (");
        let mut separated = query.separated(", ");
        for status in options.statuses() {
            separated.push_bind(status.as_str());
        }
        separated.push_unseparated(")");
        query.push(" ORDER BY updated_at DESC, id DESC");

        let files = query
            .build_query_as::<FileRecord>()
            .fetch_all(self.pool)
            .await?;

        Ok(files)
    }

    /// Rename and/or move a file. An empty update returns the file unchanged.
    ///
    /// # Errors
    /// - `NotFound` if the file or target folder does not exist in scope
    /// - `Validation` if the new name is rejected
    /// - `Conflict` if the file is deleted
    pub async fn update(
        &self,
        scope: TenantScope,
        id: i64,
        update: &FileUpdate,
        updated_by: i64,
    ) -> Result<FileRecord> {
        let current = self.require(scope, id).await?;
        if update.is_empty() {
            return Ok(current);
        }
        if current.status == FileStatus::Deleted {
            return Err(file_deleted());
        }

        let original_name = match update.original_name {
            Some(ref name) => Some(validate_filename(name)?),
            None => None,
        };
        if let Some(folder_id) = update.folder_id {
            FolderRepository::new(self.pool)
                .require(scope, folder_id, "folder")
                .await?;
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE files SET ");
        let mut separated = query.separated(", ");

        if let Some(name) = original_name {
            separated.push("original_name = ");
            separated.push_bind_unseparated(name);
        }

        if let Some(folder_id) = update.folder_id {
            separated.push("folder_id = ");
            separated.push_bind_unseparated(folder_id);
        }

        separated.push("updated_by = ");
        separated.push_bind_unseparated(updated_by);
        separated.push("updated_at = ");
        separated.push_bind_unseparated(Utc::now());

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" AND org_id = ");
        query.push_bind(scope.org_id);
        query.push(" AND project_id = ");
        query.push_bind(scope.project_id);
        query.push(" AND status != 'deleted'");

        let result = query.build().execute(self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(file_deleted());
        }

        self.require(scope, id).await
    }

    /// Remove a pending file that never got an upload URL.
    ///
    /// Only `pending` rows are removed; returns whether one was.
    pub async fn discard_pending(&self, scope: TenantScope, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM files WHERE id = $1 AND org_id = $2 AND project_id = $3 AND status = $4",
        )
        .bind(id)
        .bind(scope.org_id)
        .bind(scope.project_id)
        .bind(FileStatus::Pending.as_str())
        .execute(self.pool)
        .await?;

        debug!(file_id = id, "Pending file discarded");
        Ok(result.rows_affected() > 0)
    }

    /// Mark a file deleted. Deleting a tombstone again is a no-op.
    pub async fn soft_delete(
        &self,
        scope: TenantScope,
        id: i64,
        deleted_by: i64,
    ) -> Result<FileRecord> {
        let current = self.require(scope, id).await?;
        if !current.status.can_transition_to(FileStatus::Deleted) {
            return Ok(current);
        }

        let now = Utc::now();
        sqlx::query(
            "UPDATE files SET status = $1, deleted_by = $2, deleted_at = $3, updated_by = $2, updated_at = $3
             WHERE id = $4 AND org_id = $5 AND project_id = $6 AND status != $1",
        )
        .bind(FileStatus::Deleted.as_str())
        .bind(deleted_by)
        .bind(now)
        .bind(id)
        .bind(scope.org_id)
        .bind(scope.project_id)
        .execute(self.pool)
        .await?;

        info!(file_id = id, deleted_by, "File soft-deleted");

        self.require(scope, id).await
    }

    /// Move a pending file to `ready`. A file that is already ready is
    /// returned unchanged.
    ///
    /// # Errors
    /// - `NotFound` if the file does not exist in scope
    /// - `Conflict` if the file is deleted
    pub async fn mark_ready(
        &self,
        scope: TenantScope,
        id: i64,
        updated_by: i64,
    ) -> Result<FileRecord> {
        let current = self.require(scope, id).await?;
        match current.status {
            FileStatus::Ready => return Ok(current),
            FileStatus::Deleted => return Err(file_deleted()),
            FileStatus::Pending => {}
        }

        let result = sqlx::query(
            "UPDATE files SET status = $1, updated_by = $2, updated_at = $3
             WHERE id = $4 AND org_id = $5 AND project_id = $6 AND status = $7",
        )
        .bind(FileStatus::Ready.as_str())
        .bind(updated_by)
        .bind(Utc::now())
        .bind(id)
        .bind(scope.org_id)
        .bind(scope.project_id)
        .bind(FileStatus::Pending.as_str())
        .execute(self.pool)
        .await?;

        let file = self.require(scope, id).await?;
        if result.rows_affected() == 0 && file.status != FileStatus::Ready {
            return Err(file_deleted());
        }

        Ok(file)
    }

    async fn require(&self, scope: TenantScope, id: i64) -> Result<FileRecord> {
        self.get_by_id(scope, id)
            .await?
            .ok_or_else(|| FolioError::NotFound("file".to_string()))
    }
}
