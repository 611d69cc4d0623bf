//! Library service.
//!
//! This is the entry point the web layer calls. Every operation first runs
//! the access guard, which yields the tenant scope, and only then touches
//! the folder or file store.

use serde::Serialize;
use tracing::{info, warn};

use super::blob::{BlobStore, SignedUrl};
use super::file::{FileListOptions, FileRecord, FileRepository, FileStatus, FileUpdate, NewFile};
use super::folder::{Folder, FolderRepository, FolderUpdate, NewFolder};
use super::tree::FolderNode;
use super::TenantScope;
use crate::access::{AccessGuard, Caller};
use crate::db::{DbPool, ProjectRepository};
use crate::{FolioError, Result};

/// Request data for registering an upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Target folder ID.
    pub folder_id: i64,
    /// Display name of the file.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// Declared size in bytes.
    pub size_bytes: i64,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(folder_id: i64, filename: impl Into<String>, size_bytes: i64) -> Self {
        Self {
            folder_id,
            filename: filename.into(),
            content_type: String::new(),
            size_bytes,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Pending file plus the URL to upload its bytes to.
#[derive(Debug, Clone)]
pub struct UploadTicket {
    /// The pending file record.
    pub file: FileRecord,
    /// Signed upload URL.
    pub upload: SignedUrl,
}

/// Summary returned after a folder delete.
#[derive(Debug, Clone, Serialize)]
pub struct Deleted {
    /// ID of the deleted record.
    pub id: i64,
}

/// Document library operations for one request.
pub struct LibraryService<'a> {
    pool: &'a DbPool,
    blobs: Option<&'a dyn BlobStore>,
}

impl<'a> LibraryService<'a> {
    /// Create a new LibraryService without blob storage.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool, blobs: None }
    }

    /// Attach a blob store. Upload and download operations need one.
    pub fn with_blob_store(mut self, blobs: Option<&'a dyn BlobStore>) -> Self {
        self.blobs = blobs;
        self
    }

    async fn scope(&self, caller: &Caller, project_id: i64) -> Result<TenantScope> {
        let projects = ProjectRepository::new(self.pool);
        AccessGuard::new(&projects).scope(caller, project_id).await
    }

    fn blobs(&self) -> Result<&'a dyn BlobStore> {
        self.blobs
            .ok_or_else(|| FolioError::NotImplemented("blob storage is not configured".to_string()))
    }

    // Folders

    /// Nested folder tree of a project.
    pub async fn list_tree(&self, caller: &Caller, project_id: i64) -> Result<FolderNode> {
        let scope = self.scope(caller, project_id).await?;
        FolderRepository::new(self.pool).list_tree(scope).await
    }

    /// Create a folder.
    pub async fn create_folder(
        &self,
        caller: &Caller,
        project_id: i64,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<Folder> {
        let scope = self.scope(caller, project_id).await?;

        let mut new_folder = NewFolder::new(name, caller.user_id());
        if let Some(parent_id) = parent_id {
            new_folder = new_folder.with_parent(parent_id);
        }

        let folder = FolderRepository::new(self.pool)
            .create(scope, &new_folder)
            .await?;
        info!(
            project_id,
            folder_id = folder.id,
            user_id = caller.user_id(),
            path = %folder.path,
            "Folder created"
        );
        Ok(folder)
    }

    /// Rename and/or move a folder.
    pub async fn update_folder(
        &self,
        caller: &Caller,
        project_id: i64,
        folder_id: i64,
        update: &FolderUpdate,
    ) -> Result<Folder> {
        let scope = self.scope(caller, project_id).await?;
        FolderRepository::new(self.pool)
            .update(scope, folder_id, update)
            .await
    }

    /// Delete an empty folder.
    pub async fn delete_folder(
        &self,
        caller: &Caller,
        project_id: i64,
        folder_id: i64,
    ) -> Result<Deleted> {
        let scope = self.scope(caller, project_id).await?;
        FolderRepository::new(self.pool)
            .delete(scope, folder_id)
            .await?;
        Ok(Deleted { id: folder_id })
    }

    // Files

    /// List the files of a folder.
    pub async fn list_files(
        &self,
        caller: &Caller,
        project_id: i64,
        folder_id: i64,
        options: &FileListOptions,
    ) -> Result<Vec<FileRecord>> {
        let scope = self.scope(caller, project_id).await?;
        FileRepository::new(self.pool)
            .list(scope, folder_id, options)
            .await
    }

    /// Rename and/or move a file.
    pub async fn update_file(
        &self,
        caller: &Caller,
        project_id: i64,
        file_id: i64,
        update: &FileUpdate,
    ) -> Result<FileRecord> {
        let scope = self.scope(caller, project_id).await?;
        FileRepository::new(self.pool)
            .update(scope, file_id, update, caller.user_id())
            .await
    }

    /// Soft-delete a file.
    pub async fn delete_file(
        &self,
        caller: &Caller,
        project_id: i64,
        file_id: i64,
    ) -> Result<FileRecord> {
        let scope = self.scope(caller, project_id).await?;
        let file = FileRepository::new(self.pool)
            .soft_delete(scope, file_id, caller.user_id())
            .await?;
        info!(project_id, file_id, user_id = caller.user_id(), "File deleted");
        Ok(file)
    }

    // Upload lifecycle

    /// Register a pending file and issue a signed upload URL for it.
    ///
    /// The pending record is removed again if the blob store cannot issue
    /// the URL.
    ///
    /// # Errors
    /// - `NotImplemented` if no blob store is attached
    pub async fn request_upload(
        &self,
        caller: &Caller,
        project_id: i64,
        request: &UploadRequest,
    ) -> Result<UploadTicket> {
        let scope = self.scope(caller, project_id).await?;
        let blobs = self.blobs()?;

        let new_file = NewFile::new(
            request.folder_id,
            request.filename.as_str(),
            request.content_type.as_str(),
            request.size_bytes,
            caller.user_id(),
        );
        let files = FileRepository::new(self.pool);
        let file = files.create_pending(scope, &new_file).await?;

        let upload = match blobs.upload_url(&file.blob_name, &file.content_type).await {
            Ok(upload) => upload,
            Err(e) => {
                warn!(file_id = file.id, "Upload URL issuance failed: {}", e);
                if let Err(discard) = files.discard_pending(scope, file.id).await {
                    warn!(file_id = file.id, "Failed to discard pending file: {}", discard);
                }
                return Err(e);
            }
        };

        info!(
            project_id,
            file_id = file.id,
            user_id = caller.user_id(),
            "Upload requested"
        );
        Ok(UploadTicket { file, upload })
    }

    /// Confirm an upload and move the file to `ready`.
    ///
    /// # Errors
    /// - `NotImplemented` if no blob store is attached
    /// - `Conflict` if the object is not in blob storage yet, or the file is deleted
    pub async fn complete_upload(
        &self,
        caller: &Caller,
        project_id: i64,
        file_id: i64,
    ) -> Result<FileRecord> {
        let scope = self.scope(caller, project_id).await?;
        let blobs = self.blobs()?;
        let files = FileRepository::new(self.pool);

        let file = files
            .get_by_id(scope, file_id)
            .await?
            .ok_or_else(|| FolioError::NotFound("file".to_string()))?;

        match file.status {
            FileStatus::Ready => return Ok(file),
            FileStatus::Deleted => return Err(FolioError::Conflict("file is deleted".to_string())),
            FileStatus::Pending => {}
        }

        if !blobs.exists(&file.blob_name).await? {
            return Err(FolioError::Conflict(
                "upload not found in blob storage".to_string(),
            ));
        }

        let file = files.mark_ready(scope, file_id, caller.user_id()).await?;
        info!(project_id, file_id, "Upload completed");
        Ok(file)
    }

    /// Issue a signed download URL for a ready file.
    ///
    /// # Errors
    /// - `NotImplemented` if no blob store is attached
    /// - `NotFound` if the file does not exist or is deleted
    /// - `Conflict` if the upload has not completed
    pub async fn download_url(
        &self,
        caller: &Caller,
        project_id: i64,
        file_id: i64,
    ) -> Result<SignedUrl> {
        let scope = self.scope(caller, project_id).await?;
        let blobs = self.blobs()?;

        let file = FileRepository::new(self.pool)
            .get_by_id(scope, file_id)
            .await?
            .filter(|f| f.status != FileStatus::Deleted)
            .ok_or_else(|| FolioError::NotFound("file".to_string()))?;

        if file.status != FileStatus::Ready {
            return Err(FolioError::Conflict("file is not ready".to_string()));
        }

        blobs.download_url(&file.blob_name, &file.original_name).await
    }
}
