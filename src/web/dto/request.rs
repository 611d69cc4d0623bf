//! Request DTOs for Web API.
//!
//! These only check shape and rough bounds. Name rules live in the library
//! and come back as 422 from there.

use serde::{Deserialize, Deserializer};
use validator::Validate;

use super::validation::not_empty_trimmed;
use crate::library::{FileListOptions, FileUpdate, FolderUpdate, UploadRequest};

/// Distinguish a missing field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Create folder request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub name: String,
    /// Parent folder ID; omitted or null for a root folder.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Rename/move folder request.
///
/// `"parent_id": null` moves the folder to the root; leaving it out keeps the
/// current parent.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateFolderRequest {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New parent folder ID.
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
}

impl From<UpdateFolderRequest> for FolderUpdate {
    fn from(req: UpdateFolderRequest) -> Self {
        FolderUpdate {
            name: req.name,
            parent_id: req.parent_id,
        }
    }
}

/// Rename/move file request.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateFileRequest {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New folder ID.
    #[serde(default)]
    pub folder_id: Option<i64>,
}

impl From<UpdateFileRequest> for FileUpdate {
    fn from(req: UpdateFileRequest) -> Self {
        FileUpdate {
            original_name: req.name,
            folder_id: req.folder_id,
        }
    }
}

/// Upload request. The target folder comes from the path.
#[derive(Debug, Deserialize, Validate)]
pub struct RequestUploadRequest {
    /// Display name of the file.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub filename: String,
    /// MIME type.
    #[serde(default)]
    #[validate(length(max = 255, message = "Content type is too long"))]
    pub content_type: Option<String>,
    /// Size in bytes.
    #[validate(range(min = 0, message = "Size must not be negative"))]
    pub size_bytes: i64,
}

impl RequestUploadRequest {
    /// Build the library request for an upload into `folder_id`.
    pub fn into_upload(self, folder_id: i64) -> UploadRequest {
        UploadRequest::new(folder_id, self.filename, self.size_bytes)
            .with_content_type(self.content_type.unwrap_or_default())
    }
}

/// Query parameters for listing files.
#[derive(Debug, Default, Deserialize)]
pub struct ListFilesQuery {
    /// Also list pending files.
    #[serde(default)]
    pub include_pending: bool,
    /// Also list deleted files.
    #[serde(default)]
    pub include_deleted: bool,
}

impl From<ListFilesQuery> for FileListOptions {
    fn from(query: ListFilesQuery) -> Self {
        FileListOptions {
            include_pending: query.include_pending,
            include_deleted: query.include_deleted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_folder_parent_absent_vs_null() {
        let absent: UpdateFolderRequest = serde_json::from_str(r#"{"name": "HVAC"}"#).unwrap();
        assert_eq!(absent.parent_id, None);

        let null: UpdateFolderRequest = serde_json::from_str(r#"{"parent_id": null}"#).unwrap();
        assert_eq!(null.parent_id, Some(None));

        let set: UpdateFolderRequest = serde_json::from_str(r#"{"parent_id": 4}"#).unwrap();
        assert_eq!(set.parent_id, Some(Some(4)));

        let update = FolderUpdate::from(null);
        assert!(!update.is_empty());
    }

    #[test]
    fn test_create_folder_validation() {
        let req = CreateFolderRequest {
            name: "   ".to_string(),
            parent_id: None,
        };
        assert!(req.validate().is_err());

        let req = CreateFolderRequest {
            name: "Specs".to_string(),
            parent_id: Some(1),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_upload_request_validation() {
        let req: RequestUploadRequest = serde_json::from_str(
            r#"{"filename": "a.pdf", "size_bytes": -5}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());

        let req: RequestUploadRequest = serde_json::from_str(
            r#"{"filename": "a.pdf", "content_type": "application/pdf", "size_bytes": 5}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        let upload = req.into_upload(3);
        assert_eq!(upload.folder_id, 3);
        assert_eq!(upload.content_type, "application/pdf");
    }

    #[test]
    fn test_empty_file_update() {
        let req: UpdateFileRequest = serde_json::from_str("{}").unwrap();
        assert!(FileUpdate::from(req).is_empty());
    }
}
