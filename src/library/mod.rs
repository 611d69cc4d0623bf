//! Project document library.
//!
//! This module provides the folder/file hierarchy for a project:
//! - Name validation
//! - Folders with a materialized path, cascaded on rename/move
//! - File metadata with a pending/ready/deleted lifecycle
//! - Nested tree listing
//! - The blob storage seam for upload/download URLs
//!
//! Every store operation takes a [`TenantScope`] and includes both of its keys
//! in the query predicate.

mod blob;
mod file;
mod folder;
mod service;
mod tree;
mod validation;

pub use blob::{generate_blob_name, BlobStore, LocalBlobStore, SignedUrl, UrlMethod};
pub use file::{
    FileListOptions, FileRecord, FileRepository, FileStatus, FileUpdate, NewFile, UnknownStatus,
    DEFAULT_CONTENT_TYPE,
};
pub use folder::{Folder, FolderRepository, FolderUpdate, NewFolder};
pub use service::{Deleted, LibraryService, UploadRequest, UploadTicket};
pub use tree::{build_tree, FolderNode};
pub use validation::{validate_filename, validate_folder_name, NameError};

use serde::Serialize;

/// Maximum length for folder names (in characters).
pub const MAX_FOLDER_NAME_LENGTH: usize = 128;

/// Maximum length for file display names (in characters).
pub const MAX_FILENAME_LENGTH: usize = 256;

/// Separator between folder names in a materialized path.
pub const PATH_SEPARATOR: char = '/';

/// The `(org_id, project_id)` pair every folder and file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TenantScope {
    /// Organization ID.
    pub org_id: i64,
    /// Project ID.
    pub project_id: i64,
}

impl TenantScope {
    /// Create a new TenantScope.
    pub fn new(org_id: i64, project_id: i64) -> Self {
        Self { org_id, project_id }
    }
}

/// Compute the materialized path for a folder under `parent_path`.
pub fn child_path(parent_path: Option<&str>, name: &str) -> String {
    match parent_path {
        Some(parent) => format!("{parent}{PATH_SEPARATOR}{name}"),
        None => name.to_string(),
    }
}

/// Whether `path` lies inside the subtree rooted at `ancestor` (or is `ancestor` itself).
pub fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with(PATH_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_path() {
        assert_eq!(child_path(None, "Specs"), "Specs");
        assert_eq!(child_path(Some("Specs"), "HVAC"), "Specs/HVAC");
        assert_eq!(child_path(Some("A/B"), "C"), "A/B/C");
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("A/B", "A/B"));
        assert!(is_within("A/B/C", "A/B"));
        assert!(!is_within("A/BC", "A/B"));
        assert!(!is_within("A", "A/B"));
        assert!(!is_within("X/A/B", "A/B"));
    }
}
