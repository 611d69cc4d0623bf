//! API handlers for the document library.

pub mod file;
pub mod folder;

pub use file::*;
pub use folder::*;

use std::sync::Arc;

use crate::library::{BlobStore, LibraryService};
use crate::Database;

/// Shared state for all handlers.
pub struct AppState {
    /// Database.
    pub db: Arc<Database>,
    /// Blob storage, if configured.
    pub blobs: Option<Arc<dyn BlobStore>>,
    /// Roles that bypass project membership.
    pub admin_roles: Vec<String>,
}

impl AppState {
    /// Create a new application state without blob storage.
    pub fn new(db: Arc<Database>, admin_roles: Vec<String>) -> Self {
        Self {
            db,
            blobs: None,
            admin_roles,
        }
    }

    /// Attach blob storage.
    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    /// Library service bound to this state.
    pub fn library(&self) -> LibraryService<'_> {
        LibraryService::new(self.db.pool()).with_blob_store(self.blobs.as_deref())
    }
}
