//! Folio - project document library
//!
//! A per-project hierarchy of folders addressed by materialized paths, file
//! metadata with an upload lifecycle, and membership-based access control,
//! served over a JSON web API.

pub mod access;
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod logging;
pub mod web;

pub use access::{AccessGuard, Caller, MembershipLookup};
pub use config::Config;
pub use db::{Database, NewProject, Project, ProjectRepository};
pub use error::{FolioError, Result};
pub use library::{
    build_tree, BlobStore, FileRecord, FileRepository, FileStatus, Folder, FolderNode,
    FolderRepository, LibraryService, LocalBlobStore, TenantScope,
};
pub use web::WebServer;
