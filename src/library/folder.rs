//! Folder types and repository for the document library.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::tree::{build_tree, FolderNode};
use super::{child_path, is_within, validate_folder_name, TenantScope, PATH_SEPARATOR};
use crate::{FolioError, Result};

/// A folder in a project's document library.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: i64,
    /// Organization ID.
    pub org_id: i64,
    /// Project ID.
    pub project_id: i64,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<i64>,
    /// Folder name.
    pub name: String,
    /// Materialized path: ancestor names and this name joined by `/`.
    pub path: String,
    /// User who created the folder.
    pub created_by: i64,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last renamed or moved.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Nesting level, 0 for root folders.
    pub fn depth(&self) -> usize {
        self.path.matches(PATH_SEPARATOR).count()
    }
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Folder name (validated on create).
    pub name: String,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<i64>,
    /// User creating the folder.
    pub created_by: i64,
}

impl NewFolder {
    /// Create a new root-level NewFolder.
    pub fn new(name: impl Into<String>, created_by: i64) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            created_by,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Builder for renaming and/or moving a folder.
#[derive(Debug, Clone, Default)]
pub struct FolderUpdate {
    /// New folder name.
    pub name: Option<String>,
    /// New parent folder ID (`Some(None)` moves to the root).
    pub parent_id: Option<Option<i64>>,
}

impl FolderUpdate {
    /// Create a new FolderUpdate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the parent folder ID.
    pub fn parent_id(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none()
    }
}

const FOLDER_COLUMNS: &str =
    "id, org_id, project_id, parent_id, name, path, created_by, created_at, updated_at";

/// Repository for folder operations.
///
/// Every query carries both keys of the [`TenantScope`].
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new folder.
    ///
    /// # Errors
    /// - `Validation` if the name is rejected
    /// - `NotFound` if the parent does not exist in scope
    /// - `Conflict` if a sibling already has this name
    pub async fn create(&self, scope: TenantScope, folder: &NewFolder) -> Result<Folder> {
        let name = validate_folder_name(&folder.name)?;

        let parent_path = match folder.parent_id {
            Some(parent_id) => Some(self.require(scope, parent_id, "parent folder").await?.path),
            None => None,
        };
        let path = child_path(parent_path.as_deref(), &name);
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO folders (org_id, project_id, parent_id, name, path, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(scope.org_id)
        .bind(scope.project_id)
        .bind(folder.parent_id)
        .bind(&name)
        .bind(&path)
        .bind(folder.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(parent_gone)?;

        debug!(folder_id = id, path = %path, "Folder created");

        self.require(scope, id, "folder").await
    }

    /// Get a folder by ID.
    pub async fn get_by_id(&self, scope: TenantScope, id: i64) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1 AND org_id = $2 AND project_id = $3"
        ))
        .bind(id)
        .bind(scope.org_id)
        .bind(scope.project_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(folder)
    }

    /// List every folder in scope, ordered by path.
    pub async fn list_all(&self, scope: TenantScope) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE org_id = $1 AND project_id = $2
             ORDER BY path, id"
        ))
        .bind(scope.org_id)
        .bind(scope.project_id)
        .fetch_all(self.pool)
        .await?;

        Ok(folders)
    }

    /// Build the nested folder tree for a scope.
    pub async fn list_tree(&self, scope: TenantScope) -> Result<FolderNode> {
        let folders = self.list_all(scope).await?;
        let tree = build_tree(&folders);
        let placed = tree.descendant_count();
        if placed < folders.len() {
            warn!(
                org_id = scope.org_id,
                project_id = scope.project_id,
                dropped = folders.len() - placed,
                "Folders unreachable from the root were left out of the tree"
            );
        }
        Ok(tree)
    }

    /// Rename and/or move a folder.
    ///
    /// The folder's own row and every descendant path are rewritten in one
    /// transaction. An empty update returns the folder unchanged.
    ///
    /// # Errors
    /// - `NotFound` if the folder or the new parent does not exist in scope
    /// - `Validation` if the new name is rejected
    /// - `Conflict` on self-parenting, a move into the own subtree, or a
    ///   duplicate sibling name
    pub async fn update(
        &self,
        scope: TenantScope,
        id: i64,
        update: &FolderUpdate,
    ) -> Result<Folder> {
        let current = self.require(scope, id, "folder").await?;
        if update.is_empty() {
            return Ok(current);
        }

        let name = match update.name {
            Some(ref name) => validate_folder_name(name)?,
            None => current.name.clone(),
        };
        let parent_id = update.parent_id.unwrap_or(current.parent_id);

        let parent_path = match parent_id {
            Some(parent_id) => {
                let parent = self.require(scope, parent_id, "parent folder").await?;
                if parent.id == current.id {
                    return Err(FolioError::Conflict(
                        "folder cannot be its own parent".to_string(),
                    ));
                }
                if is_within(&parent.path, &current.path) {
                    return Err(FolioError::Conflict(
                        "cannot move a folder into its own subtree".to_string(),
                    ));
                }
                Some(parent.path)
            }
            None => None,
        };

        if name == current.name && parent_id == current.parent_id {
            return Ok(current);
        }

        let new_path = child_path(parent_path.as_deref(), &name);
        let old_prefix_len = current.path.chars().count() as i64 + 1;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE folders SET name = $1, parent_id = $2, path = $3, updated_at = $4
             WHERE id = $5 AND org_id = $6 AND project_id = $7",
        )
        .bind(&name)
        .bind(parent_id)
        .bind(&new_path)
        .bind(now)
        .bind(id)
        .bind(scope.org_id)
        .bind(scope.project_id)
        .execute(&mut *tx)
        .await
        .map_err(parent_gone)?;

        // Prefix rewrite: "<old>/rest" becomes "<new>/rest". substr() counts characters.
        let descendants = sqlx::query(
            "UPDATE folders SET path = $1 || substr(path, $2)
             WHERE org_id = $3 AND project_id = $4 AND substr(path, 1, $5) = $6",
        )
        .bind(&new_path)
        .bind(old_prefix_len)
        .bind(scope.org_id)
        .bind(scope.project_id)
        .bind(old_prefix_len)
        .bind(format!("{}/", current.path))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            folder_id = id,
            old_path = %current.path,
            new_path = %new_path,
            descendants = descendants.rows_affected(),
            "Folder moved"
        );

        self.require(scope, id, "folder").await
    }

    /// Delete an empty folder permanently.
    ///
    /// # Errors
    /// - `NotFound` if the folder does not exist in scope
    /// - `Conflict` if it still has child folders or non-deleted files
    pub async fn delete(&self, scope: TenantScope, id: i64) -> Result<()> {
        let folder = self.require(scope, id, "folder").await?;

        if self.count_children(scope, id).await? > 0 || self.count_live_files(scope, id).await? > 0
        {
            return Err(not_empty());
        }

        // The guards repeat the counts so a child added in between still blocks the delete.
        let result = sqlx::query(
            "DELETE FROM folders
             WHERE id = $1 AND org_id = $2 AND project_id = $3
               AND NOT EXISTS (SELECT 1 FROM folders c WHERE c.parent_id = $1)
               AND NOT EXISTS (SELECT 1 FROM files f
                               WHERE f.folder_id = $1 AND f.org_id = $2 AND f.project_id = $3
                                 AND f.status != 'deleted')",
        )
        .bind(id)
        .bind(scope.org_id)
        .bind(scope.project_id)
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => not_empty(),
            other => other.into(),
        })?;

        if result.rows_affected() == 0 {
            return Err(not_empty());
        }

        info!(folder_id = id, path = %folder.path, "Folder deleted");
        Ok(())
    }

    /// Count the direct child folders of a folder.
    pub async fn count_children(&self, scope: TenantScope, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM folders WHERE parent_id = $1 AND org_id = $2 AND project_id = $3",
        )
        .bind(id)
        .bind(scope.org_id)
        .bind(scope.project_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Count the non-deleted files in a folder.
    pub async fn count_live_files(&self, scope: TenantScope, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM files
             WHERE folder_id = $1 AND org_id = $2 AND project_id = $3 AND status != 'deleted'",
        )
        .bind(id)
        .bind(scope.org_id)
        .bind(scope.project_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Get a folder or fail with `NotFound(what)`.
    pub(crate) async fn require(&self, scope: TenantScope, id: i64, what: &str) -> Result<Folder> {
        self.get_by_id(scope, id)
            .await?
            .ok_or_else(|| FolioError::NotFound(what.to_string()))
    }
}

fn not_empty() -> FolioError {
    FolioError::Conflict("folder is not empty".to_string())
}

/// The parent was removed between the existence check and the write.
fn parent_gone(e: sqlx::Error) -> FolioError {
    match e {
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            FolioError::NotFound("parent folder".to_string())
        }
        other => other.into(),
    }
}
