//! Database schema and migrations for Folio.
//!
//! Migrations are applied in order when the database is opened. The
//! schema_version table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Projects and their membership lists
    r#"
CREATE TABLE projects (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    org_id      INTEGER NOT NULL,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX idx_projects_org_id ON projects(org_id);

CREATE TABLE project_members (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id  INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    user_id     INTEGER,
    email       TEXT,
    CHECK (user_id IS NOT NULL OR email IS NOT NULL)
);

CREATE INDEX idx_project_members_project_id ON project_members(project_id);
"#,
    // v2: Folder hierarchy with materialized paths
    r#"
CREATE TABLE folders (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    org_id      INTEGER NOT NULL,
    project_id  INTEGER NOT NULL,
    parent_id   INTEGER REFERENCES folders(id),
    name        TEXT NOT NULL,
    path        TEXT NOT NULL,
    created_by  INTEGER NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Sibling uniqueness; root folders share the parent key 0
CREATE UNIQUE INDEX idx_folders_sibling_name
    ON folders(org_id, project_id, COALESCE(parent_id, 0), name);
CREATE INDEX idx_folders_scope_path ON folders(org_id, project_id, path);
CREATE INDEX idx_folders_parent_id ON folders(parent_id);
"#,
    // v3: File metadata (content lives in blob storage)
    r#"
CREATE TABLE files (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    org_id          INTEGER NOT NULL,
    project_id      INTEGER NOT NULL,
    folder_id       INTEGER NOT NULL,
    original_name   TEXT NOT NULL,
    blob_name       TEXT NOT NULL UNIQUE,
    content_type    TEXT NOT NULL,
    size_bytes      INTEGER NOT NULL DEFAULT 0,
    status          TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'ready', 'deleted')),
    created_by      INTEGER NOT NULL,
    updated_by      INTEGER,
    deleted_by      INTEGER,
    deleted_at      TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX idx_files_scope_folder ON files(org_id, project_id, folder_id, status);
CREATE INDEX idx_files_updated_at ON files(updated_at);
"#,
];
