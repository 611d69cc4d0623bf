//! Project repository for Folio.
//!
//! Projects are the tenancy boundary of the document library. Each project
//! carries the organization it belongs to and a membership list.

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::{FolioError, Result};

/// A project.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID.
    pub id: i64,
    /// Owning organization ID.
    pub org_id: i64,
    /// Project name.
    pub name: String,
    /// When the project was created.
    pub created_at: DateTime<Utc>,
}

/// A membership entry. At least one of `user_id` or `email` is set.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProjectMember {
    /// Row ID.
    pub id: i64,
    /// Project ID.
    pub project_id: i64,
    /// Member user ID, if known.
    pub user_id: Option<i64>,
    /// Member e-mail, if invited by address.
    pub email: Option<String>,
}

/// Data for creating a new project.
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Owning organization ID.
    pub org_id: i64,
    /// Project name.
    pub name: String,
}

impl NewProject {
    /// Create a new NewProject.
    pub fn new(org_id: i64, name: impl Into<String>) -> Self {
        Self {
            org_id,
            name: name.into(),
        }
    }
}

/// Repository for projects and their members.
pub struct ProjectRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new ProjectRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new project.
    pub async fn create(&self, project: &NewProject) -> Result<Project> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO projects (org_id, name, created_at) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(project.org_id)
        .bind(&project.name)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| FolioError::NotFound("project".to_string()))
    }

    /// Get a project by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT id, org_id, name, created_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(project)
    }

    /// Add a member by user ID, e-mail, or both.
    ///
    /// E-mails are stored as given; matching is case-insensitive.
    pub async fn add_member(
        &self,
        project_id: i64,
        user_id: Option<i64>,
        email: Option<&str>,
    ) -> Result<ProjectMember> {
        if user_id.is_none() && email.is_none() {
            return Err(FolioError::Validation(
                "member needs a user id or an email".to_string(),
            ));
        }

        let member = sqlx::query_as::<_, ProjectMember>(
            "INSERT INTO project_members (project_id, user_id, email) VALUES ($1, $2, $3)
             RETURNING id, project_id, user_id, email",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(email)
        .fetch_one(self.pool)
        .await?;

        Ok(member)
    }

    /// List the members of a project.
    pub async fn list_members(&self, project_id: i64) -> Result<Vec<ProjectMember>> {
        let members = sqlx::query_as::<_, ProjectMember>(
            "SELECT id, project_id, user_id, email FROM project_members
             WHERE project_id = $1 ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(self.pool)
        .await?;

        Ok(members)
    }
}
