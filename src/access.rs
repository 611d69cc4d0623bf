//! Access checks for project documents.
//!
//! The caller identity is resolved once into a [`Caller`] at the edge. The
//! guard then looks the project up through [`MembershipLookup`] and hands back
//! the [`TenantScope`] every store call runs under.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::db::ProjectRepository;
use crate::library::TenantScope;
use crate::{FolioError, Result};

/// Who is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// Holder of an administrative role; passes every membership check.
    Admin {
        /// User ID.
        user_id: i64,
        /// The administrative role that was recognized.
        role: String,
    },
    /// Regular user; must be listed on the project.
    Member {
        /// User ID.
        user_id: i64,
        /// E-mail address, used for invitation-by-address matching.
        email: Option<String>,
    },
}

impl Caller {
    /// Resolve a caller from a user's id, role and e-mail.
    ///
    /// Role comparison against `admin_roles` is case-insensitive.
    pub fn resolve(
        user_id: i64,
        role: &str,
        email: Option<String>,
        admin_roles: &[String],
    ) -> Self {
        if admin_roles.iter().any(|r| r.eq_ignore_ascii_case(role)) {
            Caller::Admin {
                user_id,
                role: role.to_lowercase(),
            }
        } else {
            Caller::Member { user_id, email }
        }
    }

    /// The caller's user ID.
    pub fn user_id(&self) -> i64 {
        match self {
            Caller::Admin { user_id, .. } | Caller::Member { user_id, .. } => *user_id,
        }
    }

    /// Whether the caller holds an administrative role.
    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Admin { .. })
    }
}

/// One entry of a project's membership list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRef {
    /// Member referenced by user ID.
    User(i64),
    /// Member referenced by e-mail address.
    Email(String),
}

/// What the guard needs to know about a project.
#[derive(Debug, Clone)]
pub struct ProjectAccess {
    /// Tenant scope of the project's documents.
    pub scope: TenantScope,
    /// Membership list.
    pub members: Vec<MemberRef>,
}

/// Source of project membership data.
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    /// Look a project up. Returns `None` if it does not exist.
    async fn find_project(&self, project_id: i64) -> Result<Option<ProjectAccess>>;
}

#[async_trait]
impl MembershipLookup for ProjectRepository<'_> {
    async fn find_project(&self, project_id: i64) -> Result<Option<ProjectAccess>> {
        let Some(project) = self.get_by_id(project_id).await? else {
            return Ok(None);
        };

        let mut members = Vec::new();
        for member in self.list_members(project_id).await? {
            if let Some(user_id) = member.user_id {
                members.push(MemberRef::User(user_id));
            }
            if let Some(email) = member.email {
                members.push(MemberRef::Email(email));
            }
        }

        Ok(Some(ProjectAccess {
            scope: TenantScope::new(project.org_id, project.id),
            members,
        }))
    }
}

/// Whether `caller` may work with the documents of `project`.
///
/// Admins always may. Anyone else must appear in the membership list by
/// user ID or by e-mail (case-insensitive).
pub fn is_authorized(project: &ProjectAccess, caller: &Caller) -> bool {
    match caller {
        Caller::Admin { .. } => true,
        Caller::Member { user_id, email } => project.members.iter().any(|m| match m {
            MemberRef::User(id) => id == user_id,
            MemberRef::Email(addr) => email
                .as_deref()
                .is_some_and(|e| same_email(e, addr)),
        }),
    }
}

/// Case-insensitive address comparison, Unicode-aware.
fn same_email(a: &str, b: &str) -> bool {
    let fold = |s: &str| s.trim().chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    fold(a) == fold(b)
}

/// Gate in front of every library operation.
pub struct AccessGuard<'a, L: MembershipLookup + ?Sized> {
    lookup: &'a L,
}

impl<'a, L: MembershipLookup + ?Sized> AccessGuard<'a, L> {
    /// Create a new AccessGuard over the given membership source.
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// Authorize `caller` on `project_id` and return the project's tenant scope.
    ///
    /// # Errors
    /// - `NotFound` if the project does not exist
    /// - `Permission` if the caller is not allowed in
    pub async fn scope(&self, caller: &Caller, project_id: i64) -> Result<TenantScope> {
        let project = self
            .lookup
            .find_project(project_id)
            .await?
            .ok_or_else(|| FolioError::NotFound("project".to_string()))?;

        if !is_authorized(&project, caller) {
            warn!(
                user_id = caller.user_id(),
                project_id, "Rejected access to project documents"
            );
            return Err(FolioError::Permission(
                "not a member of this project".to_string(),
            ));
        }

        debug!(
            user_id = caller.user_id(),
            admin = caller.is_admin(),
            project_id,
            "Access granted"
        );
        Ok(project.scope)
    }
}
