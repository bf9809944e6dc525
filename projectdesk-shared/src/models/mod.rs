/// Database models for ProjectDesk
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts (passwords stored as Argon2id hashes)
/// - `role`: Roles, permissions and user role assignments
/// - `access_token`: Opaque bearer tokens issued at login
/// - `client`: Customer records
/// - `project`: Projects, which own tasks
/// - `task`: Tasks belonging to a project
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::models::project::{CreateProject, Project, ProjectStatus};
/// use projectdesk_shared::db::pool::connect;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = connect("postgresql://localhost/projectdesk", 5).await?;
///
/// let project = Project::create(&pool, CreateProject {
///     name: "Website relaunch".to_string(),
///     description: None,
///     status: ProjectStatus::Active,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod access_token;
pub mod client;
pub mod project;
pub mod role;
pub mod task;
pub mod user;

/// Error returned when a stored or submitted value is not a member of an enum
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value: {value}")]
pub struct InvalidEnumValue {
    /// Name of the enum being parsed (e.g. "project status")
    pub kind: &'static str,

    /// The rejected value
    pub value: String,
}

/// Wraps a filter value for a substring `ILIKE` match
pub(crate) fn like_pattern(value: &str) -> String {
    format!("%{}%", value)
}
