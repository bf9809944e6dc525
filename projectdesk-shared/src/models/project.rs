/// Project model and database operations
///
/// A project groups tasks. Deleting a project deletes its tasks through the
/// `ON DELETE CASCADE` foreign key on `tasks.project_id`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL UNIQUE,
///     description TEXT,
///     status VARCHAR(16) NOT NULL CHECK (status IN ('active', 'inactive')),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::models::project::{Project, ProjectFilter};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let active = Project::list(&pool, &ProjectFilter {
///     status: Some("active".to_string()),
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::str::FromStr;

use super::task::Task;
use super::{like_pattern, InvalidEnumValue};

const PROJECT_COLUMNS: &str = "id, name, description, status, created_at, updated_at";

/// Lifecycle status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// Project is being worked on
    Active,

    /// Project is paused or closed
    Inactive,
}

impl ProjectStatus {
    /// All accepted values, in display order
    pub const ALL: [ProjectStatus; 2] = [ProjectStatus::Active, ProjectStatus::Inactive];

    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProjectStatus::Active),
            "inactive" => Ok(ProjectStatus::Inactive),
            other => Err(InvalidEnumValue {
                kind: "project status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ProjectStatus {
    type Error = InvalidEnumValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Project record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Primary key
    pub id: i64,

    /// Unique project name (3-100 characters)
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Current status
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Project with its tasks eagerly loaded
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithTasks {
    #[serde(flatten)]
    pub project: Project,

    /// Tasks of the project, ordered by id
    pub tasks: Vec<Task>,
}

/// Input for creating a new project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
}

/// Input for updating a project
///
/// `description` follows the "use Some(None) to clear" convention; `None`
/// leaves the stored description untouched.
#[derive(Debug, Clone)]
pub struct UpdateProject {
    pub name: String,
    pub description: Option<Option<String>>,
    pub status: ProjectStatus,
}

/// Filters accepted by [`Project::list`], combined with AND
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Substring match on name
    pub name: Option<String>,

    /// Substring match on status
    pub status: Option<String>,

    /// Inclusive lower bound on the creation date
    pub from: Option<NaiveDate>,

    /// Inclusive upper bound on the creation date
    pub to: Option<NaiveDate>,
}

impl Project {
    /// Creates a new project
    ///
    /// # Errors
    ///
    /// Returns an error if the name already exists (unique constraint
    /// `projects_name_key`) or the database operation fails
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, description, status)
            VALUES ($1, $2, $3)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.status.as_str())
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID together with its tasks
    pub async fn find_with_tasks(
        pool: &PgPool,
        id: i64,
    ) -> Result<Option<ProjectWithTasks>, sqlx::Error> {
        let Some(project) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let tasks = Task::list_by_project(pool, project.id).await?;

        Ok(Some(ProjectWithTasks { project, tasks }))
    }

    /// Lists projects matching every provided filter, ordered by id
    pub async fn list(pool: &PgPool, filter: &ProjectFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE TRUE"
        ));

        if let Some(name) = &filter.name {
            query.push(" AND name ILIKE ").push_bind(like_pattern(name));
        }
        if let Some(status) = &filter.status {
            query.push(" AND status ILIKE ").push_bind(like_pattern(status));
        }
        if let Some(from) = filter.from {
            query.push(" AND created_at::date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND created_at::date <= ").push_bind(to);
        }

        query.push(" ORDER BY id");

        let projects = query.build_query_as::<Project>().fetch_all(pool).await?;

        Ok(projects)
    }

    /// Updates a project
    ///
    /// # Returns
    ///
    /// The updated project, or None if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let (set_description, description) = match data.description {
            Some(value) => (true, value),
            None => (false, None),
        };

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = $2,
                status = $3,
                description = CASE WHEN $4 THEN $5 ELSE description END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.status.as_str())
        .bind(set_description)
        .bind(description)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Deletes a project (and, by cascade, its tasks)
    ///
    /// # Returns
    ///
    /// True if the project was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Checks whether a project ID exists
    pub async fn exists(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Checks whether a name is already used by another project
    ///
    /// `except_id` excludes the project being updated from the check.
    pub async fn name_taken(
        pool: &PgPool,
        name: &str,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM projects WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(except_id)
        .fetch_one(pool)
        .await
    }
}
