/// Task model and database operations
///
/// Tasks always belong to a project. `status` and `priority` are constrained
/// to fixed value sets both here and by CHECK constraints in the schema.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(100) NOT NULL,
///     description TEXT,
///     status VARCHAR(16) NOT NULL,    -- pending | progress | done
///     priority VARCHAR(16) NOT NULL,  -- low | medium | high
///     due_date DATE NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use chrono::NaiveDate;
/// use projectdesk_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let task = Task::create(&pool, CreateTask {
///     project_id: 1,
///     title: "Write release notes".to_string(),
///     description: None,
///     status: TaskStatus::Pending,
///     priority: TaskPriority::High,
///     due_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::str::FromStr;

use super::project::Project;
use super::{like_pattern, InvalidEnumValue};

const TASK_COLUMNS: &str =
    "id, project_id, title, description, status, priority, due_date, created_at, updated_at";

/// Progress state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not started
    Pending,

    /// Being worked on
    Progress,

    /// Finished
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::Progress, TaskStatus::Done];

    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Progress => "progress",
            TaskStatus::Done => "done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "progress" => Ok(TaskStatus::Progress),
            "done" => Ok(TaskStatus::Done),
            other => Err(InvalidEnumValue {
                kind: "task status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = InvalidEnumValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Priority of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    /// Converts priority to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(InvalidEnumValue {
                kind: "task priority",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for TaskPriority {
    type Error = InvalidEnumValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Primary key
    pub id: i64,

    /// Owning project
    pub project_id: i64,

    /// Task title (3-100 characters)
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Progress state
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,

    /// Priority
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,

    /// Due date, serialized as `YYYY-MM-DD`
    pub due_date: NaiveDate,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Task with its parent project eagerly loaded
#[derive(Debug, Clone, Serialize)]
pub struct TaskWithProject {
    #[serde(flatten)]
    pub task: Task,

    pub project: Project,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: NaiveDate,
}

/// Input for updating a task
///
/// `project_id: None` keeps the current project. `description` uses
/// Some(None) to clear and None to leave untouched.
#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub project_id: Option<i64>,
    pub title: String,
    pub description: Option<Option<String>>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: NaiveDate,
}

/// Filters accepted by [`Task::list`], combined with AND
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Substring match on status
    pub status: Option<String>,

    /// Substring match on priority
    pub priority: Option<String>,

    /// Inclusive lower bound on the due date
    pub from: Option<NaiveDate>,

    /// Inclusive upper bound on the due date
    pub to: Option<NaiveDate>,

    /// Exact match on the owning project
    pub project_id: Option<i64>,
}

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if `project_id` doesn't reference a project
    /// (`tasks_project_id_fkey`) or the database operation fails
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (project_id, title, description, status, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.priority.as_str())
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID together with its project
    pub async fn find_with_project(
        pool: &PgPool,
        id: i64,
    ) -> Result<Option<TaskWithProject>, sqlx::Error> {
        let Some(task) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        // The foreign key guarantees the project exists
        let project = Project::find_by_id(pool, task.project_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(Some(TaskWithProject { task, project }))
    }

    /// Lists the tasks of a project, ordered by id
    pub async fn list_by_project(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY id"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks matching every provided filter, ordered by id
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE TRUE"));

        if let Some(status) = &filter.status {
            query.push(" AND status ILIKE ").push_bind(like_pattern(status));
        }
        if let Some(priority) = &filter.priority {
            query.push(" AND priority ILIKE ").push_bind(like_pattern(priority));
        }
        if let Some(from) = filter.from {
            query.push(" AND due_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND due_date <= ").push_bind(to);
        }
        if let Some(project_id) = filter.project_id {
            query.push(" AND project_id = ").push_bind(project_id);
        }

        query.push(" ORDER BY id");

        let tasks = query.build_query_as::<Task>().fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Updates a task
    ///
    /// # Returns
    ///
    /// The updated task, or None if it doesn't exist
    pub async fn update(pool: &PgPool, id: i64, data: UpdateTask) -> Result<Option<Self>, sqlx::Error> {
        let (set_description, description) = match data.description {
            Some(value) => (true, value),
            None => (false, None),
        };

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET project_id = COALESCE($2, project_id),
                title = $3,
                status = $4,
                priority = $5,
                due_date = $6,
                description = CASE WHEN $7 THEN $8 ELSE description END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.status.as_str())
        .bind(data.priority.as_str())
        .bind(data.due_date)
        .bind(set_description)
        .bind(description)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// # Returns
    ///
    /// True if the task was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
