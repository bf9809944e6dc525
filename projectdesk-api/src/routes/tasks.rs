/// Task endpoints
///
/// # Endpoints
///
/// - `GET /task?status=&priority=&from=&to=&project_id=` - List tasks
/// - `POST /task` - Create a task
/// - `GET /task/:id` - Show a task with its project
/// - `PUT /task/:id` - Update a task
/// - `DELETE /task/:id` - Delete a task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    routes::{non_empty, DataResponse, MessageResponse},
    validation::{integer_message, invalid_reference_message, FieldErrors, Payload},
};
use axum::{extract::State, http::StatusCode};
use chrono::NaiveDate;
use projectdesk_shared::models::{
    project::Project,
    task::{CreateTask, Task, TaskFilter, TaskPriority, TaskStatus, TaskWithProject, UpdateTask},
};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

/// Query parameters of `GET /task`
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    /// Substring of the status
    pub status: Option<String>,

    /// Substring of the priority
    pub priority: Option<String>,

    /// Earliest due date, inclusive
    pub from: Option<String>,

    /// Latest due date, inclusive
    pub to: Option<String>,

    /// Exact project id
    pub project_id: Option<String>,
}

impl TaskListQuery {
    fn into_filter(self) -> ApiResult<TaskFilter> {
        let mut errors = FieldErrors::new();

        let from = errors.date("from", non_empty(self.from).as_deref());
        let to = errors.date("to", non_empty(self.to).as_deref());

        let project_id = match non_empty(self.project_id) {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("project_id", integer_message("project_id"));
                    None
                }
            },
            None => None,
        };

        errors.into_result()?;

        Ok(TaskFilter {
            status: non_empty(self.status),
            priority: non_empty(self.priority),
            from,
            to,
            project_id,
        })
    }
}

/// Body of create and update requests
///
/// `project_id` is required on create and optional on update. It may be sent
/// as a number or a numeric string.
#[derive(Debug, Default, Validate)]
pub struct TaskRequest {
    pub project_id: Option<i64>,

    #[validate(
        required(message = "The title field is required."),
        length(min = 3, max = 100, message = "The title field must be between 3 and 100 characters.")
    )]
    pub title: Option<String>,

    /// Omitted leaves the stored value alone on update; `null` clears it
    pub description: Option<Option<String>>,

    #[validate(required(message = "The status field is required."))]
    pub status: Option<String>,

    #[validate(required(message = "The priority field is required."))]
    pub priority: Option<String>,

    #[validate(required(message = "The due date field is required."))]
    pub due_date: Option<String>,
}

/// Fields of a task request that passed validation
struct ValidTask {
    project_id: Option<i64>,
    title: String,
    description: Option<Option<String>>,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: NaiveDate,
}

impl TaskRequest {
    fn parse(body: Value) -> ApiResult<(Self, FieldErrors)> {
        let mut payload = Payload::new(body)?;

        let req = Self {
            project_id: payload.integer("project_id"),
            title: payload.text("title"),
            description: payload.nullable_text("description"),
            status: payload.text("status"),
            priority: payload.text("priority"),
            due_date: payload.text("due_date"),
        };

        let errors = payload.finish(&req);
        Ok((req, errors))
    }

    /// Runs the remaining rules, including the project reference
    async fn validate_with(
        self,
        mut errors: FieldErrors,
        state: &AppState,
        project_required: bool,
    ) -> ApiResult<ValidTask> {
        match self.project_id {
            Some(project_id) => {
                if !Project::exists(&state.db, project_id).await? {
                    errors.add("project_id", invalid_reference_message("project_id"));
                }
            }
            None if project_required && !errors.has("project_id") => {
                errors.add("project_id", "The project id field is required.");
            }
            None => {}
        }

        let statuses = TaskStatus::ALL.map(|s| s.as_str());
        let status = errors.enum_value::<TaskStatus>("status", self.status.as_deref(), &statuses);

        let priorities = TaskPriority::ALL.map(|p| p.as_str());
        let priority =
            errors.enum_value::<TaskPriority>("priority", self.priority.as_deref(), &priorities);

        let due_date = errors.date("due_date", self.due_date.as_deref());

        errors.into_result()?;

        match (self.title, status, priority, due_date) {
            (Some(title), Some(status), Some(priority), Some(due_date)) => Ok(ValidTask {
                project_id: self.project_id,
                title,
                description: self.description,
                status,
                priority,
                due_date,
            }),
            _ => Err(ApiError::InternalError(
                "Task request passed validation with missing fields".to_string(),
            )),
        }
    }
}

/// List tasks
///
/// Filters combine with AND. `status` and `priority` match substrings,
/// `from` and `to` bound the due date inclusively and `project_id` must
/// match exactly.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: A date or the project id doesn't parse
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<axum::Json<DataResponse<Vec<Task>>>> {
    let filter = query.into_filter()?;
    let tasks = Task::list(&state.db, &filter).await?;

    Ok(DataResponse::new("Task list", tasks))
}

/// Create a task
///
/// # Request
///
/// ```json
/// {
///   "project_id": 1,
///   "title": "Write release notes",
///   "status": "pending",
///   "priority": "high",
///   "due_date": "2025-06-01"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: A field is missing or invalid, or the
///   project doesn't exist
pub async fn create_task(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, axum::Json<DataResponse<Task>>)> {
    let (req, errors) = TaskRequest::parse(body)?;
    let valid = req.validate_with(errors, &state, true).await?;

    let Some(project_id) = valid.project_id else {
        return Err(ApiError::InternalError(
            "Task request passed validation without a project".to_string(),
        ));
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id,
            title: valid.title,
            description: valid.description.flatten(),
            status: valid.status,
            priority: valid.priority,
            due_date: valid.due_date,
        },
    )
    .await?;

    tracing::info!(task_id = task.id, project_id = task.project_id, "Task created");

    Ok(DataResponse::created("Task created", task))
}

/// Show a task with its project
pub async fn show_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<axum::Json<DataResponse<TaskWithProject>>> {
    let task = Task::find_with_project(&state.db, id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(DataResponse::new("Task found", task))
}

/// Update a task
///
/// Without `project_id` the task stays in its current project.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult<axum::Json<DataResponse<Task>>> {
    if Task::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::not_found());
    }

    let (req, errors) = TaskRequest::parse(body)?;
    let valid = req.validate_with(errors, &state, false).await?;

    let task = Task::update(
        &state.db,
        id,
        UpdateTask {
            project_id: valid.project_id,
            title: valid.title,
            description: valid.description,
            status: valid.status,
            priority: valid.priority,
            due_date: valid.due_date,
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    tracing::info!(task_id = task.id, project_id = task.project_id, "Task updated");

    Ok(DataResponse::new("Task updated", task))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<axum::Json<MessageResponse>> {
    if !Task::delete(&state.db, id).await? {
        return Err(ApiError::not_found());
    }

    tracing::info!(task_id = id, "Task deleted");

    Ok(MessageResponse::new("Task deleted"))
}
