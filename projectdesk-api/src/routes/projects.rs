/// Project endpoints
///
/// # Endpoints
///
/// - `GET /project?name=&status=&from=&to=` - List projects
/// - `POST /project` - Create a project
/// - `GET /project/:id` - Show a project with its tasks
/// - `PUT /project/:id` - Update a project
/// - `DELETE /project/:id` - Delete a project and its tasks

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    routes::{non_empty, DataResponse, MessageResponse},
    validation::{taken_message, FieldErrors, Payload},
};
use axum::{extract::State, http::StatusCode};
use projectdesk_shared::models::project::{
    CreateProject, Project, ProjectFilter, ProjectStatus, ProjectWithTasks, UpdateProject,
};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

/// Query parameters of `GET /project`
#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    /// Substring of the name
    pub name: Option<String>,

    /// Substring of the status
    pub status: Option<String>,

    /// Earliest creation date, `YYYY-MM-DD`, inclusive
    pub from: Option<String>,

    /// Latest creation date, `YYYY-MM-DD`, inclusive
    pub to: Option<String>,
}

impl ProjectListQuery {
    fn into_filter(self) -> ApiResult<ProjectFilter> {
        let mut errors = FieldErrors::new();

        let from = errors.date("from", non_empty(self.from).as_deref());
        let to = errors.date("to", non_empty(self.to).as_deref());

        errors.into_result()?;

        Ok(ProjectFilter {
            name: non_empty(self.name),
            status: non_empty(self.status),
            from,
            to,
        })
    }
}

/// Body of create and update requests
#[derive(Debug, Default, Validate)]
pub struct ProjectRequest {
    #[validate(
        required(message = "The name field is required."),
        length(min = 3, max = 100, message = "The name field must be between 3 and 100 characters.")
    )]
    pub name: Option<String>,

    /// Omitted leaves the stored value alone on update; `null` clears it
    pub description: Option<Option<String>>,

    #[validate(required(message = "The status field is required."))]
    pub status: Option<String>,
}

/// Fields of a project request that passed validation
struct ValidProject {
    name: String,
    description: Option<Option<String>>,
    status: ProjectStatus,
}

impl ProjectRequest {
    fn parse(body: Value) -> ApiResult<(Self, FieldErrors)> {
        let mut payload = Payload::new(body)?;

        let req = Self {
            name: payload.text("name"),
            description: payload.nullable_text("description"),
            status: payload.text("status"),
        };

        let errors = payload.finish(&req);
        Ok((req, errors))
    }

    /// Runs the remaining rules, including name uniqueness
    ///
    /// `except_id` is the project being updated, whose own name doesn't
    /// count as taken.
    async fn validate_with(
        self,
        mut errors: FieldErrors,
        state: &AppState,
        except_id: Option<i64>,
    ) -> ApiResult<ValidProject> {

        let allowed = ProjectStatus::ALL.map(|s| s.as_str());
        let status = errors.enum_value::<ProjectStatus>("status", self.status.as_deref(), &allowed);

        if let Some(name) = self.name.as_deref() {
            if !errors.has("name") && Project::name_taken(&state.db, name, except_id).await? {
                errors.add("name", taken_message("name"));
            }
        }

        errors.into_result()?;

        match (self.name, status) {
            (Some(name), Some(status)) => Ok(ValidProject {
                name,
                description: self.description,
                status,
            }),
            _ => Err(ApiError::InternalError(
                "Project request passed validation with missing fields".to_string(),
            )),
        }
    }
}

/// List projects
///
/// Filters combine with AND. `name` and `status` match substrings without
/// regard to case; `from` and `to` bound the creation date inclusively.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: `from` or `to` is not a date
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> ApiResult<axum::Json<DataResponse<Vec<Project>>>> {
    let filter = query.into_filter()?;
    let projects = Project::list(&state.db, &filter).await?;

    Ok(DataResponse::new("Project list", projects))
}

/// Create a project
///
/// # Request
///
/// ```json
/// { "name": "Website", "description": "Company site", "status": "active" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Name missing, out of range or taken, or
///   status not one of `active`, `inactive`
pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, axum::Json<DataResponse<Project>>)> {
    let (req, errors) = ProjectRequest::parse(body)?;
    let valid = req.validate_with(errors, &state, None).await?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name: valid.name,
            description: valid.description.flatten(),
            status: valid.status,
        },
    )
    .await?;

    tracing::info!(project_id = project.id, name = %project.name, "Project created");

    Ok(DataResponse::created("Project created", project))
}

/// Show a project with its tasks
pub async fn show_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<axum::Json<DataResponse<ProjectWithTasks>>> {
    let project = Project::find_with_tasks(&state.db, id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(DataResponse::new("Project found", project))
}

/// Update a project
///
/// Name and status are required. A rejected update leaves the stored
/// project unchanged.
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult<axum::Json<DataResponse<Project>>> {
    if !Project::exists(&state.db, id).await? {
        return Err(ApiError::not_found());
    }

    let (req, errors) = ProjectRequest::parse(body)?;
    let valid = req.validate_with(errors, &state, Some(id)).await?;

    let project = Project::update(
        &state.db,
        id,
        UpdateProject {
            name: valid.name,
            description: valid.description,
            status: valid.status,
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    tracing::info!(project_id = project.id, "Project updated");

    Ok(DataResponse::new("Project updated", project))
}

/// Delete a project
///
/// Its tasks are deleted with it.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<axum::Json<MessageResponse>> {
    if !Project::delete(&state.db, id).await? {
        return Err(ApiError::not_found());
    }

    tracing::info!(project_id = id, "Project deleted");

    Ok(MessageResponse::new("Project deleted"))
}
