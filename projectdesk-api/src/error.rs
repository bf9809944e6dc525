/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`, which converts to a JSON body
/// with a `message` field and, for validation failures, an `errors` object
/// keyed by field name.
///
/// # Example
///
/// ```
/// use projectdesk_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(id: i64) -> ApiResult<Json<Value>> {
///     if id <= 0 {
///         return Err(ApiError::NotFound("Resource not found.".to_string()));
///     }
///     Ok(Json(json!({ "message": "Found", "data": id })))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use projectdesk_shared::auth::{authorization::AuthzError, middleware::AuthError, password::PasswordError};
use serde::Serialize;
use std::fmt;

use crate::validation::{invalid_reference_message, taken_message, FieldErrors};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400), e.g. malformed JSON
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Unprocessable entity (422), one or more fields failed validation
    ValidationError(FieldErrors),

    /// Internal server error (500); the detail is logged, never returned
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,

    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

pub const NOT_FOUND_MESSAGE: &str = "Resource not found.";
pub const UNAUTHENTICATED_MESSAGE: &str = "Unauthenticated.";
pub const FORBIDDEN_MESSAGE: &str = "This action is unauthorized.";

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::NotFound(NOT_FOUND_MESSAGE.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Summary line for a validation failure: the first message, plus how many
/// more follow
fn validation_summary(errors: &FieldErrors) -> String {
    let first = errors
        .first_message()
        .unwrap_or("The given data was invalid.")
        .to_string();

    match errors.len() {
        0 | 1 => first,
        2 => format!("{} (and 1 more error)", first),
        n => format!("{} (and {} more errors)", first, n - 1),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, errors) = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg) => (msg, None),
            ApiError::ValidationError(errors) => (validation_summary(&errors), Some(errors)),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
        };

        (status, Json(ErrorResponse { message, errors })).into_response()
    }
}

/// Field reported for a violated constraint
fn constraint_field(constraint: &str) -> Option<&'static str> {
    match constraint {
        "projects_name_key" => Some("name"),
        "clients_code_key" => Some("code"),
        "users_email_key" => Some("email"),
        "tasks_project_id_fkey" => Some("project_id"),
        _ => None,
    }
}

/// Convert sqlx errors to API errors
///
/// Unique and foreign key violations on known constraints become 422
/// responses for the offending field. This covers the race where two
/// requests pass the handler checks at the same time.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found(),
            sqlx::Error::Database(db_err) => {
                let field = db_err.constraint().and_then(constraint_field);

                match field {
                    Some(field) if db_err.is_unique_violation() => {
                        ApiError::ValidationError(FieldErrors::single(field, taken_message(field)))
                    }
                    Some(field) if db_err.is_foreign_key_violation() => ApiError::ValidationError(
                        FieldErrors::single(field, invalid_reference_message(field)),
                    ),
                    _ => ApiError::InternalError(format!("Database error: {}", db_err)),
                }
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert authentication errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials | AuthError::InvalidFormat | AuthError::InvalidToken => {
                ApiError::Unauthorized(UNAUTHENTICATED_MESSAGE.to_string())
            }
            AuthError::DatabaseError(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(_) => ApiError::Forbidden(FORBIDDEN_MESSAGE.to_string()),
            AuthzError::DatabaseError(err) => {
                ApiError::InternalError(format!("Database error: {}", err))
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Ids that don't parse can't match a row
impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::not_found()
    }
}
