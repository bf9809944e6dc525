/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /login` - Exchange email and password for a bearer token
/// - `POST /logout` - Revoke the token used for the request

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Json,
    routes::MessageResponse,
    validation::Payload,
};
use axum::{extract::State, Extension};
use projectdesk_shared::{
    auth::{middleware::AuthContext, password},
    models::{access_token::AccessToken, role::Role, user::User},
};
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

/// Name recorded on tokens issued by `/login`
pub const LOGIN_TOKEN_NAME: &str = "api-token";

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Login request
///
/// The email is trimmed; the password is compared exactly as sent.
#[derive(Debug, Default, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,

    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
}

impl LoginRequest {
    fn parse(body: Value) -> ApiResult<Self> {
        let mut payload = Payload::new(body)?;

        let req = Self {
            email: payload.text("email"),
            password: payload.secret("password"),
        };

        payload.finish(&req).into_result()?;
        Ok(req)
    }
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,

    /// Plaintext bearer token, shown once
    pub token: String,

    /// Role names of the user
    pub rol: Vec<String>,

    pub user: User,
}

/// Login
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// { "email": "piero@prueba.com", "password": "12345678" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Login successful",
///   "token": "1|Xk3...",
///   "rol": ["superadmin"],
///   "user": { "id": 1, "name": "Piero", "email": "piero@prueba.com", ... }
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Missing email or password, or malformed email
/// - `401 Unauthorized`: Unknown email or wrong password; the response does
///   not say which
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<axum::Json<LoginResponse>> {
    let req = LoginRequest::parse(body)?;

    let (Some(email), Some(plaintext)) = (req.email, req.password) else {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let user = User::find_by_email(&state.db, &email).await?;

    let user = match user {
        Some(user) if password::verify_password(&plaintext, &user.password_hash)? => user,
        _ => {
            tracing::info!(email = %email, "Login failed");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    let (token, plaintext_token) = AccessToken::create(&state.db, user.id, LOGIN_TOKEN_NAME).await?;
    let roles = Role::names_for_user(&state.db, user.id).await?;

    tracing::info!(user_id = user.id, token_id = token.id, "User logged in");

    Ok(axum::Json(LoginResponse {
        message: "Login successful".to_string(),
        token: plaintext_token,
        rol: roles,
        user,
    }))
}

/// Logout
///
/// Deletes only the token presented in the `Authorization` header; other
/// sessions of the same user stay valid.
///
/// # Endpoint
///
/// ```text
/// POST /logout
/// Authorization: Bearer <token>
/// ```
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<axum::Json<MessageResponse>> {
    AccessToken::delete(&state.db, auth.token_id).await?;

    tracing::info!(user_id = auth.user_id, token_id = auth.token_id, "User logged out");

    Ok(MessageResponse::new("Logged out successfully"))
}
