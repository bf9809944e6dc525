/// Bearer token authentication for Axum
///
/// Extracts the `Authorization: Bearer <id|secret>` header and resolves it
/// to the [`AuthContext`] of the caller. The API server's interceptor puts
/// that context into the request extensions for handlers to read.
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use projectdesk_shared::auth::middleware::{bearer_token, resolve_token, AuthError};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, headers: HeaderMap) -> Result<(), AuthError> {
/// let token = bearer_token(&headers)?;
/// let auth = resolve_token(&pool, token).await?;
/// println!("user {} with roles {:?}", auth.user_id, auth.roles);
/// # Ok(())
/// # }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::models::{access_token::AccessToken, role::Role};

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,

    /// ID of the token that authenticated this request
    pub token_id: i64,

    /// Role names assigned to the user
    pub roles: Vec<String>,
}

/// Error type for token authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but not a bearer token
    #[error("Expected a bearer token")]
    InvalidFormat,

    /// Token unknown, revoked or mismatching
    #[error("Invalid or revoked token")]
    InvalidToken,

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Extracts the bearer token from request headers
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidFormat)?;

    Ok(token)
}

/// Resolves a plaintext token to the caller's context
pub async fn resolve_token(pool: &PgPool, token: &str) -> Result<AuthContext, AuthError> {
    let record = AccessToken::authenticate(pool, token)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::InvalidToken)?;

    let roles = Role::names_for_user(pool, record.user_id)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    Ok(AuthContext {
        user_id: record.user_id,
        token_id: record.id,
        roles,
    })
}
