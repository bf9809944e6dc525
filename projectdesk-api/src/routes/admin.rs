/// Administrative endpoints
///
/// # Endpoints
///
/// - `POST /admin/permissions/reload` - Reload the role to permission map
///   from the database (`destroy` permission)

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use projectdesk_shared::auth::middleware::AuthContext;
use serde::Serialize;

/// Reload response
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub message: String,

    /// Number of roles now cached
    pub roles: usize,
}

/// Reload the permission cache
///
/// Role or grant changes made directly in the database take effect for
/// the next request after this call.
pub async fn reload_permissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ReloadResponse>> {
    let roles = state.permissions.reload(&state.db).await?;

    tracing::info!(user_id = auth.user_id, roles, "Permission cache reloaded on request");

    Ok(Json(ReloadResponse {
        message: "Permissions reloaded".to_string(),
        roles,
    }))
}
