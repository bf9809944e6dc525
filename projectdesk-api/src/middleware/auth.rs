/// Authentication and permission interceptors
///
/// Routes are composed as `authenticate -> require_permission -> handler`.
/// [`authenticate`] resolves the bearer token and stores an
/// [`AuthContext`] in the request extensions; [`require_permission`] reads
/// it back and checks the cached role grants.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::delete, Router};
/// use projectdesk_api::app::AppState;
/// use projectdesk_api::middleware::auth::{authenticate, require_permission};
/// use projectdesk_shared::auth::authorization::Permission;
///
/// # fn example(state: AppState) -> Router<AppState> {
/// # async fn handler() {}
/// Router::new()
///     .route(
///         "/client/:id",
///         delete(handler).route_layer(middleware::from_fn_with_state(
///             (state.clone(), Permission::Destroy),
///             require_permission,
///         )),
///     )
///     .route_layer(middleware::from_fn_with_state(state, authenticate))
/// # }
/// ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use projectdesk_shared::auth::{
    authorization::Permission,
    middleware::{bearer_token, resolve_token, AuthContext},
};

use crate::{app::AppState, error::ApiError};

/// Resolves the bearer token and attaches the caller's [`AuthContext`]
///
/// # Errors
///
/// 401 when the header is missing, not a bearer token, or the token is
/// unknown or revoked
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;
    let context = resolve_token(&state.db, token).await?;

    tracing::debug!(user_id = context.user_id, token_id = context.token_id, "Request authenticated");
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

/// Rejects callers whose roles don't grant the route's permission
///
/// Must run after [`authenticate`].
///
/// # Errors
///
/// 403 when no role of the caller grants `permission`
pub async fn require_permission(
    State((state, permission)): State<(AppState, Permission)>,
    Extension(auth): Extension<AuthContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(err) = state.permissions.require(&auth, permission).await {
        tracing::warn!(
            user_id = auth.user_id,
            roles = ?auth.roles,
            permission = %permission,
            "Permission denied"
        );
        return Err(err.into());
    }

    Ok(next.run(req).await)
}
