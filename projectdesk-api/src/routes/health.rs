/// Health check endpoint
///
/// Verifies that the server is running and the database is reachable, and
/// reports connection pool usage and whether migrations are current.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "active_connections": 1, "idle_connections": 4, "total_connections": 5 },
///   "migrations_up_to_date": true
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use projectdesk_shared::db::{
    migrations::get_migration_status,
    pool::{ping, pool_stats, PoolStats},
};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: &'static str,

    /// Application version
    pub version: &'static str,

    /// `connected` or `disconnected`
    pub database: &'static str,

    /// Connection pool usage
    pub pool: PoolStats,

    /// Unknown while the database is unreachable
    pub migrations_up_to_date: Option<bool>,
}

/// Health check handler
///
/// Always answers 200; a failing database shows up as `degraded`.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = match ping(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    let migrations_up_to_date = if connected {
        get_migration_status(&state.db)
            .await
            .ok()
            .map(|status| status.is_up_to_date)
    } else {
        None
    };

    Ok(Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if connected { "connected" } else { "disconnected" },
        pool: pool_stats(&state.db),
        migrations_up_to_date,
    }))
}
