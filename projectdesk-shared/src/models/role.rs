/// Role model and role/permission assignments
///
/// Roles and permissions are rows scoped by a guard name. Grants live in
/// `role_has_permissions`; user assignments live in `model_has_roles`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE roles (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     guard_name VARCHAR(255) NOT NULL,
///     UNIQUE (name, guard_name)
/// );
///
/// CREATE TABLE role_has_permissions (permission_id BIGINT, role_id BIGINT);
/// CREATE TABLE model_has_roles (role_id BIGINT, user_id BIGINT);
/// ```
///
/// The roles `superadmin`, `admin` and `client` and their grants are seeded
/// by migration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Guard every API role and permission is registered under
pub const API_GUARD: &str = "api";

/// Role record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,

    /// Role name, unique per guard
    pub name: String,

    pub guard_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single (role, permission) grant as stored in `role_has_permissions`
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RoleGrant {
    pub role: String,
    pub permission: String,
}

impl Role {
    /// Finds a role by name under the given guard
    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
        guard: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, guard_name, created_at, updated_at
            FROM roles
            WHERE name = $1 AND guard_name = $2
            "#,
        )
        .bind(name)
        .bind(guard)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Lists all role names under the given guard, ordered by id
    pub async fn list_names(pool: &PgPool, guard: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT name FROM roles WHERE guard_name = $1 ORDER BY id")
            .bind(guard)
            .fetch_all(pool)
            .await
    }

    /// Loads every (role, permission) grant under the given guard
    pub async fn grants(pool: &PgPool, guard: &str) -> Result<Vec<RoleGrant>, sqlx::Error> {
        let grants = sqlx::query_as::<_, RoleGrant>(
            r#"
            SELECT r.name AS role, p.name AS permission
            FROM role_has_permissions rp
            JOIN roles r ON r.id = rp.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE r.guard_name = $1 AND p.guard_name = $1
            ORDER BY r.id, p.id
            "#,
        )
        .bind(guard)
        .fetch_all(pool)
        .await?;

        Ok(grants)
    }

    /// Returns the names of the roles assigned to a user
    pub async fn names_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM model_has_roles mr
            JOIN roles r ON r.id = mr.role_id
            WHERE mr.user_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Assigns the named role to a user
    ///
    /// Assigning a role the user already has is a no-op.
    ///
    /// # Returns
    ///
    /// False if no role with that name exists under the guard
    pub async fn assign_to_user(
        pool: &PgPool,
        user_id: i64,
        role_name: &str,
        guard: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO model_has_roles (role_id, user_id)
            SELECT id, $1 FROM roles WHERE name = $2 AND guard_name = $3
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_name)
        .bind(guard)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        Ok(Self::find_by_name(pool, role_name, guard).await?.is_some())
    }
}
