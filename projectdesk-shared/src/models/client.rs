/// Client model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE clients (
///     id BIGSERIAL PRIMARY KEY,
///     code VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     lastname VARCHAR(255) NOT NULL,
///     phone VARCHAR(20) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

const CLIENT_COLUMNS: &str = "id, code, name, lastname, phone, created_at, updated_at";

/// Client record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: i64,

    /// Unique business code (e.g. "CL042")
    pub code: String,

    pub name: String,
    pub lastname: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client fields, used for both create and full update
#[derive(Debug, Clone)]
pub struct ClientData {
    pub code: String,
    pub name: String,
    pub lastname: String,
    pub phone: String,
}

impl Client {
    /// Creates a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the code already exists (`clients_code_key`)
    pub async fn create(pool: &PgPool, data: ClientData) -> Result<Self, sqlx::Error> {
        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients (code, name, lastname, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(data.code)
        .bind(data.name)
        .bind(data.lastname)
        .bind(data.phone)
        .fetch_one(pool)
        .await?;

        Ok(client)
    }

    /// Finds a client by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(client)
    }

    /// Lists all clients, ordered by id
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY id"
        ))
        .fetch_all(pool)
        .await?;

        Ok(clients)
    }

    /// Replaces every field of a client
    ///
    /// # Returns
    ///
    /// The updated client, or None if it doesn't exist
    pub async fn update(pool: &PgPool, id: i64, data: ClientData) -> Result<Option<Self>, sqlx::Error> {
        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE clients
            SET code = $2, name = $3, lastname = $4, phone = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(data.code)
        .bind(data.name)
        .bind(data.lastname)
        .bind(data.phone)
        .fetch_optional(pool)
        .await?;

        Ok(client)
    }

    /// Deletes a client
    ///
    /// # Returns
    ///
    /// True if the client was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Checks whether a code is already used by another client
    ///
    /// `except_id` excludes the client being updated from the check.
    pub async fn code_taken(
        pool: &PgPool,
        code: &str,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM clients WHERE code = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(code)
        .bind(except_id)
        .fetch_one(pool)
        .await
    }
}
