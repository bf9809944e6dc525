/// Personal access token model and database operations
///
/// Each successful login creates one row; logout deletes only the row of
/// the token that was presented. See [`crate::auth::token`] for the token
/// format.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE personal_access_tokens (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     token_hash CHAR(64) NOT NULL UNIQUE,
///     last_used_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::models::access_token::AccessToken;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: i64) -> Result<(), sqlx::Error> {
/// let (token, plaintext) = AccessToken::create(&pool, user_id, "api-token").await?;
///
/// // Later, on an incoming request
/// let found = AccessToken::authenticate(&pool, &plaintext).await?;
/// assert_eq!(found.map(|t| t.id), Some(token.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::auth::token;

/// Access token record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AccessToken {
    pub id: i64,

    /// Owner of the token
    pub user_id: i64,

    /// Label given at creation (e.g. "api-token")
    pub name: String,

    /// SHA-256 hex digest of the secret
    #[serde(skip_serializing)]
    pub token_hash: String,

    /// When the token last authenticated a request
    pub last_used_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    /// Issues a new token for a user
    ///
    /// # Returns
    ///
    /// Tuple of (token record, plaintext `id|secret` string). The plaintext
    /// is only available here.
    pub async fn create(pool: &PgPool, user_id: i64, name: &str) -> Result<(Self, String), sqlx::Error> {
        let secret = token::generate_secret();
        let token_hash = token::hash_secret(&secret);

        let record = sqlx::query_as::<_, AccessToken>(
            r#"
            INSERT INTO personal_access_tokens (user_id, name, token_hash)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, token_hash, last_used_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(token_hash)
        .fetch_one(pool)
        .await?;

        let plaintext = token::format_token(record.id, &secret);

        Ok((record, plaintext))
    }

    /// Resolves a presented plaintext token to its record
    ///
    /// Returns None for malformed, unknown or mismatching tokens. Updates
    /// `last_used_at` when the token is valid.
    pub async fn authenticate(pool: &PgPool, plaintext: &str) -> Result<Option<Self>, sqlx::Error> {
        let Ok((id, secret)) = token::parse_token(plaintext) else {
            return Ok(None);
        };

        let record = sqlx::query_as::<_, AccessToken>(
            r#"
            SELECT id, user_id, name, token_hash, last_used_at, created_at
            FROM personal_access_tokens
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(record) = record.filter(|r| token::verify_secret(secret, &r.token_hash)) else {
            return Ok(None);
        };

        sqlx::query("UPDATE personal_access_tokens SET last_used_at = NOW() WHERE id = $1")
            .bind(record.id)
            .execute(pool)
            .await?;

        Ok(Some(record))
    }

    /// Deletes a single token
    ///
    /// # Returns
    ///
    /// True if the token was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts the tokens a user currently holds
    pub async fn count_for_user(pool: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM personal_access_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }
}
