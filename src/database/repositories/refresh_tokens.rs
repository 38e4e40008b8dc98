use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::database::models::RefreshToken;

const COLUMNS: &str = "id, user_id, token_hash, token_version, revoked, expires_at, created_at";

pub async fn insert(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    token_version: i32,
    expires_at: DateTime<Utc>,
) -> Result<RefreshToken, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO refresh_tokens (user_id, token_hash, token_version, expires_at) \
         VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
    ))
    .bind(user_id)
    .bind(token_hash)
    .bind(token_version)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

pub async fn find_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<RefreshToken>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM refresh_tokens WHERE token_hash = $1"
    ))
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

/// Replace the stored hash in place: the old opaque token stops working
/// the moment the new one is issued.
pub async fn rotate(
    pool: &PgPool,
    id: Uuid,
    new_token_hash: &str,
    new_token_version: i32,
    new_expires_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE refresh_tokens \
         SET token_hash = $2, token_version = $3, expires_at = $4, revoked = false \
         WHERE id = $1",
    )
    .bind(id)
    .bind(new_token_hash)
    .bind(new_token_version)
    .bind(new_expires_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_by_user<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
