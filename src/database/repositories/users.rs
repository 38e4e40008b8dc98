use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::database::models::{Role, User};

// Roles live in a join table; every user read aggregates them so the
// domain record always carries the full label set.
const SELECT_USER: &str = r#"
    SELECT u.id, u.email, u.name, u.password_hash, u.ra, u.siape,
           u.token_version,
           array_remove(array_agg(ur.role), NULL) AS roles,
           u.created_at
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
"#;

fn select(where_clause: &str) -> String {
    format!("{SELECT_USER} {where_clause} GROUP BY u.id")
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&select("WHERE u.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&select("WHERE u.email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as(&format!("{} ORDER BY u.created_at", select("")))
        .fetch_all(pool)
        .await
}

pub async fn list_by_role(pool: &PgPool, role: Role) -> Result<Vec<User>, sqlx::Error> {
    // Membership filter in a subquery so the aggregate still sees all labels
    let sql = format!(
        "{} ORDER BY u.name",
        select("WHERE u.id IN (SELECT user_id FROM user_roles WHERE role = $1)")
    );
    sqlx::query_as(&sql).bind(role.as_str()).fetch_all(pool).await
}

pub async fn insert(
    pool: &PgPool,
    email: &str,
    name: &str,
    password_hash: &str,
    ra: Option<&str>,
    siape: Option<&str>,
) -> Result<Uuid, sqlx::Error> {
    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO users (email, name, password_hash, ra, siape) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(ra)
    .bind(siape)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    password_hash: Option<&str>,
    ra: Option<&str>,
    siape: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET name = coalesce($2, name), \
         password_hash = coalesce($3, password_hash), \
         ra = coalesce($4, ra), siape = coalesce($5, siape) \
         WHERE id = $1",
    )
    .bind(id)
    .bind(name)
    .bind(password_hash)
    .bind(ra)
    .bind(siape)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn add_role<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    role: Role,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .bind(role.as_str())
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn remove_role<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    role: Role,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role = $2")
        .bind(user_id)
        .bind(role.as_str())
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Bump the token-invalidation counter; outstanding tokens carrying the
/// old version are no longer refreshable.
pub async fn increment_token_version<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET token_version = token_version + 1 WHERE id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}
