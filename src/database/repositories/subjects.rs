use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Subject;

const COLUMNS: &str = "id, code, name, credit_hours";

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM subjects WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM subjects WHERE code = $1"))
        .bind(code)
        .fetch_optional(pool)
        .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM subjects ORDER BY code"))
        .fetch_all(pool)
        .await
}

pub async fn insert(
    pool: &PgPool,
    code: &str,
    name: &str,
    credit_hours: i32,
) -> Result<Subject, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO subjects (code, name, credit_hours) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
    ))
    .bind(code)
    .bind(name)
    .bind(credit_hours)
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, subject: &Subject) -> Result<Subject, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE subjects SET code = $2, name = $3, credit_hours = $4 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(subject.id)
    .bind(&subject.code)
    .bind(&subject.name)
    .bind(subject.credit_hours)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
