use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Schedule;

const COLUMNS: &str = "id, weekday, shift, code, description";

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Schedule>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM schedules WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Schedule>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM schedules WHERE code = $1"))
        .bind(code)
        .fetch_optional(pool)
        .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Schedule>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM schedules ORDER BY weekday, shift"
    ))
    .fetch_all(pool)
    .await
}

pub async fn insert(
    pool: &PgPool,
    weekday: i32,
    shift: i32,
    code: &str,
    description: Option<&str>,
) -> Result<Schedule, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO schedules (weekday, shift, code, description) \
         VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
    ))
    .bind(weekday)
    .bind(shift)
    .bind(code)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, schedule: &Schedule) -> Result<Schedule, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE schedules SET weekday = $2, shift = $3, code = $4, description = $5 \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(schedule.id)
    .bind(schedule.weekday)
    .bind(schedule.shift)
    .bind(&schedule.code)
    .bind(schedule.description.as_deref())
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
