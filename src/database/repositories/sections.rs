use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::database::models::Section;

const COLUMNS: &str =
    "id, code, name, available_seats, subject_id, instructor_id, schedule_id, created_at";

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Section>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM sections WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Load the section row with an exclusive lock. This is the single
/// serialization point for concurrent enrolls against one section: the
/// second transaction blocks here until the first commits its seat count.
pub async fn find_by_id_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<Section>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM sections WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Section>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM sections WHERE code = $1"))
        .bind(code)
        .fetch_optional(pool)
        .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Section>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM sections ORDER BY code"))
        .fetch_all(pool)
        .await
}

pub async fn list_by_instructor(
    pool: &PgPool,
    instructor_id: Uuid,
) -> Result<Vec<Section>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM sections WHERE instructor_id = $1 ORDER BY code"
    ))
    .bind(instructor_id)
    .fetch_all(pool)
    .await
}

pub async fn insert(
    pool: &PgPool,
    code: &str,
    name: &str,
    available_seats: i32,
    subject_id: Option<Uuid>,
    instructor_id: Option<Uuid>,
    schedule_id: Option<Uuid>,
) -> Result<Section, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO sections (code, name, available_seats, subject_id, instructor_id, schedule_id) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
    ))
    .bind(code)
    .bind(name)
    .bind(available_seats)
    .bind(subject_id)
    .bind(instructor_id)
    .bind(schedule_id)
    .fetch_one(pool)
    .await
}

pub async fn update(pool: &PgPool, section: &Section) -> Result<Section, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE sections SET code = $2, name = $3, available_seats = $4, subject_id = $5, \
         instructor_id = $6, schedule_id = $7 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(section.id)
    .bind(&section.code)
    .bind(&section.name)
    .bind(section.available_seats)
    .bind(section.subject_id)
    .bind(section.instructor_id)
    .bind(section.schedule_id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sections WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Take one seat. Caller must hold the row lock and have verified the
/// seat count; the WHERE guard keeps the counter from going negative even so.
pub async fn decrement_seats<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE sections SET available_seats = available_seats - 1 \
         WHERE id = $1 AND available_seats > 0",
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Give one seat back (withdraw path)
pub async fn increment_seats<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE sections SET available_seats = available_seats + 1 WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_by_subject(pool: &PgPool, subject_id: Uuid) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sections WHERE subject_id = $1")
        .bind(subject_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_by_schedule(pool: &PgPool, schedule_id: Uuid) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sections WHERE schedule_id = $1")
        .bind(schedule_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
