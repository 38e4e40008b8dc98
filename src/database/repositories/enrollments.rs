use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::database::models::Enrollment;

const COLUMNS: &str = "id, student_id, section_id, created_at";

pub async fn exists<'e>(
    executor: impl PgExecutor<'e>,
    student_id: Uuid,
    section_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM enrollments WHERE student_id = $1 AND section_id = $2")
            .bind(student_id)
            .bind(section_id)
            .fetch_optional(executor)
            .await?;
    Ok(row.is_some())
}

/// Does the student already hold an enrollment in another section that
/// occupies the given schedule slot?
pub async fn schedule_clash<'e>(
    executor: impl PgExecutor<'e>,
    student_id: Uuid,
    schedule_id: Uuid,
    exclude_section: Uuid,
) -> Result<bool, sqlx::Error> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT e.id FROM enrollments e \
         JOIN sections s ON s.id = e.section_id \
         WHERE e.student_id = $1 AND s.schedule_id = $2 AND e.section_id <> $3 \
         LIMIT 1",
    )
    .bind(student_id)
    .bind(schedule_id)
    .bind(exclude_section)
    .fetch_optional(executor)
    .await?;
    Ok(row.is_some())
}

pub async fn insert<'e>(
    executor: impl PgExecutor<'e>,
    student_id: Uuid,
    section_id: Uuid,
) -> Result<Enrollment, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO enrollments (student_id, section_id) VALUES ($1, $2) RETURNING {COLUMNS}"
    ))
    .bind(student_id)
    .bind(section_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM enrollments WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_by_student(pool: &PgPool, student_id: Uuid) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE student_id = $1 ORDER BY created_at"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM enrollments ORDER BY created_at"))
        .fetch_all(pool)
        .await
}

pub async fn count_by_section(pool: &PgPool, section_id: Uuid) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM enrollments WHERE section_id = $1")
        .bind(section_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
