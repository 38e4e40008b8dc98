use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Schedule;
use crate::database::repositories::{schedules, sections};

use super::{conflict_on_unique, ServiceError, ServiceResult};

#[derive(Debug, Deserialize)]
pub struct CreateSchedule {
    pub weekday: i32,
    pub shift: i32,
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSchedule {
    pub weekday: Option<i32>,
    pub shift: Option<i32>,
    pub code: Option<String>,
    pub description: Option<String>,
}

pub async fn list_all(pool: &PgPool) -> ServiceResult<Vec<Schedule>> {
    Ok(schedules::list_all(pool).await?)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> ServiceResult<Schedule> {
    schedules::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Schedule not found (id: {id})")))
}

pub async fn create(pool: &PgPool, payload: CreateSchedule) -> ServiceResult<Schedule> {
    if schedules::find_by_code(pool, &payload.code).await?.is_some() {
        return Err(ServiceError::Conflict("Schedule code already exists".into()));
    }

    schedules::insert(
        pool,
        payload.weekday,
        payload.shift,
        &payload.code,
        payload.description.as_deref(),
    )
    .await
    .map_err(|e| conflict_on_unique(e, "Schedule code already exists"))
}

pub async fn update(pool: &PgPool, id: Uuid, payload: UpdateSchedule) -> ServiceResult<Schedule> {
    let existing = get_by_id(pool, id).await?;

    let updated = Schedule {
        id: existing.id,
        weekday: payload.weekday.unwrap_or(existing.weekday),
        shift: payload.shift.unwrap_or(existing.shift),
        code: payload.code.unwrap_or(existing.code),
        description: payload.description.or(existing.description),
    };

    if let Some(other) = schedules::find_by_code(pool, &updated.code).await? {
        if other.id != id {
            return Err(ServiceError::Conflict("Schedule code already exists".into()));
        }
    }

    schedules::update(pool, &updated)
        .await
        .map_err(|e| conflict_on_unique(e, "Schedule code already exists"))
}

/// Deletion is blocked while any section references the schedule
pub async fn delete(pool: &PgPool, id: Uuid) -> ServiceResult<()> {
    get_by_id(pool, id).await?;

    let referencing = sections::count_by_schedule(pool, id).await?;
    if referencing > 0 {
        return Err(ServiceError::Conflict(
            "Cannot delete a schedule referenced by sections".into(),
        ));
    }

    schedules::delete(pool, id).await?;
    Ok(())
}
