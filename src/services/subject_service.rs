use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Subject;
use crate::database::repositories::{sections, subjects};

use super::{conflict_on_unique, ServiceError, ServiceResult};

#[derive(Debug, Deserialize)]
pub struct CreateSubject {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub credit_hours: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubject {
    pub code: Option<String>,
    pub name: Option<String>,
    pub credit_hours: Option<i32>,
}

pub async fn list_all(pool: &PgPool) -> ServiceResult<Vec<Subject>> {
    Ok(subjects::list_all(pool).await?)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> ServiceResult<Subject> {
    subjects::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Subject not found (id: {id})")))
}

pub async fn create(pool: &PgPool, payload: CreateSubject) -> ServiceResult<Subject> {
    if subjects::find_by_code(pool, &payload.code).await?.is_some() {
        return Err(ServiceError::Conflict("Subject code already exists".into()));
    }

    subjects::insert(pool, &payload.code, &payload.name, payload.credit_hours)
        .await
        .map_err(|e| conflict_on_unique(e, "Subject code already exists"))
}

pub async fn update(pool: &PgPool, id: Uuid, payload: UpdateSubject) -> ServiceResult<Subject> {
    let existing = get_by_id(pool, id).await?;

    let updated = Subject {
        id: existing.id,
        code: payload.code.unwrap_or(existing.code),
        name: payload.name.unwrap_or(existing.name),
        credit_hours: payload.credit_hours.unwrap_or(existing.credit_hours),
    };

    if let Some(other) = subjects::find_by_code(pool, &updated.code).await? {
        if other.id != id {
            return Err(ServiceError::Conflict("Subject code already exists".into()));
        }
    }

    subjects::update(pool, &updated)
        .await
        .map_err(|e| conflict_on_unique(e, "Subject code already exists"))
}

/// Deletion is blocked while any section references the subject
pub async fn delete(pool: &PgPool, id: Uuid) -> ServiceResult<()> {
    get_by_id(pool, id).await?;

    let referencing = sections::count_by_subject(pool, id).await?;
    if referencing > 0 {
        return Err(ServiceError::Conflict(
            "Cannot delete a subject referenced by sections".into(),
        ));
    }

    subjects::delete(pool, id).await?;
    Ok(())
}
