//! Section management: reference validation, unique code, and the
//! instructor/schedule conflict check shared with the enrollment engine's
//! clash detection. The application-level scan produces the friendly 409;
//! the partial unique index on (instructor_id, schedule_id) is the
//! authoritative backstop against two creates racing each other.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Role, Section};
use crate::database::repositories::{enrollments, schedules, sections, subjects, users};

use super::{conflict_on_constraint, ServiceError, ServiceResult};

// Both unique constraints on sections can fire from the same insert or
// update; the violated constraint's name picks the 409 message
const SECTION_CONFLICTS: &[(&str, &str)] = &[(
    "uniq_sections_instructor_schedule",
    "Instructor already has a section in this slot",
)];
const SECTION_CODE_TAKEN: &str = "Section code already exists";

#[derive(Debug, Deserialize)]
pub struct CreateSection {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub available_seats: i32,
    pub subject_id: Option<Uuid>,
    pub instructor_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
}

/// Partial update: absent fields keep their current value. Clearing an
/// optional link is done by updating with an explicit null.
#[derive(Debug, Deserialize)]
pub struct UpdateSection {
    pub code: Option<String>,
    pub name: Option<String>,
    pub available_seats: Option<i32>,
    #[serde(default, with = "double_option")]
    pub subject_id: Option<Option<Uuid>>,
    #[serde(default, with = "double_option")]
    pub instructor_id: Option<Option<Uuid>>,
    #[serde(default, with = "double_option")]
    pub schedule_id: Option<Option<Uuid>>,
}

// Distinguishes "field absent" from "field: null" for the optional links
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

pub async fn list_all(pool: &PgPool) -> ServiceResult<Vec<Section>> {
    Ok(sections::list_all(pool).await?)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> ServiceResult<Section> {
    sections::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Section not found (id: {id})")))
}

pub async fn list_by_instructor(pool: &PgPool, instructor_id: Uuid) -> ServiceResult<Vec<Section>> {
    Ok(sections::list_by_instructor(pool, instructor_id).await?)
}

pub async fn create(pool: &PgPool, payload: CreateSection) -> ServiceResult<Section> {
    if payload.available_seats < 0 {
        return Err(ServiceError::Conflict("Seat count cannot be negative".into()));
    }

    validate_references(
        pool,
        payload.subject_id,
        payload.schedule_id,
        payload.instructor_id,
    )
    .await?;

    if sections::find_by_code(pool, &payload.code).await?.is_some() {
        return Err(ServiceError::Conflict(SECTION_CODE_TAKEN.into()));
    }

    if let (Some(instructor_id), Some(schedule_id)) = (payload.instructor_id, payload.schedule_id) {
        check_instructor_slot_free(pool, instructor_id, schedule_id, None).await?;
    }

    sections::insert(
        pool,
        &payload.code,
        &payload.name,
        payload.available_seats,
        payload.subject_id,
        payload.instructor_id,
        payload.schedule_id,
    )
    .await
    .map_err(|e| conflict_on_constraint(e, SECTION_CONFLICTS, SECTION_CODE_TAKEN))
}

pub async fn update(pool: &PgPool, id: Uuid, payload: UpdateSection) -> ServiceResult<Section> {
    let existing = get_by_id(pool, id).await?;

    // Apply the patch before validating, so the conflict check sees the
    // (instructor, schedule) pair the row will actually end up with
    let updated = Section {
        id: existing.id,
        code: payload.code.unwrap_or(existing.code),
        name: payload.name.unwrap_or(existing.name),
        available_seats: payload.available_seats.unwrap_or(existing.available_seats),
        subject_id: payload.subject_id.unwrap_or(existing.subject_id),
        instructor_id: payload.instructor_id.unwrap_or(existing.instructor_id),
        schedule_id: payload.schedule_id.unwrap_or(existing.schedule_id),
        created_at: existing.created_at,
    };

    if updated.available_seats < 0 {
        return Err(ServiceError::Conflict("Seat count cannot be negative".into()));
    }

    validate_references(pool, updated.subject_id, updated.schedule_id, updated.instructor_id)
        .await?;

    if let Some(other) = sections::find_by_code(pool, &updated.code).await? {
        if other.id != id {
            return Err(ServiceError::Conflict(SECTION_CODE_TAKEN.into()));
        }
    }

    if let (Some(instructor_id), Some(schedule_id)) = (updated.instructor_id, updated.schedule_id) {
        check_instructor_slot_free(pool, instructor_id, schedule_id, Some(id)).await?;
    }

    sections::update(pool, &updated)
        .await
        .map_err(|e| conflict_on_constraint(e, SECTION_CONFLICTS, SECTION_CODE_TAKEN))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> ServiceResult<()> {
    get_by_id(pool, id).await?;

    let active = enrollments::count_by_section(pool, id).await?;
    if active > 0 {
        return Err(ServiceError::Conflict(
            "Cannot delete a section with active enrollments".into(),
        ));
    }

    sections::delete(pool, id).await?;
    Ok(())
}

async fn validate_references(
    pool: &PgPool,
    subject_id: Option<Uuid>,
    schedule_id: Option<Uuid>,
    instructor_id: Option<Uuid>,
) -> ServiceResult<()> {
    if let Some(subject_id) = subject_id {
        subjects::find_by_id(pool, subject_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Subject not found (id: {subject_id})")))?;
    }

    if let Some(schedule_id) = schedule_id {
        schedules::find_by_id(pool, schedule_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Schedule not found (id: {schedule_id})"))
            })?;
    }

    if let Some(instructor_id) = instructor_id {
        let instructor = users::find_by_id(pool, instructor_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Instructor not found (id: {instructor_id})"))
            })?;
        if !instructor.has_role(Role::Professor) {
            return Err(ServiceError::Forbidden(
                "User is not a professor".into(),
            ));
        }
    }

    Ok(())
}

/// Scan the instructor's sections for another one occupying the same slot
async fn check_instructor_slot_free(
    pool: &PgPool,
    instructor_id: Uuid,
    schedule_id: Uuid,
    exclude_section: Option<Uuid>,
) -> ServiceResult<()> {
    let owned = sections::list_by_instructor(pool, instructor_id).await?;
    let clash = owned.iter().any(|s| {
        s.schedule_id == Some(schedule_id) && exclude_section != Some(s.id)
    });

    if clash {
        return Err(ServiceError::Conflict(
            "Schedule clash: instructor already has a section in this slot".into(),
        ));
    }
    Ok(())
}
