//! The enrollment engine: the one place where seat counts and enrollment
//! rows are mutated together. All coordination is delegated to the store's
//! transaction and row-locking primitives, so the protocol holds across
//! processes, not just threads.

use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::models::{Enrollment, Role};
use crate::database::repositories::{enrollments, sections, users};

use super::{conflict_on_unique, ServiceError, ServiceResult};

/// Enroll a student into a section.
///
/// Existence and role preconditions are cheap and non-racing, so they run
/// outside the atomic unit. Everything that touches the seat counter runs
/// inside one transaction holding an exclusive lock on the section row:
/// two concurrent enrolls against the same section serialize on that lock,
/// and the loser re-reads a seat count that already reflects the winner.
pub async fn enroll(pool: &PgPool, student_id: Uuid, section_id: Uuid) -> ServiceResult<Enrollment> {
    let student = users::find_by_id(pool, student_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Student not found (id: {student_id})")))?;

    if !student.has_role(Role::Aluno) {
        return Err(ServiceError::Forbidden("User is not a student".into()));
    }

    let mut tx = pool.begin().await?;

    // Duplicate check inside the transaction so it cannot race the insert
    if enrollments::exists(&mut *tx, student_id, section_id).await? {
        return Err(ServiceError::Conflict(
            "Student already enrolled in this section".into(),
        ));
    }

    // SELECT ... FOR UPDATE: the serialization point for this section
    let section = sections::find_by_id_for_update(&mut *tx, section_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Section not found (id: {section_id})")))?;

    // A student may not occupy the same weekly slot twice
    if let Some(schedule_id) = section.schedule_id {
        if enrollments::schedule_clash(&mut *tx, student_id, schedule_id, section_id).await? {
            return Err(ServiceError::Conflict(
                "Schedule clash: student already enrolled in a section in this slot".into(),
            ));
        }
    }

    if !section.has_seats() {
        return Err(ServiceError::Conflict("No seats available".into()));
    }

    // Seat decrement and enrollment insert commit or roll back together
    let updated = sections::decrement_seats(&mut *tx, section_id).await?;
    if updated == 0 {
        // Unreachable while the row lock is held; bail rather than oversell
        return Err(ServiceError::Internal(format!(
            "Seat decrement affected no rows for section {section_id}"
        )));
    }

    let enrollment = enrollments::insert(&mut *tx, student_id, section_id)
        .await
        .map_err(|e| conflict_on_unique(e, "Student already enrolled in this section"))?;

    tx.commit().await?;

    info!(
        student = %student_id,
        section = %section_id,
        seats_left = section.available_seats - 1,
        "enrollment created"
    );
    Ok(enrollment)
}

/// Remove an enrollment, restoring the section's seat.
///
/// Returns the number of rows deleted: 0 when the enrollment does not
/// exist (a no-op, not an error), 1 otherwise. The section row is locked
/// before the delete so the restore serializes with concurrent enrolls.
/// The delete runs before the restore: two withdraws of the same
/// enrollment can both pass the initial read, but only the one whose
/// delete lands gives the seat back. A missing section skips the restore
/// but still deletes the row; the ON DELETE CASCADE from sections makes
/// that path unreachable through the API.
pub async fn withdraw(pool: &PgPool, enrollment_id: Uuid) -> ServiceResult<u64> {
    let mut tx = pool.begin().await?;

    let Some(enrollment) = enrollments::find_by_id(&mut *tx, enrollment_id).await? else {
        return Ok(0);
    };

    let section = sections::find_by_id_for_update(&mut *tx, enrollment.section_id).await?;

    let deleted = enrollments::delete(&mut *tx, enrollment_id).await?;
    if deleted == 0 {
        // A concurrent withdraw won; nothing to restore
        return Ok(0);
    }

    if section.is_some() {
        sections::increment_seats(&mut *tx, enrollment.section_id).await?;
    } else {
        debug!(
            enrollment = %enrollment_id,
            section = %enrollment.section_id,
            "withdraw: section gone, skipping seat restore"
        );
    }

    tx.commit().await?;

    info!(enrollment = %enrollment_id, "enrollment removed");
    Ok(deleted)
}

pub async fn list_by_student(pool: &PgPool, student_id: Uuid) -> ServiceResult<Vec<Enrollment>> {
    Ok(enrollments::list_by_student(pool, student_id).await?)
}

pub async fn list_all(pool: &PgPool) -> ServiceResult<Vec<Enrollment>> {
    Ok(enrollments::list_all(pool).await?)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> ServiceResult<Enrollment> {
    enrollments::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Enrollment not found (id: {id})")))
}
