use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Enrollment ("matrícula"): links one student to one section.
/// (student_id, section_id) is unique for as long as the row exists;
/// withdraw deletes the row and restores the section's seat.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub section_id: Uuid,
    pub created_at: DateTime<Utc>,
}
