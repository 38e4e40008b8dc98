use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Course section ("turma"): capacity-bounded offering of a subject,
/// optionally bound to an instructor and a weekly schedule slot.
///
/// `available_seats` is the remaining-seat counter. It is owned jointly
/// with the enrollments table: the enrollment engine is the only writer
/// once enrollments exist, and it never lets the counter go negative.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Section {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub available_seats: i32,
    pub subject_id: Option<Uuid>,
    pub instructor_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Section {
    pub fn has_seats(&self) -> bool {
        self.available_seats > 0
    }
}
