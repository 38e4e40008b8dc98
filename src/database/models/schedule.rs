use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fixed weekly time slot: weekday 1..=7, shift 1=morning 2=afternoon 3=evening
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub weekday: i32,
    pub shift: i32,
    pub code: String,
    pub description: Option<String>,
}
