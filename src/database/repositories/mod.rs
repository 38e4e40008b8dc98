pub mod enrollments;
pub mod refresh_tokens;
pub mod schedules;
pub mod sections;
pub mod subjects;
pub mod users;
