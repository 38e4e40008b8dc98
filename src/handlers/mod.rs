pub mod auth;
pub mod enrollments;
pub mod schedules;
pub mod sections;
pub mod subjects;
pub mod users;
