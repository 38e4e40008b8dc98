pub mod enrollment;
pub mod refresh_token;
pub mod role;
pub mod schedule;
pub mod section;
pub mod subject;
pub mod user;

pub use enrollment::Enrollment;
pub use refresh_token::RefreshToken;
pub use role::Role;
pub use schedule::Schedule;
pub use section::Section;
pub use subject::Subject;
pub use user::User;
