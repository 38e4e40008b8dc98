pub mod auth_service;
pub mod enrollment_service;
pub mod schedule_service;
pub mod section_service;
pub mod subject_service;
pub mod user_service;

use thiserror::Error;

/// Shared service-layer error taxonomy. Every invariant violation is a
/// `Conflict`; existence failures are `NotFound`; role precondition
/// failures are `Forbidden`. Store failures propagate as `Database` and
/// are masked from clients by the ApiError conversion.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Postgres unique_violation; the storage-level backstop behind the
/// application-level uniqueness checks.
const UNIQUE_VIOLATION: &str = "23505";

/// Map a unique-constraint violation to a Conflict with a friendly
/// message; pass every other error through.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> ServiceError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return ServiceError::Conflict(message.to_string());
        }
    }
    ServiceError::Database(err)
}

/// Like `conflict_on_unique`, but picks the message from the violated
/// constraint's name, for tables carrying more than one unique constraint.
pub(crate) fn conflict_on_constraint(
    err: sqlx::Error,
    messages: &[(&str, &str)],
    fallback: &str,
) -> ServiceError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let message = db_err
                .constraint()
                .and_then(|name| {
                    messages
                        .iter()
                        .find(|(constraint, _)| *constraint == name)
                        .map(|(_, message)| *message)
                })
                .unwrap_or(fallback);
            return ServiceError::Conflict(message.to_string());
        }
    }
    ServiceError::Database(err)
}
