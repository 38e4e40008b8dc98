use axum::{extract::Path, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Enrollment, Role};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::{enrollment_service, ServiceError};

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub section_id: Uuid,
}

/// POST /api/enrollments (ALUNO) - enroll the authenticated student
pub async fn enroll(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<EnrollRequest>,
) -> ApiResult<Enrollment> {
    auth_user.require(Role::Aluno)?;
    let pool = DatabaseManager::pool().await?;
    let enrollment = enrollment_service::enroll(&pool, auth_user.id, payload.section_id).await?;
    Ok(ApiResponse::created(enrollment))
}

/// GET /api/enrollments/me (ALUNO) - the student's own enrollments
pub async fn list_mine(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Vec<Enrollment>> {
    auth_user.require(Role::Aluno)?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(
        enrollment_service::list_by_student(&pool, auth_user.id).await?,
    ))
}

/// GET /api/enrollments (ADMIN)
pub async fn list(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Vec<Enrollment>> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(enrollment_service::list_all(&pool).await?))
}

/// GET /api/enrollments/:id (ADMIN or the enrolled student)
pub async fn get(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Enrollment> {
    let pool = DatabaseManager::pool().await?;
    let enrollment = enrollment_service::get_by_id(&pool, id).await?;

    if !auth_user.has_role(Role::Admin) && enrollment.student_id != auth_user.id {
        return Err(ApiError::forbidden("Not your enrollment"));
    }

    Ok(ApiResponse::success(enrollment))
}

/// DELETE /api/enrollments/:id (ADMIN or the enrolled student) - withdraw.
/// Unknown ids are a no-op reported as 0 rows affected, not an error.
pub async fn withdraw(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Value> {
    auth_user.require_any(&[Role::Admin, Role::Aluno])?;
    let pool = DatabaseManager::pool().await?;

    if !auth_user.has_role(Role::Admin) {
        // Students may only withdraw themselves; an absent row falls
        // through to the no-op path below
        match enrollment_service::get_by_id(&pool, id).await {
            Ok(enrollment) if enrollment.student_id != auth_user.id => {
                return Err(ApiError::forbidden("Not your enrollment"));
            }
            Ok(_) | Err(ServiceError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let rows_affected = enrollment_service::withdraw(&pool, id).await?;
    Ok(ApiResponse::success(json!({ "rows_affected": rows_affected })))
}
