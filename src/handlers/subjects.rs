use axum::{extract::Path, Extension, Json};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Role, Subject};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::subject_service::{self, CreateSubject, UpdateSubject};

/// GET /api/subjects (any authenticated user)
pub async fn list(Extension(_auth_user): Extension<AuthUser>) -> ApiResult<Vec<Subject>> {
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(subject_service::list_all(&pool).await?))
}

/// GET /api/subjects/:id
pub async fn get(
    Extension(_auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Subject> {
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(subject_service::get_by_id(&pool, id).await?))
}

/// POST /api/subjects (ADMIN)
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateSubject>,
) -> ApiResult<Subject> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::created(subject_service::create(&pool, payload).await?))
}

/// PUT /api/subjects/:id (ADMIN)
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubject>,
) -> ApiResult<Subject> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(subject_service::update(&pool, id, payload).await?))
}

/// DELETE /api/subjects/:id (ADMIN) - 409 while sections reference it
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    subject_service::delete(&pool, id).await?;
    Ok(ApiResponse::<()>::no_content())
}
