use axum::{extract::Path, Extension, Json};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Role, Schedule};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::schedule_service::{self, CreateSchedule, UpdateSchedule};

/// GET /api/schedules (any authenticated user)
pub async fn list(Extension(_auth_user): Extension<AuthUser>) -> ApiResult<Vec<Schedule>> {
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(schedule_service::list_all(&pool).await?))
}

/// GET /api/schedules/:id
pub async fn get(
    Extension(_auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Schedule> {
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(schedule_service::get_by_id(&pool, id).await?))
}

/// POST /api/schedules (ADMIN)
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateSchedule>,
) -> ApiResult<Schedule> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::created(schedule_service::create(&pool, payload).await?))
}

/// PUT /api/schedules/:id (ADMIN)
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSchedule>,
) -> ApiResult<Schedule> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(schedule_service::update(&pool, id, payload).await?))
}

/// DELETE /api/schedules/:id (ADMIN) - 409 while sections reference it
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    schedule_service::delete(&pool, id).await?;
    Ok(ApiResponse::<()>::no_content())
}
