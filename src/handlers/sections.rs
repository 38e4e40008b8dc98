use axum::{extract::Path, Extension, Json};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Role, Section};
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::section_service::{self, CreateSection, UpdateSection};

/// GET /api/sections (any authenticated user)
pub async fn list(Extension(_auth_user): Extension<AuthUser>) -> ApiResult<Vec<Section>> {
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(section_service::list_all(&pool).await?))
}

/// GET /api/sections/:id
pub async fn get(
    Extension(_auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Section> {
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(section_service::get_by_id(&pool, id).await?))
}

/// POST /api/sections (ADMIN)
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateSection>,
) -> ApiResult<Section> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::created(section_service::create(&pool, payload).await?))
}

/// PUT /api/sections/:id (ADMIN, or the PROFESSOR who owns the section)
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSection>,
) -> ApiResult<Section> {
    let pool = DatabaseManager::pool().await?;

    if !auth_user.has_role(Role::Admin) {
        // Professors may only touch their own sections
        auth_user.require(Role::Professor)?;
        let existing = section_service::get_by_id(&pool, id).await?;
        if existing.instructor_id != Some(auth_user.id) {
            return Err(crate::error::ApiError::forbidden(
                "Only the section's instructor or an admin may update it",
            ));
        }
    }

    Ok(ApiResponse::success(section_service::update(&pool, id, payload).await?))
}

/// DELETE /api/sections/:id (ADMIN) - 409 while enrollments reference it
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    section_service::delete(&pool, id).await?;
    Ok(ApiResponse::<()>::no_content())
}
