use axum::{
    extract::Path,
    Extension, Json,
};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Role, User};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::user_service::{self, CreateUser, ProfessorWithSections, UpdateUser};

/// POST /api/users (ADMIN)
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateUser>,
) -> ApiResult<User> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    let user = user_service::create(&pool, payload).await?;
    Ok(ApiResponse::created(user))
}

/// GET /api/users (ADMIN)
pub async fn list(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Vec<User>> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(user_service::list_all(&pool).await?))
}

/// GET /api/users/:id (ADMIN)
pub async fn get(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<User> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(user_service::get_by_id(&pool, id).await?))
}

/// PUT /api/users/:id (ADMIN)
pub async fn update(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUser>,
) -> ApiResult<User> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(user_service::update(&pool, id, payload).await?))
}

/// DELETE /api/users/:id (ADMIN)
pub async fn delete(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    user_service::delete(&pool, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// POST /api/users/:id/roles {"role": "PROFESSOR"} (ADMIN)
pub async fn assign_role(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<User> {
    auth_user.require(Role::Admin)?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(
        user_service::assign_role(&pool, id, payload.role).await?,
    ))
}

#[derive(Debug, serde::Deserialize)]
pub struct AssignRoleRequest {
    pub role: Role,
}

/// DELETE /api/users/:id/roles/:role (ADMIN)
pub async fn remove_role(
    Extension(auth_user): Extension<AuthUser>,
    Path((id, role)): Path<(Uuid, String)>,
) -> ApiResult<User> {
    auth_user.require(Role::Admin)?;
    let role: Role = role
        .parse()
        .map_err(|e: crate::database::models::role::UnknownRole| ApiError::bad_request(e.to_string()))?;
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(
        user_service::remove_role(&pool, id, role).await?,
    ))
}

/// GET /professors - public listing of professors with their sections
pub async fn list_professors() -> ApiResult<Vec<ProfessorWithSections>> {
    let pool = DatabaseManager::pool().await?;
    Ok(ApiResponse::success(
        user_service::list_professors_with_sections(&pool).await?,
    ))
}
