use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::services::auth_service;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /auth/login - authenticate and receive an access + refresh token pair
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;
    let (tokens, user) = auth_service::login(&pool, &payload.email, &payload.password).await?;

    Ok(ApiResponse::success(json!({
        "access_token": tokens.access_token,
        "refresh_token": tokens.refresh_token,
        "expires_in": tokens.expires_in,
        "user": {
            "id": user.id,
            "email": user.email,
            "name": user.name,
            "roles": user.roles(),
        }
    })))
}

/// POST /auth/refresh - rotate a refresh token and receive a new pair
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> ApiResult<Value> {
    if payload.refresh_token.is_empty() {
        return Err(ApiError::bad_request("refresh_token is required"));
    }

    let pool = DatabaseManager::pool().await?;
    let tokens = auth_service::refresh(&pool, &payload.refresh_token).await?;

    Ok(ApiResponse::success(json!({
        "access_token": tokens.access_token,
        "refresh_token": tokens.refresh_token,
        "expires_in": tokens.expires_in,
    })))
}

/// GET /api/auth/whoami - echo of the authenticated claims
pub async fn whoami(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "id": auth_user.id,
        "email": auth_user.email,
        "roles": auth_user.roles,
        "token_version": auth_user.token_version,
    })))
}
