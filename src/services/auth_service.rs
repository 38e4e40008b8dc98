use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::auth::{self, Claims};
use crate::config;
use crate::database::models::User;
use crate::database::repositories::{refresh_tokens, users};

use super::{ServiceError, ServiceResult};

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Authenticate by email + password, issue an access token and a fresh
/// refresh token. Unknown email and wrong password are indistinguishable
/// to the caller.
pub async fn login(pool: &PgPool, email: &str, password: &str) -> ServiceResult<(TokenPair, User)> {
    let Some(user) = users::find_by_email(pool, email).await? else {
        return Err(ServiceError::Unauthorized("Invalid credentials".into()));
    };

    let password_ok = bcrypt::verify(password, &user.password_hash)
        .map_err(|e| ServiceError::Internal(format!("bcrypt verify failed: {e}")))?;
    if !password_ok {
        warn!(email, "login rejected: bad password");
        return Err(ServiceError::Unauthorized("Invalid credentials".into()));
    }

    let pair = issue_tokens(pool, &user, None).await?;
    debug!(user = %user.id, "login succeeded");
    Ok((pair, user))
}

/// Rotate a refresh token: validate the stored hash, then replace it in
/// place so the presented token can never be used twice. The new access
/// token is built from the user's current roles and token_version, so a
/// role change between refreshes is picked up here.
pub async fn refresh(pool: &PgPool, presented_token: &str) -> ServiceResult<TokenPair> {
    let hash = auth::hash_refresh_token(presented_token);

    let Some(record) = refresh_tokens::find_by_hash(pool, &hash).await? else {
        return Err(ServiceError::Forbidden("Invalid refresh token".into()));
    };

    if !record.is_usable(Utc::now()) {
        return Err(ServiceError::Forbidden("Refresh token expired or revoked".into()));
    }

    let user = users::find_by_id(pool, record.user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Refresh token user no longer exists".into()))?;

    // A role change bumps the user's counter; tokens issued before it
    // are stale even if the purge missed them
    if record.token_version != user.token_version {
        return Err(ServiceError::Forbidden("Refresh token expired or revoked".into()));
    }

    issue_tokens(pool, &user, Some(record.id)).await
}

/// Issue an access token plus a refresh token; `rotate_id` replaces an
/// existing stored token instead of inserting a new row.
async fn issue_tokens(
    pool: &PgPool,
    user: &User,
    rotate_id: Option<uuid::Uuid>,
) -> ServiceResult<TokenPair> {
    let security = &config::config().security;

    let claims = Claims::for_user(user);
    let access_token = auth::generate_access_token(&claims)
        .map_err(|e| ServiceError::Internal(format!("token generation failed: {e}")))?;

    let refresh_token = auth::generate_refresh_token();
    let refresh_hash = auth::hash_refresh_token(&refresh_token);
    let expires_at = Utc::now() + Duration::days(security.refresh_token_ttl_days);

    match rotate_id {
        Some(id) => {
            refresh_tokens::rotate(pool, id, &refresh_hash, user.token_version, expires_at).await?;
        }
        None => {
            refresh_tokens::insert(pool, user.id, &refresh_hash, user.token_version, expires_at)
                .await?;
        }
    }

    Ok(TokenPair {
        access_token,
        refresh_token,
        expires_in: security.access_token_ttl_minutes * 60,
    })
}
