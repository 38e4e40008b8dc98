use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::config;
use crate::database::models::{Role, Section, User};
use crate::database::repositories::{refresh_tokens, sections, users};

use super::{conflict_on_unique, ServiceError, ServiceResult};

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub ra: Option<String>,
    pub siape: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub password: Option<String>,
    pub ra: Option<String>,
    pub siape: Option<String>,
}

/// Professor with their sections, for the public listing
#[derive(Debug, Serialize)]
pub struct ProfessorWithSections {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub siape: Option<String>,
    pub sections: Vec<Section>,
}

pub async fn create(pool: &PgPool, payload: CreateUser) -> ServiceResult<User> {
    let password_hash = hash_password(&payload.password)?;

    let id = users::insert(
        pool,
        &payload.email,
        &payload.name,
        &password_hash,
        payload.ra.as_deref(),
        payload.siape.as_deref(),
    )
    .await
    .map_err(|e| conflict_on_unique(e, "Email already registered"))?;

    for role in payload.roles {
        users::add_role(pool, id, role).await?;
    }

    let user = users::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::Internal("User vanished after insert".into()))?;
    info!(user = %user.id, "user created");
    Ok(user)
}

pub async fn list_all(pool: &PgPool) -> ServiceResult<Vec<User>> {
    Ok(users::list_all(pool).await?)
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> ServiceResult<User> {
    users::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User not found (id: {id})")))
}

pub async fn update(pool: &PgPool, id: Uuid, payload: UpdateUser) -> ServiceResult<User> {
    get_by_id(pool, id).await?;

    let password_hash = match payload.password.as_deref() {
        Some(p) if !p.is_empty() => Some(hash_password(p)?),
        _ => None,
    };

    users::update(
        pool,
        id,
        payload.name.as_deref(),
        password_hash.as_deref(),
        payload.ra.as_deref(),
        payload.siape.as_deref(),
    )
    .await?;
    get_by_id(pool, id).await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> ServiceResult<()> {
    let deleted = users::delete(pool, id).await?;
    if deleted == 0 {
        return Err(ServiceError::NotFound(format!("User not found (id: {id})")));
    }
    Ok(())
}

/// Grant a role. Outstanding sessions must not keep their old authority,
/// so the token-invalidation counter is bumped and the user's refresh
/// tokens are purged in the same transaction.
pub async fn assign_role(pool: &PgPool, user_id: Uuid, role: Role) -> ServiceResult<User> {
    get_by_id(pool, user_id).await?;

    let mut tx = pool.begin().await?;
    users::add_role(&mut *tx, user_id, role).await?;
    users::increment_token_version(&mut *tx, user_id).await?;
    refresh_tokens::delete_by_user(&mut *tx, user_id).await?;
    tx.commit().await?;

    info!(user = %user_id, role = %role, "role granted, sessions invalidated");
    get_by_id(pool, user_id).await
}

pub async fn remove_role(pool: &PgPool, user_id: Uuid, role: Role) -> ServiceResult<User> {
    get_by_id(pool, user_id).await?;

    let mut tx = pool.begin().await?;
    let removed = users::remove_role(&mut *tx, user_id, role).await?;
    if removed > 0 {
        users::increment_token_version(&mut *tx, user_id).await?;
        refresh_tokens::delete_by_user(&mut *tx, user_id).await?;
    }
    tx.commit().await?;

    get_by_id(pool, user_id).await
}

pub async fn list_professors(pool: &PgPool) -> ServiceResult<Vec<User>> {
    Ok(users::list_by_role(pool, Role::Professor).await?)
}

pub async fn list_professors_with_sections(
    pool: &PgPool,
) -> ServiceResult<Vec<ProfessorWithSections>> {
    let professors = users::list_by_role(pool, Role::Professor).await?;

    let mut result = Vec::with_capacity(professors.len());
    for professor in professors {
        let owned = sections::list_by_instructor(pool, professor.id).await?;
        result.push(ProfessorWithSections {
            id: professor.id,
            name: professor.name,
            email: professor.email,
            siape: professor.siape,
            sections: owned,
        });
    }
    Ok(result)
}

/// First-run bootstrap: when ADMIN_EMAIL and ADMIN_PASSWORD are set and
/// no such user exists yet, create it with the ADMIN role.
pub async fn ensure_bootstrap_admin(pool: &PgPool) -> ServiceResult<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("ADMIN_EMAIL"),
        std::env::var("ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    if users::find_by_email(pool, &email).await?.is_some() {
        return Ok(());
    }

    let admin = create(
        pool,
        CreateUser {
            email,
            name: "Administrator".into(),
            password,
            ra: None,
            siape: None,
            roles: vec![Role::Admin],
        },
    )
    .await?;
    info!(user = %admin.id, "bootstrap admin created");
    Ok(())
}

fn hash_password(password: &str) -> ServiceResult<String> {
    bcrypt::hash(password, config::config().security.bcrypt_cost)
        .map_err(|e| ServiceError::Internal(format!("bcrypt hash failed: {e}")))
}
