use chrono::{DateTime, Utc};
use common::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::shared::validate_name;

/// Public view of an account. The password hash never leaves the server.
#[derive(Serialize, utoipa::ToSchema, Clone, Debug)]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "Ana Tester")]
    pub name: String,
    #[schema(example = "ana@example.com")]
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Compact user reference embedded in other resources.
#[derive(Serialize, utoipa::ToSchema, Clone, Debug)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<crate::entity::user::Model> for UserSummary {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "Ana Tester")]
    pub name: String,
    #[schema(example = "ana@example.com")]
    pub email: String,
    /// Password (8-128 characters).
    pub password: String,
    pub role: Role,
}

/// Partial update. Omitted fields are left unchanged.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    let valid = email.len() <= 254
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::Validation("Email address is not valid".into()));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_user(payload: &CreateUserRequest) -> Result<(), AppError> {
    validate_name(&payload.name, "Name", 128)?;
    normalize_email(&payload.email)?;
    validate_password(&payload.password)
}

pub fn validate_update_user(payload: &UpdateUserRequest) -> Result<(), AppError> {
    if let Some(name) = &payload.name {
        validate_name(name, "Name", 128)?;
    }
    if let Some(email) = &payload.email {
        normalize_email(email)?;
    }
    if let Some(password) = &payload.password {
        validate_password(password)?;
    }
    Ok(())
}
