use chrono::{DateTime, Utc};
use common::{Priority, Status};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::category::CategorySummary;
use crate::models::shared::{validate_name, validate_text};
use crate::models::user::UserSummary;

#[derive(Serialize, utoipa::ToSchema)]
pub struct NonConformityResponse {
    pub id: Uuid,
    pub sprint_id: Uuid,
    #[schema(example = "El botón Guardar no responde")]
    pub title: String,
    pub description: String,
    pub expected: String,
    pub status: Status,
    pub priority: Priority,
    pub category: CategorySummary,
    pub created_by: UserSummary,
    pub assigned_to: UserSummary,
    /// Attached media, oldest attachment first.
    pub media_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateNonConformityRequest {
    pub title: String,
    pub description: String,
    pub expected: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub priority: Priority,
    pub assigned_to_id: Uuid,
}

/// Partial update. Omitted fields are left unchanged.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateNonConformityRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub expected: Option<String>,
    pub category_id: Option<Uuid>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assigned_to_id: Option<Uuid>,
}

pub fn validate_create_non_conformity(
    payload: &CreateNonConformityRequest,
) -> Result<(), AppError> {
    validate_name(&payload.title, "Title", 256)?;
    validate_text(&payload.description, "Description")?;
    validate_text(&payload.expected, "Expected")?;
    Ok(())
}

pub fn validate_update_non_conformity(
    payload: &UpdateNonConformityRequest,
) -> Result<(), AppError> {
    if let Some(title) = &payload.title {
        validate_name(title, "Title", 256)?;
    }
    if let Some(description) = &payload.description {
        validate_text(description, "Description")?;
    }
    if let Some(expected) = &payload.expected {
        validate_text(expected, "Expected")?;
    }
    Ok(())
}
