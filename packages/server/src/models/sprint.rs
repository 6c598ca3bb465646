use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::non_conformity::NonConformityResponse;
use crate::models::shared::validate_name;

#[derive(Serialize, utoipa::ToSchema)]
pub struct SprintResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    #[schema(example = "Sprint 3")]
    pub name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::sprint::Model> for SprintResponse {
    fn from(sprint: crate::entity::sprint::Model) -> Self {
        Self {
            id: sprint.id,
            project_id: sprint.project_id,
            name: sprint.name,
            start_at: sprint.start_at,
            end_at: sprint.end_at,
            created_at: sprint.created_at,
        }
    }
}

/// Sprint inside a project detail, with its non-conformities (newest first).
#[derive(Serialize, utoipa::ToSchema)]
pub struct SprintDetail {
    #[serde(flatten)]
    pub sprint: SprintResponse,
    pub non_conformities: Vec<NonConformityResponse>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSprintRequest {
    #[schema(example = "Sprint 3")]
    pub name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateSprintRequest {
    pub name: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

pub fn validate_window(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Result<(), AppError> {
    if end_at < start_at {
        return Err(AppError::Validation(
            "end_at must not be before start_at".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_sprint(payload: &CreateSprintRequest) -> Result<(), AppError> {
    validate_name(&payload.name, "Name", 128)?;
    validate_window(payload.start_at, payload.end_at)
}
