use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::shared::{double_option, validate_name};
use crate::models::sprint::SprintDetail;
use crate::models::user::UserSummary;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectResponse {
    pub id: Uuid,
    #[schema(example = "Portal de clientes")]
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
}

/// Project with its full sprint and non-conformity tree.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectDetailResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<UserSummary>,
    /// Newest `start_at` first.
    pub sprints: Vec<SprintDetail>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProjectRequest {
    #[schema(example = "Portal de clientes")]
    pub name: String,
    pub description: Option<String>,
    /// Users who may work inside the project.
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

/// Partial update. `member_ids`, when present, replaces the whole membership.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub member_ids: Option<Vec<Uuid>>,
}

/// Drop duplicate member IDs, keeping the first occurrence.
pub fn dedup_member_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Blank descriptions are stored as NULL.
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

pub fn validate_create_project(payload: &CreateProjectRequest) -> Result<(), AppError> {
    validate_name(&payload.name, "Name", 256)?;
    Ok(())
}

pub fn validate_update_project(payload: &UpdateProjectRequest) -> Result<(), AppError> {
    if let Some(name) = &payload.name {
        validate_name(name, "Name", 256)?;
    }
    Ok(())
}
