use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::sprint;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{parse_id, validate_name};
use crate::models::sprint::{
    CreateSprintRequest, SprintResponse, UpdateSprintRequest, validate_create_sprint,
    validate_window,
};
use crate::state::AppState;
use crate::utils::access::{find_accessible_project, find_accessible_sprint};

#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/sprints",
    tag = "Sprints",
    operation_id = "createSprint",
    summary = "Create a sprint",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = CreateSprintRequest,
    responses(
        (status = 201, description = "Sprint created", body = SprintResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(project_id = %project_id))]
pub async fn create_sprint(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    AppJson(payload): AppJson<CreateSprintRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_sprint(&payload)?;
    let project_id = parse_id(&project_id, "Project")?;
    let project = find_accessible_project(&state.db, &auth_user, project_id).await?;

    let model = sprint::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        start_at: Set(payload.start_at),
        end_at: Set(payload.end_at),
        project_id: Set(project.id),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(SprintResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/sprints/{id}",
    tag = "Sprints",
    operation_id = "updateSprint",
    summary = "Update a sprint",
    params(("id" = Uuid, Path, description = "Sprint ID")),
    request_body = UpdateSprintRequest,
    responses(
        (status = 200, description = "Sprint updated", body = SprintResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Sprint not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(sprint_id = %id))]
pub async fn update_sprint(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateSprintRequest>,
) -> Result<Json<SprintResponse>, AppError> {
    let id = parse_id(&id, "Sprint")?;
    let existing = find_accessible_sprint(&state.db, &auth_user, id).await?;

    // The window is checked as it will be after the update.
    validate_window(
        payload.start_at.unwrap_or(existing.start_at),
        payload.end_at.unwrap_or(existing.end_at),
    )?;

    let mut active: sprint::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(validate_name(&name, "Name", 128)?.to_string());
    }
    if let Some(start_at) = payload.start_at {
        active.start_at = Set(start_at);
    }
    if let Some(end_at) = payload.end_at {
        active.end_at = Set(end_at);
    }

    let model = active.update(&state.db).await?;
    Ok(Json(SprintResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sprints/{id}",
    tag = "Sprints",
    operation_id = "deleteSprint",
    summary = "Delete a sprint",
    description = "Fails with 409 while the sprint still holds non-conformities.",
    params(("id" = Uuid, Path, description = "Sprint ID")),
    responses(
        (status = 204, description = "Sprint deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Sprint not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Sprint not empty (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(sprint_id = %id))]
pub async fn delete_sprint(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "Sprint")?;
    let sprint = find_accessible_sprint(&state.db, &auth_user, id).await?;

    sprint::Entity::delete_by_id(sprint.id)
        .exec(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
