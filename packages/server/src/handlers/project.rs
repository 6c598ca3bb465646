use std::collections::HashMap;

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

use crate::entity::{non_conformity, project, project_user, sprint, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::non_conformity::load_responses;
use crate::models::project::{
    CreateProjectRequest, ProjectDetailResponse, ProjectResponse, UpdateProjectRequest,
    dedup_member_ids, normalize_description, validate_create_project, validate_update_project,
};
use crate::models::shared::parse_id;
use crate::models::sprint::{SprintDetail, SprintResponse};
use crate::models::user::UserSummary;
use crate::state::AppState;
use crate::utils::access::{find_accessible_project, find_project};

/// Members of each project, ordered by name.
async fn load_members<C: ConnectionTrait>(
    db: &C,
    project_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<UserSummary>>, AppError> {
    let links = project_user::Entity::find()
        .filter(project_user::Column::ProjectId.is_in(project_ids))
        .all(db)
        .await?;
    if links.is_empty() {
        return Ok(HashMap::new());
    }

    let users: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(links.iter().map(|l| l.user_id).collect::<Vec<_>>()))
        .order_by_asc(user::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut members: HashMap<Uuid, Vec<UserSummary>> = HashMap::new();
    for link in links {
        if let Some(u) = users.get(&link.user_id) {
            members
                .entry(link.project_id)
                .or_default()
                .push(UserSummary::from(u.clone()));
        }
    }
    for list in members.values_mut() {
        list.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(members)
}

/// Replace a project's membership. Every ID must name an existing user.
async fn replace_members<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    member_ids: &[Uuid],
) -> Result<(), AppError> {
    let member_ids = dedup_member_ids(member_ids);
    if !member_ids.is_empty() {
        let known = user::Entity::find()
            .filter(user::Column::Id.is_in(member_ids.clone()))
            .count(db)
            .await?;
        if known != member_ids.len() as u64 {
            return Err(AppError::Validation("Unknown member id".into()));
        }
    }

    project_user::Entity::delete_many()
        .filter(project_user::Column::ProjectId.eq(project_id))
        .exec(db)
        .await?;

    if !member_ids.is_empty() {
        let rows = member_ids.into_iter().map(|user_id| project_user::ActiveModel {
            project_id: Set(project_id),
            user_id: Set(user_id),
        });
        project_user::Entity::insert_many(rows)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

async fn to_response<C: ConnectionTrait>(
    db: &C,
    model: project::Model,
) -> Result<ProjectResponse, AppError> {
    let mut members = load_members(db, vec![model.id]).await?;
    Ok(ProjectResponse {
        members: members.remove(&model.id).unwrap_or_default(),
        id: model.id,
        name: model.name,
        description: model.description,
        created_at: model.created_at,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "Projects",
    operation_id = "listProjects",
    summary = "List projects",
    description = "Admins see every project, other users the projects they belong to. Newest first.",
    responses(
        (status = 200, description = "Projects", body = Vec<ProjectResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_projects(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let mut query = project::Entity::find().order_by_desc(project::Column::CreatedAt);
    if !auth_user.is_admin() {
        let own: Vec<Uuid> = project_user::Entity::find()
            .filter(project_user::Column::UserId.eq(auth_user.user_id))
            .select_only()
            .column(project_user::Column::ProjectId)
            .into_tuple()
            .all(&state.db)
            .await?;
        query = query.filter(project::Column::Id.is_in(own));
    }
    let projects = query.all(&state.db).await?;

    let mut members = load_members(&state.db, projects.iter().map(|p| p.id).collect()).await?;
    Ok(Json(
        projects
            .into_iter()
            .map(|p| ProjectResponse {
                members: members.remove(&p.id).unwrap_or_default(),
                id: p.id,
                name: p.name,
                description: p.description,
                created_at: p.created_at,
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    operation_id = "getProject",
    summary = "Project detail",
    description = "Project with members, sprints (newest start first) and each sprint's \
        non-conformities (newest first) including category, creator, assignee and media IDs.",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project detail", body = ProjectDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(project_id = %id))]
pub async fn get_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectDetailResponse>, AppError> {
    let id = parse_id(&id, "Project")?;
    let project = find_accessible_project(&state.db, &auth_user, id).await?;

    let sprints = sprint::Entity::find()
        .filter(sprint::Column::ProjectId.eq(project.id))
        .order_by_desc(sprint::Column::StartAt)
        .all(&state.db)
        .await?;

    let ncs = non_conformity::Entity::find()
        .filter(non_conformity::Column::SprintId.is_in(sprints.iter().map(|s| s.id).collect::<Vec<_>>()))
        .order_by_desc(non_conformity::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let mut by_sprint: HashMap<Uuid, Vec<_>> = HashMap::new();
    for nc in load_responses(&state.db, ncs).await? {
        by_sprint.entry(nc.sprint_id).or_default().push(nc);
    }

    let mut members = load_members(&state.db, vec![project.id]).await?;
    Ok(Json(ProjectDetailResponse {
        id: project.id,
        name: project.name,
        description: project.description,
        members: members.remove(&project.id).unwrap_or_default(),
        sprints: sprints
            .into_iter()
            .map(|s| SprintDetail {
                non_conformities: by_sprint.remove(&s.id).unwrap_or_default(),
                sprint: SprintResponse::from(s),
            })
            .collect(),
        created_at: project.created_at,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "Projects",
    operation_id = "createProject",
    summary = "Create a project",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation error or unknown member (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_project(&payload)?;

    let txn = state.db.begin().await?;
    let model = project::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(normalize_description(payload.description.as_deref())),
        created_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await?;
    replace_members(&txn, model.id, &payload.member_ids).await?;
    let response = to_response(&txn, model).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    operation_id = "updateProject",
    summary = "Update a project",
    description = "Partial update. `member_ids`, when present, replaces the whole membership.",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Validation error or unknown member (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(project_id = %id))]
pub async fn update_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, AppError> {
    auth_user.require_admin()?;
    validate_update_project(&payload)?;
    let id = parse_id(&id, "Project")?;

    let txn = state.db.begin().await?;
    let existing = find_project(&txn, id).await?;
    let mut active: project::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(normalize_description(description.as_deref()));
    }
    let model = active.update(&txn).await?;
    if let Some(member_ids) = payload.member_ids {
        replace_members(&txn, model.id, &member_ids).await?;
    }
    let response = to_response(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    operation_id = "deleteProject",
    summary = "Delete a project",
    description = "Deletes the project and its membership. Fails with 409 while it still has sprints.",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Project still has sprints (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(project_id = %id))]
pub async fn delete_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;
    let id = parse_id(&id, "Project")?;

    let txn = state.db.begin().await?;
    find_project(&txn, id).await?;
    project_user::Entity::delete_many()
        .filter(project_user::Column::ProjectId.eq(id))
        .exec(&txn)
        .await?;
    project::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
