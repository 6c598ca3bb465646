use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use common::Status;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{category, media, non_conformity, non_conformity_media, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::category::CategorySummary;
use crate::models::non_conformity::{
    CreateNonConformityRequest, NonConformityResponse, UpdateNonConformityRequest,
    validate_create_non_conformity, validate_update_non_conformity,
};
use crate::models::shared::parse_id;
use crate::models::user::UserSummary;
use crate::state::AppState;
use crate::utils::access::{find_accessible_non_conformity, find_accessible_sprint};

/// Resolve categories, users and attached media for a batch of
/// non-conformities, preserving the input order.
pub(crate) async fn load_responses<C: ConnectionTrait>(
    db: &C,
    models: Vec<non_conformity::Model>,
) -> Result<Vec<NonConformityResponse>, AppError> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let nc_ids: Vec<Uuid> = models.iter().map(|nc| nc.id).collect();
    let mut user_ids: Vec<Uuid> = models
        .iter()
        .flat_map(|nc| [nc.created_by_id, nc.assigned_to_id])
        .collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let mut category_ids: Vec<Uuid> = models.iter().map(|nc| nc.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();

    let users: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let categories: HashMap<Uuid, category::Model> = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut media_by_nc: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for link in non_conformity_media::Entity::find()
        .filter(non_conformity_media::Column::NonConformityId.is_in(nc_ids))
        .order_by_asc(non_conformity_media::Column::AttachedAt)
        .all(db)
        .await?
    {
        media_by_nc
            .entry(link.non_conformity_id)
            .or_default()
            .push(link.media_id);
    }

    let lookup_user = |id: Uuid| {
        users
            .get(&id)
            .cloned()
            .map(UserSummary::from)
            .ok_or_else(|| AppError::Internal(format!("user {id} missing for non-conformity")))
    };

    models
        .into_iter()
        .map(|nc| {
            let category = categories
                .get(&nc.category_id)
                .cloned()
                .map(CategorySummary::from)
                .ok_or_else(|| {
                    AppError::Internal(format!("category {} missing", nc.category_id))
                })?;
            Ok(NonConformityResponse {
                id: nc.id,
                sprint_id: nc.sprint_id,
                title: nc.title,
                description: nc.description,
                expected: nc.expected,
                status: nc.status,
                priority: nc.priority,
                category,
                created_by: lookup_user(nc.created_by_id)?,
                assigned_to: lookup_user(nc.assigned_to_id)?,
                media_ids: media_by_nc.remove(&nc.id).unwrap_or_default(),
                created_at: nc.created_at,
                updated_at: nc.updated_at,
            })
        })
        .collect()
}

async fn load_response<C: ConnectionTrait>(
    db: &C,
    model: non_conformity::Model,
) -> Result<NonConformityResponse, AppError> {
    load_responses(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("non-conformity vanished while loading".into()))
}

async fn require_category<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), AppError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Validation(format!("Unknown category {id}")))
}

async fn require_user<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Validation(format!("Unknown assignee {id}")))
}

#[utoipa::path(
    post,
    path = "/api/v1/sprints/{id}/non-conformities",
    tag = "Non-conformities",
    operation_id = "createNonConformity",
    summary = "Report a non-conformity",
    description = "Creates a non-conformity in the sprint with status `NEW`. The caller becomes its creator.",
    params(("id" = Uuid, Path, description = "Sprint ID")),
    request_body = CreateNonConformityRequest,
    responses(
        (status = 201, description = "Non-conformity created", body = NonConformityResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Sprint not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(sprint_id = %sprint_id))]
pub async fn create_non_conformity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(sprint_id): Path<String>,
    AppJson(payload): AppJson<CreateNonConformityRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_non_conformity(&payload)?;
    let sprint_id = parse_id(&sprint_id, "Sprint")?;
    let sprint = find_accessible_sprint(&state.db, &auth_user, sprint_id).await?;
    require_category(&state.db, payload.category_id).await?;
    require_user(&state.db, payload.assigned_to_id).await?;

    let now = Utc::now();
    let model = non_conformity::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        expected: Set(payload.expected.trim().to_string()),
        status: Set(Status::New),
        priority: Set(payload.priority),
        sprint_id: Set(sprint.id),
        category_id: Set(payload.category_id),
        created_by_id: Set(auth_user.user_id),
        assigned_to_id: Set(payload.assigned_to_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(load_response(&state.db, model).await?),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/non-conformities/{id}",
    tag = "Non-conformities",
    operation_id = "getNonConformity",
    summary = "Get a non-conformity",
    params(("id" = Uuid, Path, description = "Non-conformity ID")),
    responses(
        (status = 200, description = "Non-conformity", body = NonConformityResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Non-conformity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(nc_id = %id))]
pub async fn get_non_conformity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NonConformityResponse>, AppError> {
    let id = parse_id(&id, "Non-conformity")?;
    let nc = find_accessible_non_conformity(&state.db, &auth_user, id).await?;
    Ok(Json(load_response(&state.db, nc).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/non-conformities/{id}",
    tag = "Non-conformities",
    operation_id = "updateNonConformity",
    summary = "Update a non-conformity",
    params(("id" = Uuid, Path, description = "Non-conformity ID")),
    request_body = UpdateNonConformityRequest,
    responses(
        (status = 200, description = "Non-conformity updated", body = NonConformityResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Non-conformity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(nc_id = %id))]
pub async fn update_non_conformity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateNonConformityRequest>,
) -> Result<Json<NonConformityResponse>, AppError> {
    validate_update_non_conformity(&payload)?;
    let id = parse_id(&id, "Non-conformity")?;
    let existing = find_accessible_non_conformity(&state.db, &auth_user, id).await?;

    if let Some(category_id) = payload.category_id {
        require_category(&state.db, category_id).await?;
    }
    if let Some(assigned_to_id) = payload.assigned_to_id {
        require_user(&state.db, assigned_to_id).await?;
    }

    let mut active: non_conformity::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(expected) = payload.expected {
        active.expected = Set(expected.trim().to_string());
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(priority) = payload.priority {
        active.priority = Set(priority);
    }
    if let Some(assigned_to_id) = payload.assigned_to_id {
        active.assigned_to_id = Set(assigned_to_id);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(load_response(&state.db, model).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/non-conformities/{id}",
    tag = "Non-conformities",
    operation_id = "deleteNonConformity",
    summary = "Delete a non-conformity",
    description = "Deletes the non-conformity and its attachment links. Attached media records \
        and their blobs are kept, unattached.",
    params(("id" = Uuid, Path, description = "Non-conformity ID")),
    responses(
        (status = 204, description = "Non-conformity deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Non-conformity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(nc_id = %id))]
pub async fn delete_non_conformity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "Non-conformity")?;
    let nc = find_accessible_non_conformity(&state.db, &auth_user, id).await?;

    let txn = state.db.begin().await?;
    non_conformity_media::Entity::delete_many()
        .filter(non_conformity_media::Column::NonConformityId.eq(nc.id))
        .exec(&txn)
        .await?;
    non_conformity::Entity::delete_by_id(nc.id)
        .exec(&txn)
        .await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

const ATTACHED_ELSEWHERE: &str = "Media is attached to another non-conformity";

/// 204 when the existing link already points at `nc_id`, 409 otherwise.
fn owned_by(link: &non_conformity_media::Model, nc_id: Uuid) -> Result<StatusCode, AppError> {
    if link.non_conformity_id == nc_id {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Conflict(ATTACHED_ELSEWHERE.into()))
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/non-conformities/{id}/media/{media_id}",
    tag = "Non-conformities",
    operation_id = "attachMedia",
    summary = "Attach uploaded media",
    description = "Links an uploaded media record to the non-conformity. Repeating the call is a \
        no-op; media owned by another non-conformity is rejected.",
    params(
        ("id" = Uuid, Path, description = "Non-conformity ID"),
        ("media_id" = Uuid, Path, description = "Media ID"),
    ),
    responses(
        (status = 204, description = "Media attached"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Non-conformity or media not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Media attached elsewhere (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(nc_id = %id, media_id = %media_id))]
pub async fn attach_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, media_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "Non-conformity")?;
    let media_id = parse_id(&media_id, "Media")?;
    let nc = find_accessible_non_conformity(&state.db, &auth_user, id).await?;

    media::Entity::find_by_id(media_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Media not found".into()))?;

    if let Some(link) = non_conformity_media::Entity::find_by_id(media_id)
        .one(&state.db)
        .await?
    {
        return owned_by(&link, nc.id);
    }

    let inserted = non_conformity_media::ActiveModel {
        media_id: Set(media_id),
        non_conformity_id: Set(nc.id),
        attached_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await;

    match inserted {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        // A concurrent attach won the insert; it may have been for this same owner.
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            match non_conformity_media::Entity::find_by_id(media_id)
                .one(&state.db)
                .await?
            {
                Some(link) => owned_by(&link, nc.id),
                None => Err(AppError::Conflict(ATTACHED_ELSEWHERE.into())),
            }
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/non-conformities/{id}/media/{media_id}",
    tag = "Non-conformities",
    operation_id = "detachMedia",
    summary = "Detach media",
    description = "Removes the link only. The media record and its blob stay in place.",
    params(
        ("id" = Uuid, Path, description = "Non-conformity ID"),
        ("media_id" = Uuid, Path, description = "Media ID"),
    ),
    responses(
        (status = 204, description = "Media detached"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Media not attached here (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(nc_id = %id, media_id = %media_id))]
pub async fn detach_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, media_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "Non-conformity")?;
    let media_id = parse_id(&media_id, "Media")?;
    let nc = find_accessible_non_conformity(&state.db, &auth_user, id).await?;

    let result = non_conformity_media::Entity::delete_many()
        .filter(non_conformity_media::Column::MediaId.eq(media_id))
        .filter(non_conformity_media::Column::NonConformityId.eq(nc.id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(
            "Media is not attached to this non-conformity".into(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}
