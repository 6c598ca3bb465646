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

use crate::entity::{category, non_conformity};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::category::{CategoryRequest, CategoryResponse};
use crate::models::shared::{parse_id, validate_name};
use crate::state::AppState;

fn name_taken(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A category with this name already exists".into())
        }
        _ => AppError::from(err),
    }
}

async fn find_category<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<category::Model, AppError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}

async fn count_usage<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, AppError> {
    Ok(non_conformity::Entity::find()
        .filter(non_conformity::Column::CategoryId.eq(id))
        .count(db)
        .await?)
}

fn to_response(model: category::Model, non_conformity_count: u64) -> CategoryResponse {
    CategoryResponse {
        id: model.id,
        name: model.name,
        non_conformity_count,
        created_at: model.created_at,
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List categories",
    description = "All categories ordered by name, each with the number of non-conformities filed under it.",
    responses(
        (status = 200, description = "Categories", body = Vec<CategoryResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_categories(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;

    let used: Vec<Uuid> = non_conformity::Entity::find()
        .select_only()
        .column(non_conformity::Column::CategoryId)
        .into_tuple()
        .all(&state.db)
        .await?;
    let mut counts: HashMap<Uuid, u64> = HashMap::new();
    for id in used {
        *counts.entry(id).or_default() += 1;
    }

    Ok(Json(
        categories
            .into_iter()
            .map(|c| {
                let count = counts.get(&c.id).copied().unwrap_or(0);
                to_response(c, count)
            })
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name already used (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    let name = validate_name(&payload.name, "Name", 128)?;

    let model = category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await
    .map_err(name_taken)?;

    Ok((StatusCode::CREATED, Json(to_response(model, 0))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    operation_id = "renameCategory",
    summary = "Rename a category",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category renamed", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already used (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(category_id = %id))]
pub async fn update_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    auth_user.require_admin()?;
    let name = validate_name(&payload.name, "Name", 128)?;
    let id = parse_id(&id, "Category")?;

    let mut active: category::ActiveModel = find_category(&state.db, id).await?.into();
    active.name = Set(name.to_string());
    let model = active.update(&state.db).await.map_err(name_taken)?;

    let count = count_usage(&state.db, model.id).await?;
    Ok(Json(to_response(model, count)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Category in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(category_id = %id))]
pub async fn delete_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;
    let id = parse_id(&id, "Category")?;

    find_category(&state.db, id).await?;
    let in_use = count_usage(&state.db, id).await?;
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Category is used by {in_use} non-conformities"
        )));
    }

    category::Entity::delete_by_id(id).exec(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}
