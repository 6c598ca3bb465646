use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use chrono::Utc;
use common::storage::storage_key;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entity::{media, non_conformity_media};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::media::MediaUploadResponse;
use crate::models::shared::parse_id;
use crate::state::AppState;
use crate::utils::access::find_accessible_media;
use crate::utils::filename::validate_upload_filename;

/// Room for multipart boundaries and part headers on top of the payload.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

pub fn media_upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = max_upload_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/api/v1/media",
    tag = "Media",
    operation_id = "uploadMedia",
    summary = "Upload a media file",
    description = "Stores the `file` multipart field in the configured storage backend under \
        the key `{id}-{filename}` and records it. The new media is not attached to any \
        non-conformity.",
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 200, description = "Media stored", body = MediaUploadResponse),
        (status = 400, description = "No file, bad filename or file too large (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn upload_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MediaUploadResponse>, AppError> {
    let max_size = state.config.storage.max_upload_size;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue; // Ignore unknown fields.
        }
        if upload.is_some() {
            return Err(AppError::Validation("Only one file per request".into()));
        }

        let filename = field
            .file_name()
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
        let filename = validate_upload_filename(filename)?.to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            if (data.len() + chunk.len()) as u64 > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            data.extend_from_slice(&chunk);
        }
        upload = Some((filename, data));
    }

    let (filename, data) = upload.ok_or_else(|| AppError::Validation("No file uploaded".into()))?;

    let id = Uuid::new_v4();
    let key = storage_key(&id, &filename);
    state.media.put(&key, &data).await?;

    let record = media::ActiveModel {
        id: Set(id),
        file_id: Set(key.clone()),
        created_at: Set(Utc::now()),
    };
    let saved = record.insert(&state.db).await.map_err(|e| {
        warn!(key = %key, error = %e, "Media record insert failed; blob left orphaned");
        AppError::from(e)
    })?;

    info!(
        media_id = %id,
        size = data.len(),
        backend = state.media.backend_name(),
        "Media uploaded"
    );
    Ok(Json(MediaUploadResponse::from(saved)))
}

#[utoipa::path(
    get,
    path = "/api/v1/media/{id}",
    tag = "Media",
    operation_id = "getMedia",
    summary = "Download a media file",
    description = "Returns the stored bytes as `application/octet-stream`. A missing record \
        and a record whose blob is gone both yield 404.",
    params(("id" = Uuid, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Media content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Media not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(media_id = %id))]
pub async fn get_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "Media")?;
    let record = find_accessible_media(&state.db, &auth_user, id).await?;

    let data = state.media.get(&record.file_id).await?.ok_or_else(|| {
        warn!(key = %record.file_id, "Media record has no stored blob");
        AppError::NotFound("Media not found".into())
    })?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/media/{id}",
    tag = "Media",
    operation_id = "deleteMedia",
    summary = "Delete a media file",
    description = "Removes the blob from storage, then the record and its attachment link. \
        The record is removed even when the storage backend fails; that failure is then \
        reported as 500.",
    params(("id" = Uuid, Path, description = "Media ID")),
    responses(
        (status = 204, description = "Media deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Media not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(media_id = %id))]
pub async fn delete_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "Media")?;
    let record = find_accessible_media(&state.db, &auth_user, id).await?;

    let removed = state.media.delete(&record.file_id).await;
    if let Err(e) = &removed {
        warn!(key = %record.file_id, error = %e, "Blob delete failed; removing record anyway");
    }

    let txn = state.db.begin().await?;
    non_conformity_media::Entity::delete_many()
        .filter(non_conformity_media::Column::MediaId.eq(record.id))
        .exec(&txn)
        .await?;
    media::Entity::delete_by_id(record.id).exec(&txn).await?;
    txn.commit().await?;

    removed?;
    Ok(StatusCode::NO_CONTENT)
}
