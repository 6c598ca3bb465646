use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::entity::{media, non_conformity, non_conformity_media, project, project_user, sprint};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Reword a parent's 404 so it names the resource that was asked for.
fn hide_as(err: AppError, message: &str) -> AppError {
    match err {
        AppError::NotFound(_) => AppError::NotFound(message.into()),
        other => other,
    }
}

/// Verify the caller can see the given project. Admins see every project,
/// everyone else only the ones they are a member of. Non-members get the
/// same 404 as a missing project.
pub async fn check_project_access<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    project_id: Uuid,
) -> Result<(), AppError> {
    if auth_user.is_admin() {
        return Ok(());
    }
    let is_member = project_user::Entity::find_by_id((project_id, auth_user.user_id))
        .one(db)
        .await?
        .is_some();
    if is_member {
        Ok(())
    } else {
        Err(AppError::NotFound("Project not found".into()))
    }
}

/// Look up a project by ID, returning 404 if not found.
pub async fn find_project<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<project::Model, AppError> {
    project::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

/// Look up a project the caller can see.
pub async fn find_accessible_project<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    id: Uuid,
) -> Result<project::Model, AppError> {
    let project = find_project(db, id).await?;
    check_project_access(db, auth_user, project.id).await?;
    Ok(project)
}

/// Look up a sprint inside a project the caller can see.
pub async fn find_accessible_sprint<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    id: Uuid,
) -> Result<sprint::Model, AppError> {
    let sprint = sprint::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sprint not found".into()))?;
    check_project_access(db, auth_user, sprint.project_id)
        .await
        .map_err(|e| hide_as(e, "Sprint not found"))?;
    Ok(sprint)
}

/// Look up a non-conformity inside a project the caller can see.
pub async fn find_accessible_non_conformity<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    id: Uuid,
) -> Result<non_conformity::Model, AppError> {
    let not_found = || AppError::NotFound("Non-conformity not found".into());
    let nc = non_conformity::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    find_accessible_sprint(db, auth_user, nc.sprint_id)
        .await
        .map_err(|e| hide_as(e, "Non-conformity not found"))?;
    Ok(nc)
}

/// Look up a media record. Attached media is only visible to callers who
/// can see the owning non-conformity; unattached media to any user.
pub async fn find_accessible_media<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    id: Uuid,
) -> Result<media::Model, AppError> {
    let not_found = || AppError::NotFound("Media not found".into());
    let media = media::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    if let Some(link) = non_conformity_media::Entity::find_by_id(media.id)
        .one(db)
        .await?
    {
        find_accessible_non_conformity(db, auth_user, link.non_conformity_id)
            .await
            .map_err(|e| hide_as(e, "Media not found"))?;
    }
    Ok(media)
}
