use chrono::Utc;
use common::Role;
use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::config::SeedConfig;
use crate::entity::{non_conformity, non_conformity_media, sprint, user};
use crate::utils::hash;

/// Create the initial administrator when the user table is empty.
pub async fn seed_admin(db: &DatabaseConnection, seed: &SeedConfig) -> Result<(), DbErr> {
    if user::Entity::find().count(db).await? > 0 {
        return Ok(());
    }

    let password = hash::hash_password(&seed.admin_password)
        .map_err(|e| DbErr::Custom(format!("Password hash error: {e}")))?;

    let admin = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(seed.admin_name.clone()),
        email: Set(seed.admin_email.trim().to_lowercase()),
        password: Set(password),
        role: Set(Role::Admin),
        created_at: Set(Utc::now()),
    };

    let result = user::Entity::insert(admin)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => info!(email = %seed.admin_email, "Seeded initial administrator"),
        Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e),
    }

    Ok(())
}

async fn ensure_index(db: &DatabaseConnection, name: &str, stmt: &mut IndexCreateStatement) {
    let sql = stmt.if_not_exists().name(name).to_string(PostgresQueryBuilder);
    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index {name} exists"),
        Err(e) => tracing::warn!("Failed to create index {name}: {}", e),
    }
}

/// Ensure required database indexes exist.
///
/// Schema sync creates primary keys, unique columns and foreign keys but not
/// secondary indexes, so the lookups used by the project tree get theirs here.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Project detail: sprints of a project, newest start first.
    ensure_index(
        db,
        "idx_sprint_project_start",
        Index::create()
            .table(sprint::Entity)
            .col(sprint::Column::ProjectId)
            .col(sprint::Column::StartAt),
    )
    .await;

    // Project detail: non-conformities of a sprint, newest first.
    ensure_index(
        db,
        "idx_non_conformity_sprint_created",
        Index::create()
            .table(non_conformity::Entity)
            .col(non_conformity::Column::SprintId)
            .col(non_conformity::Column::CreatedAt),
    )
    .await;

    ensure_index(
        db,
        "idx_non_conformity_media_owner",
        Index::create()
            .table(non_conformity_media::Entity)
            .col(non_conformity_media::Column::NonConformityId),
    )
    .await;

    Ok(())
}
