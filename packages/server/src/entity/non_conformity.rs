use common::{Priority, Status};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "non_conformity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,
    /// What was observed.
    pub description: String,
    /// What should have happened instead.
    pub expected: String,
    pub status: Status,
    pub priority: Priority,

    pub sprint_id: Uuid,
    #[sea_orm(belongs_to, from = "sprint_id", to = "id")]
    pub sprint: HasOne<super::sprint::Entity>,

    pub category_id: Uuid,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::category::Entity>,

    pub created_by_id: Uuid,
    #[sea_orm(belongs_to, relation_enum = "Creator", from = "created_by_id", to = "id")]
    pub created_by: HasOne<super::user::Entity>,

    pub assigned_to_id: Uuid,
    #[sea_orm(belongs_to, relation_enum = "Assignee", from = "assigned_to_id", to = "id")]
    pub assigned_to: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
