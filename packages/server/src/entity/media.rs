use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Handle for one stored blob. The payload itself lives in the storage backend.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Storage key, `"{id}-{filename}"`.
    #[sea_orm(unique)]
    pub file_id: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
