use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attachment link. Keyed by `media_id` alone, so a media record has at most
/// one owning non-conformity.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "non_conformity_media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub media_id: Uuid,
    #[sea_orm(belongs_to, from = "media_id", to = "id")]
    pub media: HasOne<super::media::Entity>,

    pub non_conformity_id: Uuid,
    #[sea_orm(belongs_to, from = "non_conformity_id", to = "id")]
    pub non_conformity: HasOne<super::non_conformity::Entity>,

    pub attached_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
