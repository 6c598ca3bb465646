use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    #[schema(example = "Interfaz")]
    pub name: String,
    /// Number of non-conformities filed under this category.
    pub non_conformity_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema, Clone, Debug)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
}

impl From<crate::entity::category::Model> for CategorySummary {
    fn from(category: crate::entity::category::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

/// Request body for creating or renaming a category.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CategoryRequest {
    #[schema(example = "Rendimiento")]
    pub name: String,
}
