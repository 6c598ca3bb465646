use serde::Serialize;
use uuid::Uuid;

/// Successful upload response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MediaUploadResponse {
    /// Media ID used in `/media/{id}` and in attachment links.
    pub id: Uuid,
    /// Storage key the bytes were written under.
    #[serde(rename = "fileId")]
    #[schema(example = "0b9f3c1e-7d2a-4c55-9a43-2f1e0c8d6b71-photo.png")]
    pub file_id: String,
}

impl From<crate::entity::media::Model> for MediaUploadResponse {
    fn from(media: crate::entity::media::Model) -> Self {
        Self {
            id: media.id,
            file_id: media.file_id,
        }
    }
}
