//! API models for tags.

use crate::db::models::tags::TagDBResponse;
use crate::types::TagId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for creating or replacing a tag.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TagUpsert {
    pub content: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TagResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TagId,
    pub content: String,
    pub color: String,
}

impl From<TagDBResponse> for TagResponse {
    fn from(db: TagDBResponse) -> Self {
        Self {
            id: db.id,
            content: db.content,
            color: db.color,
        }
    }
}
