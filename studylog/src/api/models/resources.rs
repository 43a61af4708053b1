//! API models for study resources.

use crate::db::models::resources::{LinkedResourceDBResponse, ResourceDBResponse};
use crate::types::ResourceId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// The kind of study resource a row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "study_resource_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Url,
    Video,
    Book,
    Other,
}

/// Request body for creating or replacing a study resource.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceUpsert {
    pub title: String,
    pub resource_type: ResourceType,
    /// Free-form description or URL, depending on the resource type
    pub content: Option<String>,
}

/// Query parameters for listing resources
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListResourcesQuery {
    /// Case-insensitive substring match on title or content
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ResourceId,
    pub title: String,
    pub resource_type: ResourceType,
    pub content: Option<String>,
}

impl From<ResourceDBResponse> for ResourceResponse {
    fn from(db: ResourceDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            resource_type: db.resource_type,
            content: db.content,
        }
    }
}

/// A resource as embedded in a session, with the per-link label.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResourceResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ResourceId,
    pub title: String,
    pub resource_type: ResourceType,
    pub content: Option<String>,
    pub label: Option<String>,
}

impl From<LinkedResourceDBResponse> for SessionResourceResponse {
    fn from(db: LinkedResourceDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            resource_type: db.resource_type,
            content: db.content,
            label: db.label,
        }
    }
}
