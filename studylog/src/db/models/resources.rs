//! Database models for study resources.

use crate::api::models::resources::ResourceType;
use crate::types::{ResourceId, UserId};
use sqlx::FromRow;

/// Database request for creating a new study resource
#[derive(Debug, Clone)]
pub struct ResourceCreateDBRequest {
    pub user_id: UserId,
    pub title: String,
    pub resource_type: ResourceType,
    pub content: Option<String>,
}

/// Database request for replacing a study resource's fields
#[derive(Debug, Clone)]
pub struct ResourceUpdateDBRequest {
    pub title: String,
    pub resource_type: ResourceType,
    pub content: Option<String>,
}

/// Database response for a study resource
#[derive(Debug, Clone, FromRow)]
pub struct ResourceDBResponse {
    pub id: ResourceId,
    pub user_id: UserId,
    pub title: String,
    pub resource_type: ResourceType,
    pub content: Option<String>,
}

/// A resource as linked to a study session, including the per-link label.
#[derive(Debug, Clone, FromRow)]
pub struct LinkedResourceDBResponse {
    pub id: ResourceId,
    pub title: String,
    pub resource_type: ResourceType,
    pub content: Option<String>,
    pub label: Option<String>,
}
