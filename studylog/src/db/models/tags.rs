//! Database models for tags.

use crate::types::{TagId, UserId};
use sqlx::FromRow;

/// Database request for creating a new tag
#[derive(Debug, Clone)]
pub struct TagCreateDBRequest {
    pub user_id: UserId,
    pub content: String,
    pub color: String,
}

/// Database request for replacing a tag's content and color
#[derive(Debug, Clone)]
pub struct TagUpdateDBRequest {
    pub content: String,
    pub color: String,
}

/// Database response for a tag
#[derive(Debug, Clone, FromRow)]
pub struct TagDBResponse {
    pub id: TagId,
    pub user_id: UserId,
    pub content: String,
    pub color: String,
}
