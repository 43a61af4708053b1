//! Database models for study sessions.

use crate::db::models::resources::LinkedResourceDBResponse;
use crate::db::models::tags::TagDBResponse;
use crate::types::{ResourceId, SessionId, TagId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A resource reference embedded in a session create/replace request.
#[derive(Debug, Clone)]
pub struct SessionResourceLink {
    pub resource_id: ResourceId,
    pub label: Option<String>,
}

/// Database request for creating a new study session
#[derive(Debug, Clone)]
pub struct SessionCreateDBRequest {
    pub user_id: UserId,
    pub tag_id: TagId,
    pub title: String,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub resources: Vec<SessionResourceLink>,
}

/// Database request for replacing a study session.
///
/// Scalar fields are replaced and the resource link set is rewritten
/// (delete-then-insert) in the same transaction.
#[derive(Debug, Clone)]
pub struct SessionUpdateDBRequest {
    pub tag_id: TagId,
    pub title: String,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub resources: Vec<SessionResourceLink>,
}

/// Flat row shape for session list/get queries with the tag joined in.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: SessionId,
    pub user_id: UserId,
    pub tag_id: TagId,
    pub title: String,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub tag_content: String,
    pub tag_color: String,
}

/// Database response for a study session with its tag embedded.
#[derive(Debug, Clone)]
pub struct SessionDBResponse {
    pub id: SessionId,
    pub user_id: UserId,
    pub title: String,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub tag: TagDBResponse,
    /// Populated by get-by-id; empty for list queries.
    pub resources: Vec<LinkedResourceDBResponse>,
}

impl From<SessionRow> for SessionDBResponse {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            notes: row.notes,
            started_at: row.started_at,
            duration_minutes: row.duration_minutes,
            created_at: row.created_at,
            tag: TagDBResponse {
                id: row.tag_id,
                user_id: row.user_id,
                content: row.tag_content,
                color: row.tag_color,
            },
            resources: Vec::new(),
        }
    }
}
