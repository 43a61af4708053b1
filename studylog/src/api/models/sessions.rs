//! API models for study sessions.

use super::pagination::Pagination;
use super::resources::SessionResourceResponse;
use super::tags::TagResponse;
use crate::db::models::sessions::SessionDBResponse;
use crate::types::{ResourceId, SessionId, TagId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// A resource reference inside a session create/replace body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResourceRef {
    #[schema(value_type = String, format = "uuid")]
    pub resource_id: ResourceId,
    pub label: Option<String>,
}

/// Request body for creating or replacing a study session.
///
/// The resource list is authoritative: on replace it overwrites whatever
/// links existed before.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionUpsert {
    #[schema(value_type = String, format = "uuid")]
    pub tag_id: TagId,
    pub title: String,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i32,
    #[serde(default)]
    pub resources: Vec<SessionResourceRef>,
}

/// Query parameters for listing sessions
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListSessionsQuery {
    /// Only include sessions started at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Only include sessions started at or before this instant
    pub to: Option<DateTime<Utc>>,
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SessionId,
    pub title: String,
    pub notes: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub tag: TagResponse,
    /// Only hydrated on single-session reads; empty in list responses.
    pub resources: Vec<SessionResourceResponse>,
}

impl From<SessionDBResponse> for SessionResponse {
    fn from(db: SessionDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            notes: db.notes,
            started_at: db.started_at,
            duration_minutes: db.duration_minutes,
            created_at: db.created_at,
            tag: TagResponse::from(db.tag),
            resources: db.resources.into_iter().map(SessionResourceResponse::from).collect(),
        }
    }
}
