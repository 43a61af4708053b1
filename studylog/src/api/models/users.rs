//! API models for users and the authenticated-request context.

use super::pagination::Pagination;
use super::quizzes::AttemptFeedItem;
use super::sessions::SessionResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// The authenticated user, as carried in the access token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
}

/// Profile details for the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDetailsResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub username: String,
    pub email: String,
}

/// Query parameters for the dashboard event feed
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct EventsQuery {
    /// Only include events at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Only include events at or before this instant
    pub to: Option<DateTime<Utc>>,
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// Combined feed of sessions and quiz attempts for the dashboard/calendar.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventsResponse {
    pub sessions: Vec<SessionResponse>,
    pub quiz_attempts: Vec<AttemptFeedItem>,
}
