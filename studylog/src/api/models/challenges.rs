//! API models for challenges.

use crate::db::models::challenges::ChallengeDBResponse;
use crate::types::ChallengeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a challenge's target_value counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "challenge_type", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ChallengeType {
    /// Minutes of study time
    Time,
    /// Number of completed tasks
    NOfTasks,
    /// A single one-off task
    Task,
}

/// Request body for creating or replacing the user's challenge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChallengeUpsert {
    pub title: String,
    pub target_value: i32,
    pub target_complete_date: Option<DateTime<Utc>>,
    pub challenge_type: ChallengeType,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChallengeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ChallengeId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub target_value: i32,
    pub target_complete_date: Option<DateTime<Utc>>,
    pub challenge_type: ChallengeType,
}

impl From<ChallengeDBResponse> for ChallengeResponse {
    fn from(db: ChallengeDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            created_at: db.created_at,
            target_value: db.target_value,
            target_complete_date: db.target_complete_date,
            challenge_type: db.challenge_type,
        }
    }
}
