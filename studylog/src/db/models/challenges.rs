//! Database models for challenges.

use crate::api::models::challenges::ChallengeType;
use crate::types::{ChallengeId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating or replacing a user's challenge
#[derive(Debug, Clone)]
pub struct ChallengeUpsertDBRequest {
    pub user_id: UserId,
    pub title: String,
    pub target_value: i32,
    pub target_complete_date: Option<DateTime<Utc>>,
    pub challenge_type: ChallengeType,
}

/// Database response for a challenge
#[derive(Debug, Clone, FromRow)]
pub struct ChallengeDBResponse {
    pub id: ChallengeId,
    pub user_id: UserId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub target_value: i32,
    pub target_complete_date: Option<DateTime<Utc>>,
    pub challenge_type: ChallengeType,
}
