//! API models for quizzes and quiz attempts.

use super::tags::TagResponse;
use crate::db::handlers::quizzes::AttemptFeedRow;
use crate::db::models::quizzes::{QuizAttemptDBResponse, QuizDBResponse};
use crate::types::{QuizAttemptId, QuizId, TagId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for creating a quiz.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizCreate {
    #[schema(value_type = String, format = "uuid")]
    pub tag_id: TagId,
    pub title: String,
    #[serde(default)]
    pub is_multiple_choice: bool,
    pub number_of_questions: i32,
    /// One entry per question; shape is owned by the frontend
    #[schema(value_type = Object)]
    pub quiz_content: serde_json::Value,
}

/// Request body for renaming or re-tagging a quiz.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizUpdate {
    #[schema(value_type = String, format = "uuid")]
    pub tag_id: TagId,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: QuizId,
    pub title: String,
    pub is_multiple_choice: bool,
    pub number_of_questions: i32,
    pub created_at: DateTime<Utc>,
    pub tag: TagResponse,
    /// Question payload; omitted in list responses
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub quiz_content: Option<serde_json::Value>,
}

impl From<QuizDBResponse> for QuizResponse {
    fn from(db: QuizDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            is_multiple_choice: db.is_multiple_choice,
            number_of_questions: db.number_of_questions,
            created_at: db.created_at,
            tag: TagResponse::from(db.tag),
            quiz_content: db.quiz_content,
        }
    }
}

/// Request body for submitting a quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizAttemptCreate {
    /// One answer entry per question; must match the quiz's question count
    #[schema(value_type = Object)]
    pub attempt_content: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizAttemptResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: QuizAttemptId,
    #[schema(value_type = String, format = "uuid")]
    pub quiz_id: QuizId,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub attempt_content: Option<serde_json::Value>,
    pub score: Option<Decimal>,
}

impl From<QuizAttemptDBResponse> for QuizAttemptResponse {
    fn from(db: QuizAttemptDBResponse) -> Self {
        Self {
            id: db.id,
            quiz_id: db.quiz_id,
            finished_at: db.finished_at,
            attempt_content: db.attempt_content,
            score: db.score,
        }
    }
}

/// An attempt in the user-wide dashboard feed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttemptFeedItem {
    #[schema(value_type = String, format = "uuid")]
    pub id: QuizAttemptId,
    #[schema(value_type = String, format = "uuid")]
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub finished_at: DateTime<Utc>,
    pub score: Option<Decimal>,
    pub tag: TagResponse,
}

impl From<AttemptFeedRow> for AttemptFeedItem {
    fn from(row: AttemptFeedRow) -> Self {
        Self {
            id: row.id,
            quiz_id: row.quiz_id,
            quiz_title: row.quiz_title,
            finished_at: row.finished_at,
            score: row.score,
            tag: TagResponse {
                id: row.tag_id,
                content: row.tag_content,
                color: row.tag_color,
            },
        }
    }
}
