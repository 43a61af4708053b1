//! Database models for quizzes and quiz attempts.

use crate::db::models::tags::TagDBResponse;
use crate::types::{QuizAttemptId, QuizId, TagId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Database request for creating a new quiz
#[derive(Debug, Clone)]
pub struct QuizCreateDBRequest {
    pub user_id: UserId,
    pub tag_id: TagId,
    pub title: String,
    pub is_multiple_choice: bool,
    pub number_of_questions: i32,
    pub quiz_content: serde_json::Value,
}

/// Database request for renaming or re-tagging a quiz.
///
/// Question content is immutable once attempts may exist against it.
#[derive(Debug, Clone)]
pub struct QuizUpdateDBRequest {
    pub title: String,
    pub tag_id: TagId,
}

/// Flat row shape for quiz queries with the tag joined in.
#[derive(Debug, Clone, FromRow)]
pub struct QuizRow {
    pub id: QuizId,
    pub user_id: UserId,
    pub tag_id: TagId,
    pub title: String,
    pub is_multiple_choice: bool,
    pub number_of_questions: i32,
    pub created_at: DateTime<Utc>,
    pub tag_content: String,
    pub tag_color: String,
    /// Only selected by get-by-id; list queries leave the question payload out.
    pub quiz_content: Option<serde_json::Value>,
}

/// Database response for a quiz with its tag embedded.
#[derive(Debug, Clone)]
pub struct QuizDBResponse {
    pub id: QuizId,
    pub user_id: UserId,
    pub title: String,
    pub is_multiple_choice: bool,
    pub number_of_questions: i32,
    pub created_at: DateTime<Utc>,
    pub tag: TagDBResponse,
    pub quiz_content: Option<serde_json::Value>,
}

impl From<QuizRow> for QuizDBResponse {
    fn from(row: QuizRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            is_multiple_choice: row.is_multiple_choice,
            number_of_questions: row.number_of_questions,
            created_at: row.created_at,
            tag: TagDBResponse {
                id: row.tag_id,
                user_id: row.user_id,
                content: row.tag_content,
                color: row.tag_color,
            },
            quiz_content: row.quiz_content,
        }
    }
}

/// Database request for recording a quiz attempt
#[derive(Debug, Clone)]
pub struct QuizAttemptCreateDBRequest {
    pub quiz_id: QuizId,
    pub attempt_content: serde_json::Value,
    pub score: Decimal,
}

/// Database response for a quiz attempt
#[derive(Debug, Clone, FromRow)]
pub struct QuizAttemptDBResponse {
    pub id: QuizAttemptId,
    pub quiz_id: QuizId,
    pub finished_at: DateTime<Utc>,
    /// Omitted from list queries.
    pub attempt_content: Option<serde_json::Value>,
    pub score: Option<Decimal>,
}
