//! Database repository for quizzes and quiz attempts.
//!
//! Attempts have no user_id column of their own; ownership checks join
//! through the quiz row.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::quizzes::{
        QuizAttemptCreateDBRequest, QuizAttemptDBResponse, QuizCreateDBRequest, QuizDBResponse, QuizRow, QuizUpdateDBRequest,
    },
};
use crate::types::{QuizAttemptId, QuizId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing a user's quizzes
#[derive(Debug, Clone)]
pub struct QuizFilter {
    pub user_id: UserId,
}

/// Filter for the cross-quiz attempt feed (dashboard/calendar)
#[derive(Debug, Clone)]
pub struct AttemptFeedFilter {
    pub user_id: UserId,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub skip: i64,
    pub limit: i64,
}

/// An attempt row in the user-wide feed, with quiz title and tag joined in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttemptFeedRow {
    pub id: QuizAttemptId,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub finished_at: DateTime<Utc>,
    pub score: Option<rust_decimal::Decimal>,
    pub tag_id: crate::types::TagId,
    pub tag_content: String,
    pub tag_color: String,
}

pub struct Quizzes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Quizzes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(quiz_id = %abbrev_uuid(&request.quiz_id)), err)]
    pub async fn create_attempt(&mut self, request: &QuizAttemptCreateDBRequest) -> Result<QuizAttemptDBResponse> {
        let attempt = sqlx::query_as::<_, QuizAttemptDBResponse>(
            r#"
            INSERT INTO quiz_attempts (quiz_id, attempt_content, score)
            VALUES ($1, $2, $3)
            RETURNING id, quiz_id, finished_at, attempt_content, score
            "#,
        )
        .bind(request.quiz_id)
        .bind(&request.attempt_content)
        .bind(request.score)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(attempt)
    }

    #[instrument(skip(self), fields(attempt_id = %abbrev_uuid(&attempt_id)), err)]
    pub async fn get_attempt(&mut self, attempt_id: QuizAttemptId, user_id: UserId) -> Result<Option<QuizAttemptDBResponse>> {
        let attempt = sqlx::query_as::<_, QuizAttemptDBResponse>(
            r#"
            SELECT a.id, a.quiz_id, a.finished_at, a.attempt_content, a.score
            FROM quiz_attempts a
            INNER JOIN quizzes q ON q.id = a.quiz_id
            WHERE a.id = $1 AND q.user_id = $2
            "#,
        )
        .bind(attempt_id)
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(attempt)
    }

    /// Attempts for one quiz, newest first, without the answer payload.
    #[instrument(skip(self), fields(quiz_id = %abbrev_uuid(&quiz_id)), err)]
    pub async fn list_attempts(&mut self, quiz_id: QuizId, user_id: UserId) -> Result<Vec<QuizAttemptDBResponse>> {
        let attempts = sqlx::query_as::<_, QuizAttemptDBResponse>(
            r#"
            SELECT a.id, a.quiz_id, a.finished_at, NULL::jsonb AS attempt_content, a.score
            FROM quiz_attempts a
            INNER JOIN quizzes q ON q.id = a.quiz_id
            WHERE a.quiz_id = $1 AND q.user_id = $2
            ORDER BY a.finished_at DESC
            "#,
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(attempts)
    }

    /// All of a user's attempts across quizzes within a finished_at range.
    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    pub async fn attempt_feed(&mut self, filter: &AttemptFeedFilter) -> Result<Vec<AttemptFeedRow>> {
        let rows = sqlx::query_as::<_, AttemptFeedRow>(
            r#"
            SELECT a.id, a.quiz_id, q.title AS quiz_title, a.finished_at, a.score,
                   t.id AS tag_id, t.content AS tag_content, t.color AS tag_color
            FROM quiz_attempts a
            INNER JOIN quizzes q ON q.id = a.quiz_id
            INNER JOIN tags t ON t.id = q.tag_id
            WHERE q.user_id = $1
              AND ($2::timestamptz IS NULL OR a.finished_at >= $2)
              AND ($3::timestamptz IS NULL OR a.finished_at <= $3)
            ORDER BY a.finished_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), fields(attempt_id = %abbrev_uuid(&attempt_id)), err)]
    pub async fn delete_attempt(&mut self, attempt_id: QuizAttemptId, user_id: UserId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM quiz_attempts a
            USING quizzes q
            WHERE a.quiz_id = q.id AND a.id = $1 AND q.user_id = $2
            "#,
        )
        .bind(attempt_id)
        .bind(user_id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Quizzes<'c> {
    type CreateRequest = QuizCreateDBRequest;
    type UpdateRequest = QuizUpdateDBRequest;
    type Response = QuizDBResponse;
    type Id = (QuizId, UserId);
    type Filter = QuizFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let quiz_id: QuizId = sqlx::query_scalar(
            r#"
            INSERT INTO quizzes (user_id, tag_id, title, is_multiple_choice, number_of_questions, quiz_content)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(request.user_id)
        .bind(request.tag_id)
        .bind(&request.title)
        .bind(request.is_multiple_choice)
        .bind(request.number_of_questions)
        .bind(&request.quiz_content)
        .fetch_one(&mut *self.db)
        .await?;

        self.get_by_id((quiz_id, request.user_id)).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip_all, fields(quiz_id = %abbrev_uuid(&id.0)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let (id, user_id) = id;
        let row = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT q.id, q.user_id, q.tag_id, q.title, q.is_multiple_choice,
                   q.number_of_questions, q.created_at, q.quiz_content,
                   t.content AS tag_content, t.color AS tag_color
            FROM quizzes q
            INNER JOIN tags t ON t.id = q.tag_id
            WHERE q.id = $1 AND q.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row.map(QuizDBResponse::from))
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let rows = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT q.id, q.user_id, q.tag_id, q.title, q.is_multiple_choice,
                   q.number_of_questions, q.created_at, NULL::jsonb AS quiz_content,
                   t.content AS tag_content, t.color AS tag_color
            FROM quizzes q
            INNER JOIN tags t ON t.id = q.tag_id
            WHERE q.user_id = $1
            ORDER BY q.created_at DESC
            "#,
        )
        .bind(filter.user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows.into_iter().map(QuizDBResponse::from).collect())
    }

    #[instrument(skip_all, fields(quiz_id = %abbrev_uuid(&id.0)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (id, user_id) = id;
        let updated = sqlx::query(
            r#"
            UPDATE quizzes SET title = $3, tag_id = $4
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&request.title)
        .bind(request.tag_id)
        .execute(&mut *self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id((id, user_id)).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip_all, fields(quiz_id = %abbrev_uuid(&id.0)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let (id, user_id) = id;
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
