use crate::api::models::quizzes::{QuizAttemptCreate, QuizAttemptResponse, QuizCreate, QuizResponse, QuizUpdate};
use crate::api::models::users::CurrentUser;
use crate::db::handlers::{Quizzes, Repository, Tags, quizzes::QuizFilter};
use crate::db::models::quizzes::{QuizAttemptCreateDBRequest, QuizCreateDBRequest, QuizUpdateDBRequest};
use crate::errors::{Error, FieldError, Result};
use crate::types::{QuizAttemptId, QuizId};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;

#[utoipa::path(
    get,
    path = "/quizzes",
    tag = "quizzes",
    summary = "List quizzes",
    responses(
        (status = 200, description = "The user's quizzes, without question payloads", body = Vec<QuizResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_quizzes(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<QuizResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quizzes::new(&mut conn);

    let quizzes = repo.list(&QuizFilter { user_id: current_user.id }).await?;
    Ok(Json(quizzes.into_iter().map(QuizResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/quizzes/{quiz_id}",
    tag = "quizzes",
    summary = "Get quiz",
    responses(
        (status = 200, description = "Quiz with question payload", body = QuizResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Quiz not found"),
    ),
    params(("quiz_id" = uuid::Uuid, Path, description = "Quiz ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_quiz(State(state): State<AppState>, Path(quiz_id): Path<QuizId>, current_user: CurrentUser) -> Result<Json<QuizResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quizzes::new(&mut conn);

    match repo.get_by_id((quiz_id, current_user.id)).await? {
        Some(quiz) => Ok(Json(QuizResponse::from(quiz))),
        None => Err(Error::not_found("Quiz")),
    }
}

#[utoipa::path(
    post,
    path = "/quizzes",
    tag = "quizzes",
    summary = "Create quiz",
    request_body = QuizCreate,
    responses(
        (status = 201, description = "Quiz created", body = QuizResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_quiz(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>)> {
    let mut errors = Vec::new();
    if create.title.trim().is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    }
    if create.number_of_questions < 1 {
        errors.push(FieldError::new("number_of_questions", "A quiz needs at least one question"));
    }
    match create.quiz_content.as_array() {
        Some(questions) if questions.len() == create.number_of_questions as usize => {}
        Some(questions) => {
            errors.push(FieldError::new(
                "quiz_content",
                format!(
                    "Quiz content must have one entry per question. Received {} entries, expected {}",
                    questions.len(),
                    create.number_of_questions
                ),
            ));
        }
        None => errors.push(FieldError::new("quiz_content", "Quiz content must be an array")),
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut tags = Tags::new(&mut conn);
    if tags.get_by_id((create.tag_id, current_user.id)).await?.is_none() {
        errors.push(FieldError::new("tag_id", "Tag not found"));
    }

    if !errors.is_empty() {
        return Err(Error::Validation { errors });
    }

    let mut repo = Quizzes::new(&mut conn);
    let quiz = repo
        .create(&QuizCreateDBRequest {
            user_id: current_user.id,
            tag_id: create.tag_id,
            title: create.title,
            is_multiple_choice: create.is_multiple_choice,
            number_of_questions: create.number_of_questions,
            quiz_content: create.quiz_content,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(QuizResponse::from(quiz))))
}

#[utoipa::path(
    put,
    path = "/quizzes/{quiz_id}",
    tag = "quizzes",
    summary = "Rename or re-tag quiz",
    request_body = QuizUpdate,
    responses(
        (status = 200, description = "Quiz updated", body = QuizResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Quiz not found"),
    ),
    params(("quiz_id" = uuid::Uuid, Path, description = "Quiz ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<QuizId>,
    current_user: CurrentUser,
    Json(update): Json<QuizUpdate>,
) -> Result<Json<QuizResponse>> {
    if update.title.trim().is_empty() {
        return Err(Error::validation("title", "Title is required"));
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut tags = Tags::new(&mut conn);
    if tags.get_by_id((update.tag_id, current_user.id)).await?.is_none() {
        return Err(Error::validation("tag_id", "Tag not found"));
    }

    let mut repo = Quizzes::new(&mut conn);
    let quiz = repo
        .update(
            (quiz_id, current_user.id),
            &QuizUpdateDBRequest {
                title: update.title,
                tag_id: update.tag_id,
            },
        )
        .await
        .map_err(|e| match e {
            crate::db::errors::DbError::NotFound => Error::not_found("Quiz"),
            other => Error::Database(other),
        })?;

    Ok(Json(QuizResponse::from(quiz)))
}

#[utoipa::path(
    delete,
    path = "/quizzes/{quiz_id}",
    tag = "quizzes",
    summary = "Delete quiz",
    responses(
        (status = 204, description = "Quiz deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Quiz not found"),
    ),
    params(("quiz_id" = uuid::Uuid, Path, description = "Quiz ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_quiz(State(state): State<AppState>, Path(quiz_id): Path<QuizId>, current_user: CurrentUser) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quizzes::new(&mut conn);

    if repo.delete((quiz_id, current_user.id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Quiz"))
    }
}

#[utoipa::path(
    post,
    path = "/quizzes/{quiz_id}/attempts",
    tag = "quizzes",
    summary = "Submit quiz attempt",
    request_body = QuizAttemptCreate,
    responses(
        (status = 201, description = "Attempt recorded", body = QuizAttemptResponse),
        (status = 400, description = "Answer count does not match the quiz"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Quiz not found"),
    ),
    params(("quiz_id" = uuid::Uuid, Path, description = "Quiz ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_quiz_attempt(
    State(state): State<AppState>,
    Path(quiz_id): Path<QuizId>,
    current_user: CurrentUser,
    Json(create): Json<QuizAttemptCreate>,
) -> Result<(StatusCode, Json<QuizAttemptResponse>)> {
    let answers = create
        .attempt_content
        .as_array()
        .ok_or_else(|| Error::validation("attempt_content", "Attempt content must be an array and cannot be empty"))?;
    if answers.is_empty() {
        return Err(Error::validation("attempt_content", "Attempt content must be an array and cannot be empty"));
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quizzes::new(&mut conn);

    let quiz = repo
        .get_by_id((quiz_id, current_user.id))
        .await?
        .ok_or_else(|| Error::not_found("Quiz"))?;

    // The answer array must line up with the quiz one-to-one
    if answers.len() != quiz.number_of_questions as usize {
        return Err(Error::validation(
            "attempt_content",
            format!(
                "Attempt content must be the same length as the number of questions. Received {} answers, expected {}",
                answers.len(),
                quiz.number_of_questions
            ),
        ));
    }

    let attempt = repo
        .create_attempt(&QuizAttemptCreateDBRequest {
            quiz_id: quiz.id,
            attempt_content: create.attempt_content,
            score: Decimal::ZERO,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(QuizAttemptResponse::from(attempt))))
}

#[utoipa::path(
    get,
    path = "/quizzes/{quiz_id}/attempts",
    tag = "quizzes",
    summary = "List attempts for a quiz",
    responses(
        (status = 200, description = "Attempts, newest first, without answer payloads", body = Vec<QuizAttemptResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Quiz not found"),
    ),
    params(("quiz_id" = uuid::Uuid, Path, description = "Quiz ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_quiz_attempts(
    State(state): State<AppState>,
    Path(quiz_id): Path<QuizId>,
    current_user: CurrentUser,
) -> Result<Json<Vec<QuizAttemptResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quizzes::new(&mut conn);

    if repo.get_by_id((quiz_id, current_user.id)).await?.is_none() {
        return Err(Error::not_found("Quiz"));
    }

    let attempts = repo.list_attempts(quiz_id, current_user.id).await?;
    Ok(Json(attempts.into_iter().map(QuizAttemptResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/quizzes/attempts/{attempt_id}",
    tag = "quizzes",
    summary = "Get quiz attempt",
    responses(
        (status = 200, description = "Attempt with answer payload", body = QuizAttemptResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attempt not found"),
    ),
    params(("attempt_id" = uuid::Uuid, Path, description = "Attempt ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_quiz_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<QuizAttemptId>,
    current_user: CurrentUser,
) -> Result<Json<QuizAttemptResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quizzes::new(&mut conn);

    match repo.get_attempt(attempt_id, current_user.id).await? {
        Some(attempt) => Ok(Json(QuizAttemptResponse::from(attempt))),
        None => Err(Error::not_found("Attempt")),
    }
}

#[utoipa::path(
    delete,
    path = "/quizzes/attempts/{attempt_id}",
    tag = "quizzes",
    summary = "Delete quiz attempt",
    responses(
        (status = 204, description = "Attempt deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attempt not found"),
    ),
    params(("attempt_id" = uuid::Uuid, Path, description = "Attempt ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_quiz_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<QuizAttemptId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quizzes::new(&mut conn);

    if repo.delete_attempt(attempt_id, current_user.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Attempt"))
    }
}
