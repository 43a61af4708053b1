use crate::api::models::challenges::{ChallengeResponse, ChallengeUpsert};
use crate::api::models::users::CurrentUser;
use crate::db::handlers::Challenges;
use crate::db::models::challenges::ChallengeUpsertDBRequest;
use crate::errors::{Error, FieldError, Result};
use crate::AppState;
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    get,
    path = "/challenges",
    tag = "challenges",
    summary = "Get the user's challenge",
    responses(
        (status = 200, description = "The current challenge", body = ChallengeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No challenge set"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_challenge(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ChallengeResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Challenges::new(&mut conn);

    match repo.get_for_user(current_user.id).await? {
        Some(challenge) => Ok(Json(ChallengeResponse::from(challenge))),
        None => Err(Error::not_found("Challenge")),
    }
}

#[utoipa::path(
    put,
    path = "/challenges",
    tag = "challenges",
    summary = "Create or replace the user's challenge",
    request_body = ChallengeUpsert,
    responses(
        (status = 200, description = "Challenge stored", body = ChallengeResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn upsert_challenge(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(upsert): Json<ChallengeUpsert>,
) -> Result<Json<ChallengeResponse>> {
    let mut errors = Vec::new();
    if upsert.title.trim().is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    }
    if upsert.target_value < 1 {
        errors.push(FieldError::new("target_value", "Target value must be at least 1"));
    }
    if !errors.is_empty() {
        return Err(Error::Validation { errors });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Challenges::new(&mut conn);

    let challenge = repo
        .upsert(&ChallengeUpsertDBRequest {
            user_id: current_user.id,
            title: upsert.title,
            target_value: upsert.target_value,
            target_complete_date: upsert.target_complete_date,
            challenge_type: upsert.challenge_type,
        })
        .await?;

    Ok(Json(ChallengeResponse::from(challenge)))
}

#[utoipa::path(
    delete,
    path = "/challenges",
    tag = "challenges",
    summary = "Delete the user's challenge",
    responses(
        (status = 204, description = "Challenge deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No challenge set"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_challenge(State(state): State<AppState>, current_user: CurrentUser) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Challenges::new(&mut conn);

    if repo.delete_for_user(current_user.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Challenge"))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{authed, create_test_app, register_user};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_challenge_upsert_and_delete(pool: PgPool) {
        let server = create_test_app(pool).await;
        let user = register_user(&server, "challenger", "challenger@example.com", "a-long-password").await;
        let token = user["access_token"].as_str().unwrap();

        // Nothing set yet
        authed(server.get("/api/v1/challenges"), token)
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);

        let stored = authed(server.put("/api/v1/challenges"), token)
            .json(&json!({
                "title": "Study 10 hours this week",
                "target_value": 600,
                "challenge_type": "time",
                "target_complete_date": null
            }))
            .await;
        stored.assert_status_ok();

        // Replacing keeps the single-row-per-user shape
        let replaced = authed(server.put("/api/v1/challenges"), token)
            .json(&json!({
                "title": "Finish 5 quizzes",
                "target_value": 5,
                "challenge_type": "nOfTasks"
            }))
            .await;
        replaced.assert_status_ok();
        let challenge: serde_json::Value = replaced.json();
        assert_eq!(challenge["challenge_type"], "nOfTasks");

        let fetched = authed(server.get("/api/v1/challenges"), token).await;
        fetched.assert_status_ok();
        assert_eq!(fetched.json::<serde_json::Value>()["title"], "Finish 5 quizzes");

        authed(server.delete("/api/v1/challenges"), token)
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);
        authed(server.delete("/api/v1/challenges"), token)
            .await
            .assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_challenge_validation(pool: PgPool) {
        let server = create_test_app(pool).await;
        let user = register_user(&server, "challval", "challval@example.com", "a-long-password").await;
        let token = user["access_token"].as_str().unwrap();

        let response = authed(server.put("/api/v1/challenges"), token)
            .json(&json!({"title": "", "target_value": 0, "challenge_type": "task"}))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }
}
