use crate::api::models::quizzes::AttemptFeedItem;
use crate::api::models::sessions::SessionResponse;
use crate::api::models::users::{CurrentUser, EventsQuery, EventsResponse, UserDetailsResponse};
use crate::db::handlers::{Quizzes, Repository, Sessions, Users, quizzes::AttemptFeedFilter, sessions::SessionFilter};
use crate::errors::{Error, Result};
use crate::AppState;
use axum::{
    Json,
    extract::{Query, State},
};

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    summary = "Get the authenticated user's profile",
    responses(
        (status = 200, description = "Profile details", body = UserDetailsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "The token's user no longer exists"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user_details(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserDetailsResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let user = repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::not_found("User"))?;

    Ok(Json(UserDetailsResponse {
        user_id: user.id,
        username: user.username,
        email: user.email,
    }))
}

#[utoipa::path(
    get,
    path = "/users/me/events",
    tag = "users",
    summary = "Combined dashboard feed of sessions and quiz attempts",
    responses(
        (status = 200, description = "Events in the requested range", body = EventsResponse),
        (status = 401, description = "Unauthorized"),
    ),
    params(EventsQuery),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
    current_user: CurrentUser,
) -> Result<Json<EventsResponse>> {
    let (skip, limit) = query.pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let sessions = {
        let mut repo = Sessions::new(&mut conn);
        repo.list(&SessionFilter {
            user_id: current_user.id,
            from: query.from,
            to: query.to,
            skip,
            limit,
        })
        .await?
    };

    let attempts = {
        let mut repo = Quizzes::new(&mut conn);
        repo.attempt_feed(&AttemptFeedFilter {
            user_id: current_user.id,
            from: query.from,
            to: query.to,
            skip,
            limit,
        })
        .await?
    };

    Ok(Json(EventsResponse {
        sessions: sessions.into_iter().map(SessionResponse::from).collect(),
        quiz_attempts: attempts.into_iter().map(AttemptFeedItem::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{authed, create_test_app, register_user};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_user_details(pool: PgPool) {
        let server = create_test_app(pool).await;
        let user = register_user(&server, "profileuser", "profile@example.com", "a-long-password").await;
        let token = user["access_token"].as_str().unwrap();

        let response = authed(server.get("/api/v1/users/me"), token).await;
        response.assert_status_ok();
        let details: serde_json::Value = response.json();
        assert_eq!(details["username"], "profileuser");
        assert_eq!(details["email"], "profile@example.com");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_events_combines_sessions_and_attempts(pool: PgPool) {
        let server = create_test_app(pool).await;
        let user = register_user(&server, "eventsuser", "events@example.com", "a-long-password").await;
        let token = user["access_token"].as_str().unwrap();

        let tag = authed(server.post("/api/v1/tags"), token)
            .json(&json!({"content": "events", "color": "#aabbcc"}))
            .await
            .json::<serde_json::Value>();
        let tag_id = tag["id"].as_str().unwrap();

        authed(server.post("/api/v1/sessions"), token)
            .json(&json!({
                "tag_id": tag_id,
                "title": "Tracked session",
                "started_at": (chrono::Utc::now() - chrono::Duration::hours(3)).to_rfc3339(),
                "duration_minutes": 30,
                "resources": []
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let quiz = authed(server.post("/api/v1/quizzes"), token)
            .json(&json!({
                "tag_id": tag_id,
                "title": "Tracked quiz",
                "number_of_questions": 1,
                "quiz_content": [{"question": "?", "answers": [true]}]
            }))
            .await
            .json::<serde_json::Value>();
        let quiz_id = quiz["id"].as_str().unwrap();

        authed(server.post(&format!("/api/v1/quizzes/{quiz_id}/attempts")), token)
            .json(&json!({"attempt_content": [[true]]}))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let events = authed(server.get("/api/v1/users/me/events"), token).await;
        events.assert_status_ok();
        let body: serde_json::Value = events.json();
        assert_eq!(body["sessions"].as_array().unwrap().len(), 1);
        assert_eq!(body["quiz_attempts"].as_array().unwrap().len(), 1);
        assert_eq!(body["quiz_attempts"][0]["quiz_title"], "Tracked quiz");

        // A range in the past excludes everything
        let empty = authed(server.get("/api/v1/users/me/events"), token)
            .add_query_param("to", (chrono::Utc::now() - chrono::Duration::days(7)).to_rfc3339())
            .await;
        let body: serde_json::Value = empty.json();
        assert_eq!(body["sessions"].as_array().unwrap().len(), 0);
        assert_eq!(body["quiz_attempts"].as_array().unwrap().len(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_events_requires_auth(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server.get("/api/v1/users/me/events").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }
}
