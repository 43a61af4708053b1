use crate::api::models::resources::ResourceResponse;
use crate::api::models::sessions::{ListSessionsQuery, SessionResponse, SessionUpsert};
use crate::api::models::users::CurrentUser;
use crate::db::handlers::{Repository, Resources, Sessions, Tags, sessions::SessionFilter};
use crate::db::models::sessions::{SessionCreateDBRequest, SessionResourceLink, SessionUpdateDBRequest};
use crate::errors::{Error, FieldError, Result};
use crate::types::{SessionId, UserId};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use sqlx::PgConnection;

#[utoipa::path(
    get,
    path = "/sessions",
    tag = "sessions",
    summary = "List sessions",
    responses(
        (status = 200, description = "The user's sessions, newest first", body = Vec<SessionResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    params(ListSessionsQuery),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListSessionsQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<SessionResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Sessions::new(&mut conn);

    let sessions = repo
        .list(&SessionFilter {
            user_id: current_user.id,
            from: query.from,
            to: query.to,
            skip,
            limit,
        })
        .await?;

    Ok(Json(sessions.into_iter().map(SessionResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/sessions/{session_id}",
    tag = "sessions",
    summary = "Get session",
    responses(
        (status = 200, description = "Session with tag and resources", body = SessionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found"),
    ),
    params(("session_id" = uuid::Uuid, Path, description = "Session ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    current_user: CurrentUser,
) -> Result<Json<SessionResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Sessions::new(&mut conn);

    match repo.get_by_id((session_id, current_user.id)).await? {
        Some(session) => Ok(Json(SessionResponse::from(session))),
        None => Err(Error::not_found("Session")),
    }
}

#[utoipa::path(
    get,
    path = "/sessions/{session_id}/resources",
    tag = "sessions",
    summary = "List a session's resources",
    responses(
        (status = 200, description = "Resources linked to the session", body = Vec<ResourceResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found"),
    ),
    params(("session_id" = uuid::Uuid, Path, description = "Session ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_session_resources(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    current_user: CurrentUser,
) -> Result<Json<Vec<ResourceResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut sessions = Sessions::new(&mut conn);
    if sessions.get_by_id((session_id, current_user.id)).await?.is_none() {
        return Err(Error::not_found("Session"));
    }

    let mut resources = Resources::new(&mut conn);
    let linked = resources.list_for_session(session_id, current_user.id).await?;
    Ok(Json(linked.into_iter().map(ResourceResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    summary = "Create session",
    request_body = SessionUpsert,
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_session(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<SessionUpsert>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    validate_session(&mut conn, &create, current_user.id).await?;

    let mut repo = Sessions::new(&mut conn);
    let session = repo
        .create(&SessionCreateDBRequest {
            user_id: current_user.id,
            tag_id: create.tag_id,
            title: create.title,
            notes: create.notes,
            started_at: create.started_at,
            duration_minutes: create.duration_minutes,
            resources: to_links(create.resources),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

#[utoipa::path(
    put,
    path = "/sessions/{session_id}",
    tag = "sessions",
    summary = "Replace session",
    request_body = SessionUpsert,
    responses(
        (status = 200, description = "Session replaced", body = SessionResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found"),
    ),
    params(("session_id" = uuid::Uuid, Path, description = "Session ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn replace_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    current_user: CurrentUser,
    Json(update): Json<SessionUpsert>,
) -> Result<Json<SessionResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    validate_session(&mut conn, &update, current_user.id).await?;

    let mut repo = Sessions::new(&mut conn);
    let session = repo
        .update(
            (session_id, current_user.id),
            &SessionUpdateDBRequest {
                tag_id: update.tag_id,
                title: update.title,
                notes: update.notes,
                started_at: update.started_at,
                duration_minutes: update.duration_minutes,
                resources: to_links(update.resources),
            },
        )
        .await
        .map_err(|e| match e {
            crate::db::errors::DbError::NotFound => Error::not_found("Session"),
            other => Error::Database(other),
        })?;

    Ok(Json(SessionResponse::from(session)))
}

#[utoipa::path(
    delete,
    path = "/sessions/{session_id}",
    tag = "sessions",
    summary = "Delete session",
    responses(
        (status = 204, description = "Session deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found"),
    ),
    params(("session_id" = uuid::Uuid, Path, description = "Session ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Sessions::new(&mut conn);

    if repo.delete((session_id, current_user.id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Session"))
    }
}

fn to_links(refs: Vec<crate::api::models::sessions::SessionResourceRef>) -> Vec<SessionResourceLink> {
    refs.into_iter()
        .map(|r| SessionResourceLink {
            resource_id: r.resource_id,
            label: r.label,
        })
        .collect()
}

/// Field-level validation plus ownership checks for the referenced tag and
/// resources. Referencing a foreign row is reported the same way as a
/// nonexistent one.
async fn validate_session(conn: &mut PgConnection, body: &SessionUpsert, user_id: UserId) -> Result<()> {
    let mut errors = Vec::new();

    if body.title.trim().is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    } else if body.title.len() > 255 {
        errors.push(FieldError::new("title", "Title cannot exceed 255 characters"));
    }
    if let Some(notes) = &body.notes
        && notes.trim().is_empty()
    {
        errors.push(FieldError::new("notes", "Notes cannot be empty"));
    }
    if body.started_at > Utc::now() {
        errors.push(FieldError::new("started_at", "Starting time cannot be set in the future"));
    }
    if body.duration_minutes < 0 {
        errors.push(FieldError::new("duration_minutes", "Duration minutes must be a positive integer"));
    }

    let mut tags = Tags::new(&mut *conn);
    if tags.get_by_id((body.tag_id, user_id)).await?.is_none() {
        errors.push(FieldError::new("tag_id", "Tag not found"));
    }

    let mut resources = Resources::new(&mut *conn);
    for reference in &body.resources {
        if resources.get_by_id((reference.resource_id, user_id)).await?.is_none() {
            errors.push(FieldError::new("resources", "Resource not found"));
            break;
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(Error::Validation { errors }) }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{authed, create_test_app, register_user};
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::PgPool;

    async fn create_tag(server: &TestServer, token: &str, content: &str) -> String {
        let response = authed(server.post("/api/v1/tags"), token)
            .json(&json!({"content": content, "color": "#abcdef"}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<serde_json::Value>()["id"].as_str().unwrap().to_string()
    }

    async fn create_resource(server: &TestServer, token: &str, title: &str) -> String {
        let response = authed(server.post("/api/v1/resources"), token)
            .json(&json!({"title": title, "resource_type": "url", "content": "https://example.com"}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<serde_json::Value>()["id"].as_str().unwrap().to_string()
    }

    fn session_body(tag_id: &str, resources: serde_json::Value) -> serde_json::Value {
        json!({
            "tag_id": tag_id,
            "title": "Morning revision",
            "notes": "chapters 3-4",
            "started_at": (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339(),
            "duration_minutes": 90,
            "resources": resources
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_session_create_returns_hydrated_session(pool: PgPool) {
        let server = create_test_app(pool).await;
        let user = register_user(&server, "sessuser", "sessuser@example.com", "a-long-password").await;
        let token = user["access_token"].as_str().unwrap();

        let tag_id = create_tag(&server, token, "revision").await;
        let resource_id = create_resource(&server, token, "Lecture slides").await;

        let response = authed(server.post("/api/v1/sessions"), token)
            .json(&session_body(
                &tag_id,
                json!([{"resource_id": resource_id, "label": "week 3"}]),
            ))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let session: serde_json::Value = response.json();
        assert_eq!(session["tag"]["content"], "revision");
        assert_eq!(session["resources"][0]["label"], "week 3");

        // The dedicated resources endpoint sees the same link
        let session_id = session["id"].as_str().unwrap();
        let linked = authed(server.get(&format!("/api/v1/sessions/{session_id}/resources")), token).await;
        linked.assert_status_ok();
        assert_eq!(linked.json::<serde_json::Value>().as_array().unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_session_rejects_future_start_and_foreign_refs(pool: PgPool) {
        let server = create_test_app(pool).await;
        let user = register_user(&server, "sessval", "sessval@example.com", "a-long-password").await;
        let other = register_user(&server, "sessother", "sessother@example.com", "a-long-password").await;
        let token = user["access_token"].as_str().unwrap();
        let other_token = other["access_token"].as_str().unwrap();

        let tag_id = create_tag(&server, token, "own-tag").await;
        let foreign_resource = create_resource(&server, other_token, "Foreign resource").await;

        // Future start time
        let mut body = session_body(&tag_id, json!([]));
        body["started_at"] = json!((chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339());
        let response = authed(server.post("/api/v1/sessions"), token).json(&body).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);

        // Resource owned by someone else is invisible
        let response = authed(server.post("/api/v1/sessions"), token)
            .json(&session_body(&tag_id, json!([{"resource_id": foreign_resource}])))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let errors: serde_json::Value = response.json();
        assert_eq!(errors["errors"][0]["field"], "resources");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_replace_with_empty_resource_list_clears_links(pool: PgPool) {
        let server = create_test_app(pool).await;
        let user = register_user(&server, "sessclear", "sessclear@example.com", "a-long-password").await;
        let token = user["access_token"].as_str().unwrap();

        let tag_id = create_tag(&server, token, "clearing").await;
        let resource_id = create_resource(&server, token, "Doomed link").await;

        let created = authed(server.post("/api/v1/sessions"), token)
            .json(&session_body(&tag_id, json!([{"resource_id": resource_id}])))
            .await;
        let session: serde_json::Value = created.json();
        let session_id = session["id"].as_str().unwrap();
        assert_eq!(session["resources"].as_array().unwrap().len(), 1);

        let replaced = authed(server.put(&format!("/api/v1/sessions/{session_id}")), token)
            .json(&session_body(&tag_id, json!([])))
            .await;
        replaced.assert_status_ok();
        let replaced: serde_json::Value = replaced.json();
        assert_eq!(replaced["resources"].as_array().unwrap().len(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_foreign_session_is_404(pool: PgPool) {
        let server = create_test_app(pool).await;
        let owner = register_user(&server, "sowner", "sowner@example.com", "a-long-password").await;
        let intruder = register_user(&server, "sintruder", "sintruder@example.com", "a-long-password").await;
        let token = owner["access_token"].as_str().unwrap();

        let tag_id = create_tag(&server, token, "private").await;
        let created = authed(server.post("/api/v1/sessions"), token)
            .json(&session_body(&tag_id, json!([])))
            .await;
        let session: serde_json::Value = created.json();
        let session_id = session["id"].as_str().unwrap();

        let intruder_token = intruder["access_token"].as_str().unwrap();
        let get = authed(server.get(&format!("/api/v1/sessions/{session_id}")), intruder_token).await;
        get.assert_status(axum::http::StatusCode::NOT_FOUND);

        let delete = authed(server.delete(&format!("/api/v1/sessions/{session_id}")), intruder_token).await;
        delete.assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_sessions_range_and_pagination(pool: PgPool) {
        let server = create_test_app(pool).await;
        let user = register_user(&server, "sesslist", "sesslist@example.com", "a-long-password").await;
        let token = user["access_token"].as_str().unwrap();
        let tag_id = create_tag(&server, token, "listing").await;

        for days_ago in [1_i64, 10, 40] {
            let mut body = session_body(&tag_id, json!([]));
            body["started_at"] = json!((chrono::Utc::now() - chrono::Duration::days(days_ago)).to_rfc3339());
            authed(server.post("/api/v1/sessions"), token)
                .json(&body)
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let recent = authed(server.get("/api/v1/sessions"), token)
            .add_query_param("from", (chrono::Utc::now() - chrono::Duration::days(14)).to_rfc3339())
            .await;
        recent.assert_status_ok();
        assert_eq!(recent.json::<serde_json::Value>().as_array().unwrap().len(), 2);

        let limited = authed(server.get("/api/v1/sessions"), token).add_query_param("limit", "1").await;
        assert_eq!(limited.json::<serde_json::Value>().as_array().unwrap().len(), 1);
    }
}
