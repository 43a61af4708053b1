use crate::api::models::tags::{TagResponse, TagUpsert};
use crate::api::models::users::CurrentUser;
use crate::db::handlers::{Repository, Tags, tags::TagFilter};
use crate::db::models::tags::{TagCreateDBRequest, TagUpdateDBRequest};
use crate::errors::{Error, FieldError, Result};
use crate::types::TagId;
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/tags",
    tag = "tags",
    summary = "List tags",
    responses(
        (status = 200, description = "The user's tags", body = Vec<TagResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_tags(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<TagResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Tags::new(&mut conn);

    let tags = repo.list(&TagFilter { user_id: current_user.id }).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/tags",
    tag = "tags",
    summary = "Create tag",
    request_body = TagUpsert,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_tag(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<TagUpsert>,
) -> Result<(StatusCode, Json<TagResponse>)> {
    validate_tag(&create)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Tags::new(&mut conn);

    let tag = repo
        .create(&TagCreateDBRequest {
            user_id: current_user.id,
            content: create.content,
            color: create.color,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TagResponse::from(tag))))
}

#[utoipa::path(
    put,
    path = "/tags/{tag_id}",
    tag = "tags",
    summary = "Replace tag",
    request_body = TagUpsert,
    responses(
        (status = 200, description = "Tag replaced", body = TagResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tag not found"),
    ),
    params(("tag_id" = uuid::Uuid, Path, description = "Tag ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<TagId>,
    current_user: CurrentUser,
    Json(update): Json<TagUpsert>,
) -> Result<Json<TagResponse>> {
    validate_tag(&update)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Tags::new(&mut conn);

    let tag = repo
        .update(
            (tag_id, current_user.id),
            &TagUpdateDBRequest {
                content: update.content,
                color: update.color,
            },
        )
        .await
        .map_err(|e| match e {
            crate::db::errors::DbError::NotFound => Error::not_found("Tag"),
            other => Error::Database(other),
        })?;

    Ok(Json(TagResponse::from(tag)))
}

#[utoipa::path(
    delete,
    path = "/tags/{tag_id}",
    tag = "tags",
    summary = "Delete tag",
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Tag not found"),
    ),
    params(("tag_id" = uuid::Uuid, Path, description = "Tag ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_tag(State(state): State<AppState>, Path(tag_id): Path<TagId>, current_user: CurrentUser) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Tags::new(&mut conn);

    if repo.delete((tag_id, current_user.id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Tag"))
    }
}

fn validate_tag(body: &TagUpsert) -> Result<()> {
    let mut errors = Vec::new();
    if body.content.trim().is_empty() {
        errors.push(FieldError::new("content", "Content is required"));
    } else if body.content.len() > 50 {
        errors.push(FieldError::new("content", "Content cannot exceed 50 characters"));
    }
    if body.color.trim().is_empty() {
        errors.push(FieldError::new("color", "Color is required"));
    } else if body.color.len() > 7 {
        errors.push(FieldError::new("color", "Color must be a hex value like #aabbcc"));
    }

    if errors.is_empty() { Ok(()) } else { Err(Error::Validation { errors }) }
}
