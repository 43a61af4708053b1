use crate::api::models::resources::{ListResourcesQuery, ResourceResponse, ResourceUpsert};
use crate::api::models::users::CurrentUser;
use crate::db::handlers::{Repository, Resources, resources::ResourceFilter};
use crate::db::models::resources::{ResourceCreateDBRequest, ResourceUpdateDBRequest};
use crate::errors::{Error, FieldError, Result};
use crate::types::ResourceId;
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/resources",
    tag = "resources",
    summary = "List resources",
    responses(
        (status = 200, description = "The user's resources", body = Vec<ResourceResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    params(ListResourcesQuery),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ListResourcesQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<ResourceResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Resources::new(&mut conn);

    let resources = repo
        .list(&ResourceFilter {
            user_id: current_user.id,
            search: query.q,
        })
        .await?;

    Ok(Json(resources.into_iter().map(ResourceResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/resources/{resource_id}",
    tag = "resources",
    summary = "Get resource",
    responses(
        (status = 200, description = "Resource details", body = ResourceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Resource not found"),
    ),
    params(("resource_id" = uuid::Uuid, Path, description = "Resource ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<ResourceId>,
    current_user: CurrentUser,
) -> Result<Json<ResourceResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Resources::new(&mut conn);

    match repo.get_by_id((resource_id, current_user.id)).await? {
        Some(resource) => Ok(Json(ResourceResponse::from(resource))),
        None => Err(Error::not_found("Resource")),
    }
}

#[utoipa::path(
    post,
    path = "/resources",
    tag = "resources",
    summary = "Create resource",
    request_body = ResourceUpsert,
    responses(
        (status = 201, description = "Resource created", body = ResourceResponse),
        (status = 400, description = "Invalid request or duplicate title"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_resource(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<ResourceUpsert>,
) -> Result<(StatusCode, Json<ResourceResponse>)> {
    validate_resource(&create)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Resources::new(&mut conn);

    // Titles are unique per user; answer with a field error, not a conflict
    if repo.get_by_title(&create.title, current_user.id).await?.is_some() {
        return Err(Error::validation("title", "Title already in use"));
    }

    let resource = repo
        .create(&ResourceCreateDBRequest {
            user_id: current_user.id,
            title: create.title,
            resource_type: create.resource_type,
            content: create.content,
        })
        .await
        .map_err(|e| {
            if e.is_unique_on("study_resources_user_id_title_key") {
                Error::validation("title", "Title already in use")
            } else {
                Error::Database(e)
            }
        })?;

    Ok((StatusCode::CREATED, Json(ResourceResponse::from(resource))))
}

#[utoipa::path(
    put,
    path = "/resources/{resource_id}",
    tag = "resources",
    summary = "Replace resource",
    request_body = ResourceUpsert,
    responses(
        (status = 200, description = "Resource replaced", body = ResourceResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Resource not found"),
    ),
    params(("resource_id" = uuid::Uuid, Path, description = "Resource ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<ResourceId>,
    current_user: CurrentUser,
    Json(update): Json<ResourceUpsert>,
) -> Result<Json<ResourceResponse>> {
    validate_resource(&update)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Resources::new(&mut conn);

    let resource = repo
        .update(
            (resource_id, current_user.id),
            &ResourceUpdateDBRequest {
                title: update.title,
                resource_type: update.resource_type,
                content: update.content,
            },
        )
        .await
        .map_err(|e| match e {
            crate::db::errors::DbError::NotFound => Error::not_found("Resource"),
            e if e.is_unique_on("study_resources_user_id_title_key") => Error::validation("title", "Title already in use"),
            other => Error::Database(other),
        })?;

    Ok(Json(ResourceResponse::from(resource)))
}

#[utoipa::path(
    delete,
    path = "/resources/{resource_id}",
    tag = "resources",
    summary = "Delete resource",
    responses(
        (status = 204, description = "Resource deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Resource not found"),
    ),
    params(("resource_id" = uuid::Uuid, Path, description = "Resource ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<ResourceId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Resources::new(&mut conn);

    if repo.delete((resource_id, current_user.id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Resource"))
    }
}

fn validate_resource(body: &ResourceUpsert) -> Result<()> {
    let mut errors = Vec::new();
    if body.title.trim().is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    } else if body.title.len() > 255 {
        errors.push(FieldError::new("title", "Title cannot exceed 255 characters"));
    }
    if let Some(content) = &body.content {
        if content.trim().is_empty() {
            errors.push(FieldError::new("content", "Content cannot be empty"));
        } else if content.len() > 255 {
            errors.push(FieldError::new("content", "Content cannot exceed 255 characters"));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(Error::Validation { errors }) }
}
