//! Database repository for study resources.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::resources::{ResourceCreateDBRequest, ResourceDBResponse, ResourceUpdateDBRequest},
};
use crate::types::{ResourceId, SessionId, UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing a user's resources with an optional search query.
///
/// The query matches title or content case-insensitively, mirroring the
/// suggestion-box search on the resource list endpoint.
#[derive(Debug, Clone)]
pub struct ResourceFilter {
    pub user_id: UserId,
    pub search: Option<String>,
}

pub struct Resources<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Resources<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, title), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_title(&mut self, title: &str, user_id: UserId) -> Result<Option<ResourceDBResponse>> {
        let resource = sqlx::query_as::<_, ResourceDBResponse>(
            "SELECT id, user_id, title, resource_type, content FROM study_resources WHERE title = $1 AND user_id = $2",
        )
        .bind(title)
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(resource)
    }

    /// Resources linked to a session, without labels.
    #[instrument(skip(self), fields(session_id = %abbrev_uuid(&session_id)), err)]
    pub async fn list_for_session(&mut self, session_id: SessionId, user_id: UserId) -> Result<Vec<ResourceDBResponse>> {
        let resources = sqlx::query_as::<_, ResourceDBResponse>(
            r#"
            SELECT r.id, r.user_id, r.title, r.resource_type, r.content
            FROM study_resources r
            INNER JOIN study_session_resources sr ON sr.resource_id = r.id
            INNER JOIN study_sessions s ON s.id = sr.session_id
            WHERE sr.session_id = $1 AND s.user_id = $2
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(resources)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Resources<'c> {
    type CreateRequest = ResourceCreateDBRequest;
    type UpdateRequest = ResourceUpdateDBRequest;
    type Response = ResourceDBResponse;
    type Id = (ResourceId, UserId);
    type Filter = ResourceFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let resource = sqlx::query_as::<_, ResourceDBResponse>(
            r#"
            INSERT INTO study_resources (user_id, title, resource_type, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, resource_type, content
            "#,
        )
        .bind(request.user_id)
        .bind(&request.title)
        .bind(request.resource_type)
        .bind(&request.content)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(resource)
    }

    #[instrument(skip_all, fields(resource_id = %abbrev_uuid(&id.0)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let (id, user_id) = id;
        let resource = sqlx::query_as::<_, ResourceDBResponse>(
            "SELECT id, user_id, title, resource_type, content FROM study_resources WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(resource)
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let pattern = format!("%{}%", filter.search.as_deref().unwrap_or(""));
        let resources = sqlx::query_as::<_, ResourceDBResponse>(
            r#"
            SELECT id, user_id, title, resource_type, content
            FROM study_resources
            WHERE user_id = $1 AND (title ILIKE $2 OR content ILIKE $2)
            ORDER BY title
            "#,
        )
        .bind(filter.user_id)
        .bind(&pattern)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(resources)
    }

    #[instrument(skip_all, fields(resource_id = %abbrev_uuid(&id.0)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (id, user_id) = id;
        let resource = sqlx::query_as::<_, ResourceDBResponse>(
            r#"
            UPDATE study_resources SET title = $3, resource_type = $4, content = $5
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, resource_type, content
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&request.title)
        .bind(request.resource_type)
        .bind(&request.content)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(crate::db::errors::DbError::NotFound)?;

        Ok(resource)
    }

    #[instrument(skip_all, fields(resource_id = %abbrev_uuid(&id.0)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let (id, user_id) = id;
        let result = sqlx::query("DELETE FROM study_resources WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
