//! Database repository for tags.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::tags::{TagCreateDBRequest, TagDBResponse, TagUpdateDBRequest},
};
use crate::types::{TagId, UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing a user's tags
#[derive(Debug, Clone)]
pub struct TagFilter {
    pub user_id: UserId,
}

pub struct Tags<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Tags<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Tags<'c> {
    type CreateRequest = TagCreateDBRequest;
    type UpdateRequest = TagUpdateDBRequest;
    type Response = TagDBResponse;
    type Id = (TagId, UserId);
    type Filter = TagFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let tag = sqlx::query_as::<_, TagDBResponse>(
            r#"
            INSERT INTO tags (user_id, content, color)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, content, color
            "#,
        )
        .bind(request.user_id)
        .bind(&request.content)
        .bind(&request.color)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(tag)
    }

    #[instrument(skip_all, fields(tag_id = %abbrev_uuid(&id.0)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let (id, user_id) = id;
        let tag = sqlx::query_as::<_, TagDBResponse>(
            "SELECT id, user_id, content, color FROM tags WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(tag)
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let tags = sqlx::query_as::<_, TagDBResponse>(
            "SELECT id, user_id, content, color FROM tags WHERE user_id = $1 ORDER BY content",
        )
        .bind(filter.user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(tags)
    }

    #[instrument(skip_all, fields(tag_id = %abbrev_uuid(&id.0)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (id, user_id) = id;
        let tag = sqlx::query_as::<_, TagDBResponse>(
            r#"
            UPDATE tags SET content = $3, color = $4
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, content, color
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&request.content)
        .bind(&request.color)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(crate::db::errors::DbError::NotFound)?;

        Ok(tag)
    }

    #[instrument(skip_all, fields(tag_id = %abbrev_uuid(&id.0)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let (id, user_id) = id;
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Users;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::PgPool;

    async fn create_user(pool: &PgPool, name: &str) -> UserId {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        users
            .create(&UserCreateDBRequest {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: "$argon2id$fake$hash".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_tag_crud(pool: PgPool) {
        let user_id = create_user(&pool, "taguser").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Tags::new(&mut conn);

        let tag = repo
            .create(&TagCreateDBRequest {
                user_id,
                content: "maths".to_string(),
                color: "#ff0000".to_string(),
            })
            .await
            .unwrap();

        let fetched = repo.get_by_id((tag.id, user_id)).await.unwrap().unwrap();
        assert_eq!(fetched.content, "maths");

        let updated = repo
            .update(
                (tag.id, user_id),
                &TagUpdateDBRequest {
                    content: "physics".to_string(),
                    color: "#00ff00".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content, "physics");
        assert_eq!(updated.color, "#00ff00");

        assert!(repo.delete((tag.id, user_id)).await.unwrap());
        assert!(repo.get_by_id((tag.id, user_id)).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_tags_are_owner_scoped(pool: PgPool) {
        let owner = create_user(&pool, "tagowner").await;
        let other = create_user(&pool, "tagother").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Tags::new(&mut conn);

        let tag = repo
            .create(&TagCreateDBRequest {
                user_id: owner,
                content: "history".to_string(),
                color: "#0000ff".to_string(),
            })
            .await
            .unwrap();

        // Another user cannot see, update, or delete the tag
        assert!(repo.get_by_id((tag.id, other)).await.unwrap().is_none());
        assert!(
            repo.update(
                (tag.id, other),
                &TagUpdateDBRequest {
                    content: "stolen".to_string(),
                    color: "#000000".to_string(),
                },
            )
            .await
            .is_err()
        );
        assert!(!repo.delete((tag.id, other)).await.unwrap());
        assert!(repo.list(&TagFilter { user_id: other }).await.unwrap().is_empty());

        // The owner still sees the original content
        let fetched = repo.get_by_id((tag.id, owner)).await.unwrap().unwrap();
        assert_eq!(fetched.content, "history");
    }
}
