//! Database repository for study sessions.
//!
//! Session writes touch two tables (the session row and its resource links),
//! so create and update run inside a transaction. The original data model
//! replaced the link set wholesale on update rather than diffing it; that
//! behavior is kept, but atomically.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::{
        resources::LinkedResourceDBResponse,
        sessions::{SessionCreateDBRequest, SessionDBResponse, SessionResourceLink, SessionRow, SessionUpdateDBRequest},
    },
};
use crate::types::{SessionId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection};
use tracing::instrument;

/// Filter for listing a user's sessions within a started_at range.
#[derive(Debug, Clone)]
pub struct SessionFilter {
    pub user_id: UserId,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub skip: i64,
    pub limit: i64,
}

pub struct Sessions<'c> {
    db: &'c mut PgConnection,
}

const SESSION_WITH_TAG: &str = r#"
    SELECT s.id, s.user_id, s.tag_id, s.title, s.notes, s.started_at,
           s.duration_minutes, s.created_at,
           t.content AS tag_content, t.color AS tag_color
    FROM study_sessions s
    INNER JOIN tags t ON t.id = s.tag_id
"#;

impl<'c> Sessions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    async fn insert_links(tx: &mut PgConnection, session_id: SessionId, links: &[SessionResourceLink]) -> Result<()> {
        for link in links {
            sqlx::query(
                r#"
                INSERT INTO study_session_resources (session_id, resource_id, label)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(session_id)
            .bind(link.resource_id)
            .bind(&link.label)
            .execute(&mut *tx)
            .await?;
        }
        Ok(())
    }

    /// The linked resources for a session, labels included.
    #[instrument(skip(self), fields(session_id = %abbrev_uuid(&session_id)), err)]
    pub async fn linked_resources(&mut self, session_id: SessionId) -> Result<Vec<LinkedResourceDBResponse>> {
        let resources = sqlx::query_as::<_, LinkedResourceDBResponse>(
            r#"
            SELECT r.id, r.title, r.resource_type, r.content, sr.label
            FROM study_session_resources sr
            INNER JOIN study_resources r ON r.id = sr.resource_id
            WHERE sr.session_id = $1
            ORDER BY r.title
            "#,
        )
        .bind(session_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(resources)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Sessions<'c> {
    type CreateRequest = SessionCreateDBRequest;
    type UpdateRequest = SessionUpdateDBRequest;
    type Response = SessionDBResponse;
    type Id = (SessionId, UserId);
    type Filter = SessionFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let session_id: SessionId = sqlx::query_scalar(
            r#"
            INSERT INTO study_sessions (user_id, tag_id, title, notes, started_at, duration_minutes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(request.user_id)
        .bind(request.tag_id)
        .bind(&request.title)
        .bind(&request.notes)
        .bind(request.started_at)
        .bind(request.duration_minutes)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_links(&mut *tx, session_id, &request.resources).await?;

        tx.commit().await?;

        self.get_by_id((session_id, request.user_id))
            .await?
            .ok_or(DbError::NotFound)
    }

    #[instrument(skip_all, fields(session_id = %abbrev_uuid(&id.0)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let (id, user_id) = id;
        let query = format!("{SESSION_WITH_TAG} WHERE s.id = $1 AND s.user_id = $2");
        let row = sqlx::query_as::<_, SessionRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut session = SessionDBResponse::from(row);
        session.resources = self.linked_resources(id).await?;
        Ok(Some(session))
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id), limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!(
            r#"{SESSION_WITH_TAG}
            WHERE s.user_id = $1
              AND ($2::timestamptz IS NULL OR s.started_at >= $2)
              AND ($3::timestamptz IS NULL OR s.started_at <= $3)
            ORDER BY s.started_at DESC
            LIMIT $4 OFFSET $5
            "#
        );
        let rows = sqlx::query_as::<_, SessionRow>(&query)
            .bind(filter.user_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(rows.into_iter().map(SessionDBResponse::from).collect())
    }

    #[instrument(skip_all, fields(session_id = %abbrev_uuid(&id.0)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (id, user_id) = id;
        {
            let mut tx = self.db.begin().await?;

            let updated = sqlx::query(
                r#"
                UPDATE study_sessions
                SET tag_id = $3, title = $4, notes = $5, started_at = $6, duration_minutes = $7
                WHERE id = $1 AND user_id = $2
                "#,
            )
            .bind(id)
            .bind(user_id)
            .bind(request.tag_id)
            .bind(&request.title)
            .bind(&request.notes)
            .bind(request.started_at)
            .bind(request.duration_minutes)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(DbError::NotFound);
            }

            // Full link-set rewrite; an empty list clears every link.
            sqlx::query("DELETE FROM study_session_resources WHERE session_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Self::insert_links(&mut *tx, id, &request.resources).await?;

            tx.commit().await?;
        }

        self.get_by_id((id, user_id)).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip_all, fields(session_id = %abbrev_uuid(&id.0)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let (id, user_id) = id;
        let result = sqlx::query("DELETE FROM study_sessions WHERE id = $1 AND user_id = $2")
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
    use crate::api::models::resources::ResourceType;
    use crate::db::handlers::{Resources, Tags, Users};
    use crate::db::models::{
        resources::ResourceCreateDBRequest,
        tags::TagCreateDBRequest,
        users::UserCreateDBRequest,
    };
    use crate::types::{ResourceId, TagId};
    use sqlx::PgPool;

    async fn seed_user_and_tag(pool: &PgPool, name: &str) -> (UserId, TagId) {
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        let user_id = users
            .create(&UserCreateDBRequest {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: "$argon2id$fake$hash".to_string(),
            })
            .await
            .unwrap()
            .id;

        let mut tags = Tags::new(&mut conn);
        let tag_id = tags
            .create(&TagCreateDBRequest {
                user_id,
                content: "revision".to_string(),
                color: "#123456".to_string(),
            })
            .await
            .unwrap()
            .id;

        (user_id, tag_id)
    }

    async fn seed_resource(pool: &PgPool, user_id: UserId, title: &str) -> ResourceId {
        let mut conn = pool.acquire().await.unwrap();
        let mut resources = Resources::new(&mut conn);
        resources
            .create(&ResourceCreateDBRequest {
                user_id,
                title: title.to_string(),
                resource_type: ResourceType::Url,
                content: Some("https://example.com".to_string()),
            })
            .await
            .unwrap()
            .id
    }

    fn session_request(user_id: UserId, tag_id: TagId, resources: Vec<SessionResourceLink>) -> SessionCreateDBRequest {
        SessionCreateDBRequest {
            user_id,
            tag_id,
            title: "Morning revision".to_string(),
            notes: Some("chapters 3-4".to_string()),
            started_at: Utc::now() - chrono::Duration::hours(2),
            duration_minutes: 90,
            resources,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_hydrates_tag_and_resources(pool: PgPool) {
        let (user_id, tag_id) = seed_user_and_tag(&pool, "sessuser").await;
        let resource_id = seed_resource(&pool, user_id, "Lecture slides").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        let session = repo
            .create(&session_request(
                user_id,
                tag_id,
                vec![SessionResourceLink {
                    resource_id,
                    label: Some("week 3".to_string()),
                }],
            ))
            .await
            .unwrap();

        assert_eq!(session.tag.id, tag_id);
        assert_eq!(session.tag.content, "revision");
        assert_eq!(session.resources.len(), 1);
        assert_eq!(session.resources[0].label.as_deref(), Some("week 3"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_rolls_back_on_bad_resource(pool: PgPool) {
        let (user_id, tag_id) = seed_user_and_tag(&pool, "rollback").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        // Link references a resource that does not exist; the whole create
        // must fail and leave no orphaned session behind.
        let err = repo
            .create(&session_request(
                user_id,
                tag_id,
                vec![SessionResourceLink {
                    resource_id: uuid::Uuid::new_v4(),
                    label: None,
                }],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }), "got {err:?}");

        let sessions = repo
            .list(&SessionFilter {
                user_id,
                from: None,
                to: None,
                skip: 0,
                limit: 10,
            })
            .await
            .unwrap();
        assert!(sessions.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_rewrites_link_set(pool: PgPool) {
        let (user_id, tag_id) = seed_user_and_tag(&pool, "rewrite").await;
        let first = seed_resource(&pool, user_id, "First").await;
        let second = seed_resource(&pool, user_id, "Second").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        let session = repo
            .create(&session_request(
                user_id,
                tag_id,
                vec![SessionResourceLink {
                    resource_id: first,
                    label: None,
                }],
            ))
            .await
            .unwrap();

        let updated = repo
            .update(
                (session.id, user_id),
                &SessionUpdateDBRequest {
                    tag_id,
                    title: "Evening revision".to_string(),
                    notes: None,
                    started_at: session.started_at,
                    duration_minutes: 45,
                    resources: vec![SessionResourceLink {
                        resource_id: second,
                        label: Some("swapped".to_string()),
                    }],
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Evening revision");
        assert_eq!(updated.resources.len(), 1);
        assert_eq!(updated.resources[0].id, second);

        // Replacing with an empty list removes every link
        let cleared = repo
            .update(
                (session.id, user_id),
                &SessionUpdateDBRequest {
                    tag_id,
                    title: "Evening revision".to_string(),
                    notes: None,
                    started_at: session.started_at,
                    duration_minutes: 45,
                    resources: vec![],
                },
            )
            .await
            .unwrap();
        assert!(cleared.resources.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_range(pool: PgPool) {
        let (user_id, tag_id) = seed_user_and_tag(&pool, "ranges").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        let mut old = session_request(user_id, tag_id, vec![]);
        old.started_at = Utc::now() - chrono::Duration::days(30);
        repo.create(&old).await.unwrap();

        let recent = session_request(user_id, tag_id, vec![]);
        repo.create(&recent).await.unwrap();

        let hits = repo
            .list(&SessionFilter {
                user_id,
                from: Some(Utc::now() - chrono::Duration::days(7)),
                to: None,
                skip: 0,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let all = repo
            .list(&SessionFilter {
                user_id,
                from: None,
                to: None,
                skip: 0,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        // Ordered most recent first
        assert!(all[0].started_at > all[1].started_at);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_sessions_are_owner_scoped(pool: PgPool) {
        let (owner, tag_id) = seed_user_and_tag(&pool, "sessowner").await;
        let (other, _) = seed_user_and_tag(&pool, "sessother").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);
        let session = repo.create(&session_request(owner, tag_id, vec![])).await.unwrap();

        assert!(repo.get_by_id((session.id, other)).await.unwrap().is_none());
        assert!(!repo.delete((session.id, other)).await.unwrap());
        assert!(repo.get_by_id((session.id, owner)).await.unwrap().is_some());
    }
}
