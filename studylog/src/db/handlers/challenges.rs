//! Database repository for challenges.
//!
//! A user has at most one challenge; PUT semantics upsert it.

use crate::db::{
    errors::Result,
    models::challenges::{ChallengeDBResponse, ChallengeUpsertDBRequest},
};
use crate::types::{UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Challenges<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Challenges<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn upsert(&mut self, request: &ChallengeUpsertDBRequest) -> Result<ChallengeDBResponse> {
        let challenge = sqlx::query_as::<_, ChallengeDBResponse>(
            r#"
            INSERT INTO challenges (user_id, title, target_value, target_complete_date, challenge_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
                SET title = $2, target_value = $3, target_complete_date = $4, challenge_type = $5
            RETURNING id, user_id, title, created_at, target_value, target_complete_date, challenge_type
            "#,
        )
        .bind(request.user_id)
        .bind(&request.title)
        .bind(request.target_value)
        .bind(request.target_complete_date)
        .bind(request.challenge_type)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(challenge)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_for_user(&mut self, user_id: UserId) -> Result<Option<ChallengeDBResponse>> {
        let challenge = sqlx::query_as::<_, ChallengeDBResponse>(
            r#"
            SELECT id, user_id, title, created_at, target_value, target_complete_date, challenge_type
            FROM challenges WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(challenge)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn delete_for_user(&mut self, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM challenges WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::challenges::ChallengeType;
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
    async fn test_upsert_replaces_existing_challenge(pool: PgPool) {
        let user_id = create_user(&pool, "challuser").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Challenges::new(&mut conn);

        let first = repo
            .upsert(&ChallengeUpsertDBRequest {
                user_id,
                title: "Study 10 hours".to_string(),
                target_value: 600,
                target_complete_date: None,
                challenge_type: ChallengeType::Time,
            })
            .await
            .unwrap();

        let second = repo
            .upsert(&ChallengeUpsertDBRequest {
                user_id,
                title: "Finish 5 quizzes".to_string(),
                target_value: 5,
                target_complete_date: None,
                challenge_type: ChallengeType::NOfTasks,
            })
            .await
            .unwrap();

        // Same row, replaced in place
        assert_eq!(first.id, second.id);
        let stored = repo.get_for_user(user_id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Finish 5 quizzes");
        assert_eq!(stored.challenge_type, ChallengeType::NOfTasks);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_for_user(pool: PgPool) {
        let user_id = create_user(&pool, "challdelete").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Challenges::new(&mut conn);

        assert!(repo.get_for_user(user_id).await.unwrap().is_none());
        repo.upsert(&ChallengeUpsertDBRequest {
            user_id,
            title: "Read every day".to_string(),
            target_value: 30,
            target_complete_date: None,
            challenge_type: ChallengeType::Task,
        })
        .await
        .unwrap();

        assert!(repo.delete_for_user(user_id).await.unwrap());
        assert!(!repo.delete_for_user(user_id).await.unwrap());
    }
}
