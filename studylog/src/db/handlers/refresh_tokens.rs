//! Database repository for stored refresh tokens.
//!
//! Each user has at most one active refresh token. Login and refresh upsert
//! the row; logout and reuse detection delete it.

use crate::db::{errors::Result, models::refresh_tokens::RefreshTokenDBResponse};
use crate::types::{UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct RefreshTokens<'c> {
    db: &'c mut PgConnection,
}

impl<'c> RefreshTokens<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Store the user's refresh token, replacing any previous one.
    #[instrument(skip(self, token), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn upsert(&mut self, user_id: UserId, token: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token, issued_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE SET token = $2, issued_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(&mut *self.db)
        .await?;

        Ok(())
    }

    /// Fetch the stored token for a user, if any.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_for_user(&mut self, user_id: UserId) -> Result<Option<RefreshTokenDBResponse>> {
        let token = sqlx::query_as::<_, RefreshTokenDBResponse>(
            "SELECT user_id, token, issued_at FROM refresh_tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(token)
    }

    /// Remove the stored token for a user. Returns whether a row was deleted.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn delete_for_user(&mut self, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
