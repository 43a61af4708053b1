//! Database models for stored refresh tokens.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The single refresh token stored for a user.
///
/// Replaced wholesale on every login and refresh; its presence (and exact
/// value) is what makes rotation and reuse detection possible.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenDBResponse {
    pub user_id: UserId,
    pub token: String,
    pub issued_at: DateTime<Utc>,
}
