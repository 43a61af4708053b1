//! JWT access and refresh token creation and verification.
//!
//! Two token kinds share the same claim shape but are signed with separate
//! secrets and expiries. The access token authenticates API requests; the
//! refresh token only ever travels in its path-scoped cookie and is also
//! persisted server-side for rotation and reuse detection.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{api::models::users::CurrentUser, config::Config, errors::Error, types::UserId};

/// Claims carried by both token kinds
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: UserId,      // Subject (user ID)
    pub username: String, // Username
    pub exp: i64,         // Expiration time
    pub iat: i64,         // Issued at
}

impl From<TokenClaims> for CurrentUser {
    fn from(claims: TokenClaims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
        }
    }
}

fn create_token(user: &CurrentUser, secret: &str, expiry: std::time::Duration) -> Result<String, Error> {
    let now = Utc::now();
    let exp = now + expiry;
    let claims = TokenClaims {
        sub: user.id,
        username: user.username.clone(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

fn verify_token(token: &str, secret: &str) -> Result<CurrentUser, Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<TokenClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors (500) - key issues, internal failures
        _ => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },
    })?;

    Ok(CurrentUser::from(token_data.claims))
}

/// Create a short-lived access token for a user
pub fn create_access_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    let security = &config.auth.security;
    create_token(user, &security.access_token_secret, security.access_token_expiry)
}

/// Create a longer-lived refresh token for a user
pub fn create_refresh_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    let security = &config.auth.security;
    create_token(user, &security.refresh_token_secret, security.refresh_token_expiry)
}

/// Verify and decode an access token
pub fn verify_access_token(token: &str, config: &Config) -> Result<CurrentUser, Error> {
    verify_token(token, &config.auth.security.access_token_secret)
}

/// Verify and decode a refresh token
pub fn verify_refresh_token(token: &str, config: &Config) -> Result<CurrentUser, Error> {
    verify_token(token, &config.auth.security.refresh_token_secret)
}
