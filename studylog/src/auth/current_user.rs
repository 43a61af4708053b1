//! Extraction of the authenticated user from a request.

use crate::{
    api::models::users::CurrentUser,
    auth::tokens,
    errors::{Error, Result},
    AppState,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

/// Extract the bearer token from the Authorization header if present.
/// Returns:
/// - None: no Authorization header, or not a Bearer token
/// - Some(Ok(token)): a bearer token was supplied
/// - Some(Err(error)): the header was present but unreadable
fn bearer_token(parts: &Parts) -> Option<Result<&str>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    auth_str.strip_prefix("Bearer ").map(Ok)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = match bearer_token(parts) {
            Some(Ok(token)) => token,
            Some(Err(e)) => return Err(e),
            None => {
                trace!("No bearer token supplied");
                return Err(Error::Unauthenticated { message: None });
            }
        };

        // Expired and invalid tokens both map to 401; the client is expected
        // to run its one refresh attempt and retry.
        tokens::verify_access_token(token, &state.config).map_err(|e| match e {
            Error::Unauthenticated { .. } => Error::Unauthenticated {
                message: Some("Access token invalid or expired".to_string()),
            },
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app_state, create_test_config};
    use axum::extract::FromRequestParts as _;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/test");
        if let Some(v) = value {
            builder = builder.header("authorization", v);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[sqlx::test]
    async fn test_valid_token_extracts_user(pool: PgPool) {
        let config = create_test_config();
        let user = CurrentUser {
            id: Uuid::new_v4(),
            username: "extractme".to_string(),
        };
        let token = tokens::create_access_token(&user, &config).unwrap();
        let state = create_test_app_state(pool, config);

        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));
        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted.id, user.id);
        assert_eq!(extracted.username, "extractme");
    }

    #[sqlx::test]
    async fn test_missing_header_is_unauthorized(pool: PgPool) {
        let state = create_test_app_state(pool, create_test_config());
        let mut parts = parts_with_header(None);

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_refresh_token_is_rejected_as_access_token(pool: PgPool) {
        let config = create_test_config();
        let user = CurrentUser {
            id: Uuid::new_v4(),
            username: "wrongkind".to_string(),
        };
        let refresh = tokens::create_refresh_token(&user, &config).unwrap();
        let state = create_test_app_state(pool, config);

        let mut parts = parts_with_header(Some(&format!("Bearer {refresh}")));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_non_bearer_scheme_is_unauthorized(pool: PgPool) {
        let state = create_test_app_state(pool, create_test_config());
        let mut parts = parts_with_header(Some("Basic dXNlcjpwYXNz"));

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
