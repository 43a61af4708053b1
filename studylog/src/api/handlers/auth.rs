use axum::{extract::State, http::HeaderMap};

use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, LoginRequest, LoginResponse, LogoutResponse, RefreshResponse, RefreshTokenResponse, RegisterRequest, RegisterResponse},
        users::CurrentUser,
    },
    auth::{cookie_value, password, tokens},
    db::{
        errors::DbError,
        handlers::{RefreshTokens, Users},
        models::users::UserCreateDBRequest,
    },
    errors::{Error, FieldError, Result},
};

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "auth",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input or duplicate email/username"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, axum::Json(request): axum::Json<RegisterRequest>) -> Result<RegisterResponse> {
    validate_register(&request, &state)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);

    // Duplicate checks answer with the offending field, matching the
    // validation error shape rather than a bare conflict
    let mut errors = Vec::new();
    if user_repo.get_by_email(&request.email).await?.is_some() {
        errors.push(FieldError::new("email", "Email already in use"));
    }
    if user_repo.get_by_username(&request.username).await?.is_some() {
        errors.push(FieldError::new("username", "Username already in use"));
    }
    if !errors.is_empty() {
        return Err(Error::Validation { errors });
    }

    // Hash the password on a blocking thread to avoid blocking the async runtime
    let password = request.password.clone();
    let params = state.config.argon2_params();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let created = user_repo
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            password_hash,
        })
        .await
        .map_err(map_user_unique_violation)?;

    let current_user = CurrentUser {
        id: created.id,
        username: created.username.clone(),
    };
    let access_token = tokens::create_access_token(&current_user, &state.config)?;
    let refresh_token = tokens::create_refresh_token(&current_user, &state.config)?;

    let mut token_repo = RefreshTokens::new(&mut tx);
    token_repo.upsert(created.id, &refresh_token).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(RegisterResponse {
        auth_response: AuthResponse {
            user_id: created.id,
            username: created.username,
            access_token,
        },
        cookie: refresh_cookie(&refresh_token, &state.config),
    })
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, axum::Json(request): axum::Json<LoginRequest>) -> Result<LoginResponse> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Same 401 for unknown email and wrong password - no user enumeration
    let invalid = || Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    };

    let user = user_repo.get_by_email(&request.email).await?.ok_or_else(invalid)?;

    // Verify the password on a blocking thread
    let password = request.password.clone();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
        .unwrap_or(false);

    if !is_valid {
        return Err(invalid());
    }

    let current_user = CurrentUser {
        id: user.id,
        username: user.username.clone(),
    };
    let access_token = tokens::create_access_token(&current_user, &state.config)?;
    let refresh_token = tokens::create_refresh_token(&current_user, &state.config)?;

    // Logging in replaces any previously stored refresh token, signing out
    // other sessions
    let mut token_repo = RefreshTokens::new(&mut conn);
    token_repo.upsert(user.id, &refresh_token).await?;

    Ok(LoginResponse {
        auth_response: AuthResponse {
            user_id: user.id,
            username: user.username,
            access_token,
        },
        cookie: refresh_cookie(&refresh_token, &state.config),
    })
}

/// Exchange the refresh cookie for a fresh access token
#[utoipa::path(
    get,
    path = "/auth/refresh-token",
    tag = "auth",
    responses(
        (status = 200, description = "New token pair issued", body = RefreshResponse),
        (status = 401, description = "Missing, invalid, expired, or already-rotated refresh token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh_token(State(state): State<AppState>, headers: HeaderMap) -> Result<RefreshTokenResponse> {
    let cookie_name = state.config.auth.refresh_cookie.cookie_name.clone();
    let presented = cookie_value(&headers, &cookie_name)
        .ok_or(Error::Unauthenticated { message: None })?
        .to_string();

    // An unverifiable token tells us nothing we can act on
    let claims_user = tokens::verify_refresh_token(&presented, &state.config).map_err(|e| match e {
        Error::Unauthenticated { .. } => Error::Unauthenticated { message: None },
        other => other,
    })?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let user = {
        let mut user_repo = Users::new(&mut tx);
        user_repo.get_by_id(claims_user.id).await?
    };

    let mut token_repo = RefreshTokens::new(&mut tx);

    let Some(user) = user else {
        // The signed token outlived its user; drop whatever is stored so the
        // token cannot be replayed against a recreated account
        token_repo.delete_for_user(claims_user.id).await?;
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        return Err(Error::Unauthenticated { message: None });
    };

    let stored = token_repo.get_for_user(user.id).await?;
    let matches = stored.as_ref().is_some_and(|s| s.token == presented);
    if !matches {
        // Rotation defense: a verified token that is not the stored one has
        // been superseded - treat it as reuse and revoke the session
        token_repo.delete_for_user(user.id).await?;
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        tracing::warn!(user_id = %user.id, "refresh token reuse detected, revoking session");
        return Err(Error::Unauthenticated { message: None });
    }

    let current_user = CurrentUser {
        id: user.id,
        username: user.username,
    };
    let access_token = tokens::create_access_token(&current_user, &state.config)?;
    let new_refresh_token = tokens::create_refresh_token(&current_user, &state.config)?;
    token_repo.upsert(user.id, &new_refresh_token).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(RefreshTokenResponse {
        refresh_response: RefreshResponse { access_token },
        cookie: refresh_cookie(&new_refresh_token, &state.config),
    })
}

/// Logout: revoke the stored refresh token
#[utoipa::path(
    get,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, current_user: CurrentUser) -> Result<LogoutResponse> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut token_repo = RefreshTokens::new(&mut conn);
    token_repo.delete_for_user(current_user.id).await?;

    Ok(LogoutResponse {
        cookie: clear_refresh_cookie(&state.config),
    })
}

fn validate_register(request: &RegisterRequest, state: &AppState) -> Result<()> {
    let mut errors = Vec::new();

    if request.username.trim().is_empty() {
        errors.push(FieldError::new("username", "Username cannot be empty"));
    } else if request.username.len() > 100 {
        errors.push(FieldError::new("username", "Username cannot exceed 100 characters"));
    }

    if request.email.len() > 255 {
        errors.push(FieldError::new("email", "Email cannot exceed 255 characters"));
    } else if !is_plausible_email(&request.email) {
        errors.push(FieldError::new("email", "Invalid email address"));
    }

    let password_config = &state.config.auth.password;
    if request.password.len() < password_config.min_length {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {} characters", password_config.min_length),
        ));
    } else if request.password.len() > password_config.max_length {
        errors.push(FieldError::new(
            "password",
            format!("Password cannot exceed {} characters", password_config.max_length),
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(Error::Validation { errors }) }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// The unique constraints back up the explicit duplicate checks; if the race
/// is lost, answer with the same 400 validation shape.
fn map_user_unique_violation(err: DbError) -> Error {
    if err.is_unique_on("users_email_key") {
        Error::validation("email", "Email already in use")
    } else if err.is_unique_on("users_username_key") {
        Error::validation("username", "Username already in use")
    } else {
        Error::Database(err)
    }
}

/// Build the refresh token cookie, path-scoped to the refresh endpoint.
fn refresh_cookie(token: &str, config: &crate::config::Config) -> String {
    let cookie = &config.auth.refresh_cookie;
    let max_age = config.auth.security.refresh_token_expiry.as_secs();
    let secure = if cookie.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}={}; Path={}; HttpOnly{}; SameSite={}; Max-Age={}",
        cookie.cookie_name, token, cookie.cookie_path, secure, cookie.cookie_same_site, max_age
    )
}

/// Expired cookie that clears the refresh token on the client.
fn clear_refresh_cookie(config: &crate::config::Config) -> String {
    let cookie = &config.auth.refresh_cookie;
    let secure = if cookie.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}=; Path={}; HttpOnly{}; SameSite={}; Max-Age=0",
        cookie.cookie_name, cookie.cookie_path, secure, cookie.cookie_same_site
    )
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, register_user};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_sets_cookie_and_returns_token(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/auth/register")
            .json(&json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "correct-horse-battery"
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let cookie = response.headers().get("set-cookie").expect("refresh cookie").to_str().unwrap();
        assert!(cookie.starts_with("refreshToken="));
        assert!(cookie.contains("Path=/auth/refresh-token"));
        assert!(cookie.contains("HttpOnly"));

        let body: serde_json::Value = response.json();
        assert_eq!(body["username"], "alice");
        assert!(body["access_token"].as_str().unwrap().contains('.'));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_duplicate_email_names_the_field(pool: PgPool) {
        let server = create_test_app(pool).await;
        register_user(&server, "bob", "bob@example.com", "a-long-password").await;

        let response = server
            .post("/auth/register")
            .json(&json!({
                "username": "bob2",
                "email": "bob@example.com",
                "password": "a-long-password"
            }))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["errors"][0]["field"], "email");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_duplicate_username_names_the_field(pool: PgPool) {
        let server = create_test_app(pool).await;
        register_user(&server, "carol", "carol@example.com", "a-long-password").await;

        let response = server
            .post("/auth/register")
            .json(&json!({
                "username": "carol",
                "email": "carol2@example.com",
                "password": "a-long-password"
            }))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["errors"][0]["field"], "username");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_rejects_bad_input(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/auth/register")
            .json(&json!({
                "username": "",
                "email": "not-an-email",
                "password": "short"
            }))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"username"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_wrong_password_is_401(pool: PgPool) {
        let server = create_test_app(pool).await;
        register_user(&server, "dave", "dave@example.com", "the-right-password").await;

        let response = server
            .post("/auth/login")
            .json(&json!({"email": "dave@example.com", "password": "the-wrong-password"}))
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

        // Unknown email gets the identical status
        let response = server
            .post("/auth/login")
            .json(&json!({"email": "nobody@example.com", "password": "whatever-password"}))
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_success_rotates_stored_token(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let registered = register_user(&server, "erin", "erin@example.com", "a-long-password").await;

        let response = server
            .post("/auth/login")
            .json(&json!({"email": "erin@example.com", "password": "a-long-password"}))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["user_id"], registered["user_id"]);

        // The stored refresh token now belongs to the login session, so the
        // registration cookie is dead (single active session per user)
        let user_id: uuid::Uuid = serde_json::from_value(registered["user_id"].clone()).unwrap();
        let stored: Option<String> = sqlx::query_scalar("SELECT token FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await
            .unwrap();
        let login_cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(login_cookie.contains(&stored.unwrap()));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_refresh_flow_rotates_and_detects_reuse(pool: PgPool) {
        let mut server = create_test_app(pool.clone()).await;
        let registered = register_user(&server, "frank", "frank@example.com", "a-long-password").await;
        let user_id: uuid::Uuid = serde_json::from_value(registered["user_id"].clone()).unwrap();

        // TestServer saves cookies across requests; first refresh succeeds
        let first = server.get("/auth/refresh-token").await;
        first.assert_status_ok();
        let first_body: serde_json::Value = first.json();
        assert!(first_body["access_token"].is_string());

        // Second refresh uses the rotated cookie and also succeeds
        let second = server.get("/auth/refresh-token").await;
        second.assert_status_ok();

        // Replaying the first (already-rotated) cookie is reuse: 401 and the
        // stored token is revoked entirely
        let first_cookie = first.headers().get("set-cookie").unwrap().to_str().unwrap();
        let first_token = first_cookie.trim_start_matches("refreshToken=").split(';').next().unwrap().to_string();

        server.clear_cookies();
        let replay = server
            .get("/auth/refresh-token")
            .add_header("cookie", format!("refreshToken={first_token}"))
            .await;
        replay.assert_status(axum::http::StatusCode::UNAUTHORIZED);

        let stored: Option<String> = sqlx::query_scalar("SELECT token FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await
            .unwrap();
        assert!(stored.is_none(), "reuse must revoke the stored token");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_refresh_with_deleted_user_revokes_stored_token(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let registered = register_user(&server, "grace", "grace@example.com", "a-long-password").await;
        let user_id: uuid::Uuid = serde_json::from_value(registered["user_id"].clone()).unwrap();

        sqlx::query("DELETE FROM users WHERE id = $1").bind(user_id).execute(&pool).await.unwrap();

        let response = server.get("/auth/refresh-token").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

        let stored: Option<String> = sqlx::query_scalar("SELECT token FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_refresh_without_cookie_is_401(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server.get("/auth/refresh-token").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_logout_revokes_refresh_token(pool: PgPool) {
        let server = create_test_app(pool).await;
        let registered = register_user(&server, "heidi", "heidi@example.com", "a-long-password").await;
        let access_token = registered["access_token"].as_str().unwrap();

        let response = server
            .get("/auth/logout")
            .add_header("authorization", format!("Bearer {access_token}"))
            .await;
        response.assert_status(axum::http::StatusCode::NO_CONTENT);

        // The refresh cookie is now useless
        let refresh = server.get("/auth/refresh-token").await;
        refresh.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_logout_requires_access_token(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server.get("/auth/logout").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }
}
