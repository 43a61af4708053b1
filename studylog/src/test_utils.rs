//! Test utilities for integration testing (available with `test-utils` feature).

use axum_test::{TestRequest, TestServer, TestServerConfig};
use serde_json::json;
use sqlx::PgPool;

use crate::{AppState, Application, config::Config};

/// A config with test secrets, relaxed cookie flags, and short token expiries.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.auth.security.access_token_secret = "access-secret-for-testing-only".to_string();
    config.auth.security.refresh_token_secret = "refresh-secret-for-testing-only".to_string();
    config.auth.security.access_token_expiry = std::time::Duration::from_secs(300);
    config.auth.security.refresh_token_expiry = std::time::Duration::from_secs(3600);
    // The test client talks plain HTTP
    config.auth.refresh_cookie.cookie_secure = false;
    // Fast hashing; these tests exercise flows, not KDF strength
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config
}

pub fn create_test_app_state(pool: PgPool, config: Config) -> AppState {
    AppState { db: pool, config }
}

/// Build a `TestServer` over the full router, with a cookie jar so the
/// refresh cookie flows work like they do in a browser.
pub async fn create_test_app(pool: PgPool) -> TestServer {
    let app = Application::with_pool(create_test_config(), pool).expect("Failed to create application");

    let server_config = TestServerConfig {
        save_cookies: true,
        ..TestServerConfig::new()
    };
    TestServer::new_with_config(app.router(), server_config).expect("Failed to create test server")
}

/// Register a user through the API and return the response body
/// (`user_id`, `username`, `access_token`).
pub async fn register_user(server: &TestServer, username: &str, email: &str, password: &str) -> serde_json::Value {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "username": username,
            "email": email,
            "password": password,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

/// Attach a bearer access token to a test request.
pub fn authed(request: TestRequest, access_token: &str) -> TestRequest {
    request.add_header("authorization", format!("Bearer {access_token}"))
}
