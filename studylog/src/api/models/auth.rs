//! API models for authentication payloads.
//!
//! The login/register/refresh responses carry a Set-Cookie header alongside
//! their JSON body, so they get dedicated wrapper types with `IntoResponse`
//! implementations instead of plain `Json<T>` returns.

use crate::types::UserId;
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub username: String,
    pub access_token: String,
}

/// Body returned by the refresh endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Register response: 201 + auth body + refresh cookie.
pub struct RegisterResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::CREATED, Json(self.auth_response)).into_response();
        if let Ok(value) = self.cookie.parse() {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        response
    }
}

/// Login response: 200 + auth body + refresh cookie.
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(self.auth_response)).into_response();
        if let Ok(value) = self.cookie.parse() {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        response
    }
}

/// Refresh response: 200 + new access token + rotated refresh cookie.
pub struct RefreshTokenResponse {
    pub refresh_response: RefreshResponse,
    pub cookie: String,
}

impl IntoResponse for RefreshTokenResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, Json(self.refresh_response)).into_response();
        if let Ok(value) = self.cookie.parse() {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        response
    }
}

/// Logout response: 204 + expired refresh cookie.
pub struct LogoutResponse {
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        let mut response = StatusCode::NO_CONTENT.into_response();
        if let Ok(value) = self.cookie.parse() {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        response
    }
}
