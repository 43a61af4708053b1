//! HTTP client for the studylog API.
//!
//! Wraps reqwest with the token-handling contract the API expects from its
//! frontend: every request carries the current access token as a bearer
//! header, the refresh cookie lives in the client's cookie store, and a 401
//! response triggers exactly one refresh-and-replay before giving up. The
//! single-retry flag is what prevents a dead session from looping forever.

use anyhow::Context;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

use crate::types::UserId;

/// Identity returned by register and login.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    pub user_id: UserId,
    pub username: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
struct RefreshBody {
    access_token: String,
}

/// API client holding the current access token and the refresh cookie.
///
/// Cloning is cheap; clones share the token and cookie store.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            http,
            base_url,
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("join url path: {path}"))
    }

    /// Register a new account; stores the returned access token.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> anyhow::Result<SessionInfo> {
        let response = self
            .http
            .post(self.endpoint("auth/register")?)
            .json(&json!({"username": username, "email": email, "password": password}))
            .send()
            .await?;

        let info: SessionInfo = response.error_for_status()?.json().await?;
        *self.access_token.write().await = Some(info.access_token.clone());
        Ok(info)
    }

    /// Log in; stores the returned access token.
    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<SessionInfo> {
        let response = self
            .http
            .post(self.endpoint("auth/login")?)
            .json(&json!({"email": email, "password": password}))
            .send()
            .await?;

        let info: SessionInfo = response.error_for_status()?.json().await?;
        *self.access_token.write().await = Some(info.access_token.clone());
        Ok(info)
    }

    /// Log out and drop the stored access token.
    pub async fn logout(&self) -> anyhow::Result<()> {
        self.request(Method::GET, "auth/logout", None).await?;
        *self.access_token.write().await = None;
        Ok(())
    }

    /// Exchange the refresh cookie for a new access token.
    ///
    /// Returns None if the server refuses (no cookie, expired, or rotated
    /// away).
    async fn refresh(&self) -> anyhow::Result<Option<String>> {
        let response = self.http.get(self.endpoint("auth/refresh-token")?).send().await?;

        if response.status() != StatusCode::OK {
            return Ok(None);
        }

        let body: RefreshBody = response.json().await?;
        *self.access_token.write().await = Some(body.access_token.clone());
        Ok(Some(body.access_token))
    }

    /// Perform a request with the bearer token attached; on a 401, refresh
    /// once and replay once.
    pub async fn request(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> anyhow::Result<reqwest::Response> {
        let url = self.endpoint(path)?;

        let send = |token: Option<String>| {
            let mut builder = self.http.request(method.clone(), url.clone());
            if let Some(token) = token {
                builder = builder.bearer_auth(token);
            }
            if let Some(body) = body.clone() {
                builder = builder.json(&body);
            }
            builder.send()
        };

        let token = self.access_token.read().await.clone();
        let response = send(token).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // One refresh attempt, one replay. A second 401 is returned as-is.
        match self.refresh().await? {
            Some(new_token) => Ok(send(Some(new_token)).await?),
            None => Ok(response),
        }
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<reqwest::Response> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: serde_json::Value) -> anyhow::Result<reqwest::Response> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: serde_json::Value) -> anyhow::Result<reqwest::Response> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<reqwest::Response> {
        self.request(Method::DELETE, path, None).await
    }
}
