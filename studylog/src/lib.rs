//! # studylog: a study-session tracking backend
//!
//! `studylog` is a REST/JSON API for a study tracker: users register and log
//! in, categorize their work with tags, log study sessions against those
//! tags, attach reusable study resources to sessions, create quizzes and
//! record attempts, and read a combined event feed for a dashboard or
//! calendar view.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL for all persistence.
//!
//! The **API layer** ([`api`]) exposes public authentication routes under
//! `/auth/*` and the protected management surface under `/api/v1/*`. The
//! **authentication layer** ([`auth`]) issues short-lived JWT access tokens
//! and longer-lived refresh tokens; refresh tokens are persisted server-side
//! (one per user) and rotated on every use, so a replayed old token revokes
//! the session. The **database layer** ([`db`]) uses the repository pattern:
//! each entity has a repository handling queries and mutations, with
//! ownership checks built into the queries themselves.
//!
//! All request handling is synchronous request/response against the
//! connection pool; there are no background jobs or long-lived tasks.
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//! use studylog::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = studylog::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     studylog::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Config;

use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post, put},
};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::config::CorsOrigin;
use crate::openapi::ApiDoc;

/// Application state shared across all request handlers.
///
/// The connection pool is the only shared resource; configuration is
/// read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the studylog database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect to the database and run migrations
#[instrument(skip_all)]
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(settings.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;

    Ok(pool)
}

/// Create the CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .allow_headers([axum::http::header::AUTHORIZATION, axum::http::header::CONTENT_TYPE])
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers;

    // Public authentication routes. The refresh cookie is path-scoped to
    // /auth/refresh-token, so these paths are part of the auth contract.
    let auth_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh-token", get(handlers::auth::refresh_token))
        .route("/auth/logout", get(handlers::auth::logout))
        .with_state(state.clone());

    // Protected API routes; every handler extracts CurrentUser from the
    // bearer access token.
    let api_routes = Router::new()
        .route("/users/me", get(handlers::users::get_user_details))
        .route("/users/me/events", get(handlers::users::get_user_events))
        // Tags
        .route("/tags", get(handlers::tags::list_tags))
        .route("/tags", post(handlers::tags::create_tag))
        .route("/tags/{id}", put(handlers::tags::update_tag))
        .route("/tags/{id}", delete(handlers::tags::delete_tag))
        // Study sessions
        .route("/sessions", get(handlers::sessions::list_sessions))
        .route("/sessions", post(handlers::sessions::create_session))
        .route("/sessions/{id}", get(handlers::sessions::get_session))
        .route("/sessions/{id}", put(handlers::sessions::replace_session))
        .route("/sessions/{id}", delete(handlers::sessions::delete_session))
        .route("/sessions/{id}/resources", get(handlers::sessions::get_session_resources))
        // Study resources
        .route("/resources", get(handlers::resources::list_resources))
        .route("/resources", post(handlers::resources::create_resource))
        .route("/resources/{id}", get(handlers::resources::get_resource))
        .route("/resources/{id}", put(handlers::resources::update_resource))
        .route("/resources/{id}", delete(handlers::resources::delete_resource))
        // Quizzes and attempts. The attempts/{id} routes are registered
        // before the {id} routes so the literal segment wins.
        .route("/quizzes", get(handlers::quizzes::list_quizzes))
        .route("/quizzes", post(handlers::quizzes::create_quiz))
        .route("/quizzes/attempts/{id}", get(handlers::quizzes::get_quiz_attempt))
        .route("/quizzes/attempts/{id}", delete(handlers::quizzes::delete_quiz_attempt))
        .route("/quizzes/{id}", get(handlers::quizzes::get_quiz))
        .route("/quizzes/{id}", put(handlers::quizzes::update_quiz))
        .route("/quizzes/{id}", delete(handlers::quizzes::delete_quiz))
        .route("/quizzes/{id}/attempts", post(handlers::quizzes::create_quiz_attempt))
        .route("/quizzes/{id}/attempts", get(handlers::quizzes::list_quiz_attempts))
        // Challenges (one per user, addressed without an id)
        .route("/challenges", get(handlers::challenges::get_challenge))
        .route("/challenges", put(handlers::challenges::upsert_challenge))
        .route("/challenges", delete(handlers::challenges::delete_challenge))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the database and runs
///    migrations
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = setup_database(&config).await?;
        Self::with_pool(config, pool)
    }

    /// Create an application over an existing pool (used by tests, which
    /// manage their own per-test databases)
    pub fn with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let state = AppState {
            db: pool.clone(),
            config: config.clone(),
        };
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// The assembled router (used by tests)
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("studylog listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
