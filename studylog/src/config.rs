//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `STUDYLOG_CONFIG`
//! environment variable.
//!
//! ## Loading priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - base configuration (default: `config.yaml`)
//! 2. **Environment variables** - variables prefixed with `STUDYLOG_` override YAML values
//! 3. **DATABASE_URL** - special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `STUDYLOG_AUTH__SECURITY__ACCESS_TOKEN_SECRET=...` sets `auth.security.access_token_secret`.
//!
//! ## Key sections
//!
//! - **Server**: `host`, `port`
//! - **Database**: `database.url`, `database.pool`
//! - **Auth**: token secrets and expiries under `auth.security`, password rules under
//!   `auth.password`, refresh cookie attributes under `auth.refresh_cookie`
//! - **CORS**: `auth.security.cors.allowed_origins`
//! - **Telemetry**: `enable_otel_export`

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "STUDYLOG_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            enable_otel_export: false,
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection string for the database
    pub url: String,
    /// Connection pool settings
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/studylog".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

/// Individual pool configuration with SQLx parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Password validation rules
    pub password: PasswordConfig,
    /// Refresh token cookie attributes
    pub refresh_cookie: RefreshCookieConfig,
    /// Token secrets, expiries and CORS
    pub security: SecurityConfig,
}

/// Password validation rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// Argon2 memory cost in KiB (default: 19456 KiB = 19 MB)
    pub argon2_memory_kib: u32,
    /// Argon2 iterations (default: 2)
    pub argon2_iterations: u32,
    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 256,
            // Secure defaults for production (Argon2id RFC recommendations)
            argon2_memory_kib: 19456, // 19 MB
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

/// Refresh token cookie attributes.
///
/// The cookie is path-scoped to the refresh endpoint so the browser never
/// sends the long-lived token anywhere else.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefreshCookieConfig {
    /// Cookie name for the refresh token
    pub cookie_name: String,
    /// Set Secure flag on the cookie (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
    /// Path the cookie is scoped to
    pub cookie_path: String,
}

impl Default for RefreshCookieConfig {
    fn default() -> Self {
        Self {
            cookie_name: "refreshToken".to_string(),
            cookie_secure: true,
            cookie_same_site: "none".to_string(),
            cookie_path: "/auth/refresh-token".to_string(),
        }
    }
}

/// Security configuration for tokens and CORS.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Secret for signing access tokens (required for production)
    pub access_token_secret: String,
    /// Secret for signing refresh tokens (required for production)
    pub refresh_token_secret: String,
    /// Access token expiry duration
    #[serde(with = "humantime_serde")]
    pub access_token_expiry: Duration,
    /// Refresh token expiry duration
    #[serde(with = "humantime_serde")]
    pub refresh_token_expiry: Duration,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            access_token_expiry: Duration::from_secs(15 * 60),       // 15 minutes
            refresh_token_expiry: Duration::from_secs(24 * 60 * 60), // 24 hours
            cors: CorsConfig::default(),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                CorsOrigin::Url(Url::parse("http://localhost:5173").unwrap()), // Development frontend (Vite)
            ],
            allow_credentials: true,
            max_age: Some(3600), // Cache preflight for 1 hour
        }
    }
}

/// A single allowed CORS origin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Config {
    /// Load configuration from the YAML file and environment.
    pub fn load(args: &Args) -> Result<Self, Error> {
        let mut figment = Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("STUDYLOG_").split("__"));

        // DATABASE_URL is the conventional override for the connection string
        if let Ok(url) = std::env::var("DATABASE_URL") {
            figment = figment.merge(("database.url", url));
        }

        let config: Config = figment.extract().map_err(|e| Error::Internal {
            operation: format!("load configuration: {e}"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot possibly serve requests safely.
    fn validate(&self) -> Result<(), Error> {
        let security = &self.auth.security;
        if security.access_token_secret.is_empty() || security.refresh_token_secret.is_empty() {
            return Err(Error::Internal {
                operation: "load configuration: access_token_secret and refresh_token_secret must be set".to_string(),
            });
        }
        if security.access_token_secret == security.refresh_token_secret {
            return Err(Error::Internal {
                operation: "load configuration: access and refresh token secrets must differ".to_string(),
            });
        }
        Ok(())
    }

    /// The socket address to bind the HTTP server to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Argon2 parameters from the password section.
    pub fn argon2_params(&self) -> crate::auth::password::Argon2Params {
        crate::auth::password::Argon2Params {
            memory_kib: self.auth.password.argon2_memory_kib,
            iterations: self.auth.password.argon2_iterations,
            parallelism: self.auth.password.argon2_parallelism,
        }
    }
}
