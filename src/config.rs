// src/config.rs
use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::poll::{VisibilityPolicy, DEFAULT_LATEST_LIMIT};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3030`).
    pub port: u16,
    /// PostgreSQL URL. When unset the server keeps polls in memory.
    pub database_url: Option<String>,
    /// Pool size (default: `5`).
    pub db_max_connections: u32,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Questions shown on the index page (default: `5`).
    pub latest_questions_limit: i64,
    pub visibility: VisibilityPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3030`                  |
    /// | `DATABASE_URL`              | unset (in-memory)       |
    /// | `DB_MAX_CONNECTIONS`        | `5`                     |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                    |
    /// | `LATEST_QUESTIONS_LIMIT`    | `5`                     |
    /// | `RESULTS_REQUIRE_PUBLISHED` | `false`                 |
    /// | `VOTES_REQUIRE_PUBLISHED`   | `false`                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port: parse_var("PORT", 3030)?,
            database_url,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            cors_origins,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 30)?,
            latest_questions_limit: parse_var("LATEST_QUESTIONS_LIMIT", DEFAULT_LATEST_LIMIT)?,
            visibility: VisibilityPolicy {
                results_require_published: parse_var("RESULTS_REQUIRE_PUBLISHED", false)?,
                votes_require_published: parse_var("VOTES_REQUIRE_PUBLISHED", false)?,
            },
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            database_url: None,
            db_max_connections: 5,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_secs: 30,
            latest_questions_limit: DEFAULT_LATEST_LIMIT,
            visibility: VisibilityPolicy::default(),
        }
    }
}

fn parse_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
