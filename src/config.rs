//! Connection settings for the feeds store.
//!
//! Settings come from the environment, optionally seeded from a `.env` file:
//!
//! | Variable | Default |
//! |---|---|
//! | `FEEDS_DATABASE_URL` (falls back to `DATABASE_URL`) | required |
//! | `FEEDS_DB_MAX_CONNECTIONS` | 10 |
//! | `FEEDS_DB_CONNECTION_TIMEOUT_SECS` | 30 |
//!
//! The store itself never reads configuration; callers build the pool here
//! (or anywhere else) and hand it to
//! [`PostgresFeedsStore`](crate::feeds::adapters::postgres::PostgresFeedsStore).

use crate::feeds::adapters::postgres::{FeedsPgPool, PostgresFeedsStore};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Primary variable holding the database URL.
pub const DATABASE_URL_VAR: &str = "FEEDS_DATABASE_URL";
/// Fallback variable holding the database URL.
pub const FALLBACK_DATABASE_URL_VAR: &str = "DATABASE_URL";
/// Variable holding the maximum pool size.
pub const MAX_CONNECTIONS_VAR: &str = "FEEDS_DB_MAX_CONNECTIONS";
/// Variable holding the connection checkout timeout in seconds.
pub const CONNECTION_TIMEOUT_VAR: &str = "FEEDS_DB_CONNECTION_TIMEOUT_SECS";

/// Errors raised while loading settings or building a pool.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither database URL variable was set to a non-empty value.
    #[error("database URL is not configured (set FEEDS_DATABASE_URL or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// A variable held a value that could not be used.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Rejected value.
        value: String,
    },

    /// The connection pool could not be built.
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: String,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection checkout timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

impl StoreConfig {
    /// Creates settings for `database_url` with default pool sizing.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: default_max_connections(),
            connection_timeout_secs: default_connection_timeout(),
        }
    }

    /// Loads settings from the process environment after reading `.env`.
    ///
    /// Variables already set in the environment win over `.env` entries.
    ///
    /// # Errors
    ///
    /// See [`Self::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded .env from {}", path.display()),
            Err(err) => debug!("No .env loaded: {err}"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when no URL is set and
    /// [`ConfigError::InvalidValue`] for unparsable or zero numbers.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = non_empty(DATABASE_URL_VAR)
            .or_else(|| non_empty(FALLBACK_DATABASE_URL_VAR))
            .ok_or(ConfigError::MissingDatabaseUrl)?;

        let max_connections = match non_empty(MAX_CONNECTIONS_VAR) {
            Some(value) => parse_positive(MAX_CONNECTIONS_VAR, &value)?,
            None => default_max_connections(),
        };

        let connection_timeout_secs = match non_empty(CONNECTION_TIMEOUT_VAR) {
            Some(value) => parse_positive(CONNECTION_TIMEOUT_VAR, &value)?,
            None => default_connection_timeout(),
        };

        Ok(Self {
            database_url,
            max_connections,
            connection_timeout_secs,
        })
    }

    /// Returns the connection checkout timeout.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Builds a connection pool from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pool`] when the initial connections cannot be
    /// established, or [`ConfigError::InvalidValue`] for a zero pool size.
    pub fn build_pool(&self) -> Result<FeedsPgPool, ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: MAX_CONNECTIONS_VAR,
                value: self.max_connections.to_string(),
            });
        }
        let manager = ConnectionManager::<PgConnection>::new(self.database_url.as_str());
        let pool = Pool::builder()
            .max_size(self.max_connections)
            .connection_timeout(self.connection_timeout())
            .build(manager)?;
        Ok(pool)
    }

    /// Builds a pool and wraps it in a [`PostgresFeedsStore`].
    ///
    /// # Errors
    ///
    /// See [`Self::build_pool`].
    pub fn connect(&self) -> Result<PostgresFeedsStore, ConfigError> {
        Ok(PostgresFeedsStore::new(self.build_pool()?))
    }
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connection_timeout() -> u64 {
    30
}

fn parse_positive<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    value
        .trim()
        .parse::<T>()
        .ok()
        .filter(|parsed| *parsed != T::default())
        .ok_or_else(|| ConfigError::InvalidValue {
            key,
            value: value.to_owned(),
        })
}
