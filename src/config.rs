//! Client configuration.
//!
//! A [`ClientConfig`] holds the connection parameters, the prioritized
//! backend chain, and pool tuning. It is immutable once built: the builder
//! methods consume and return the value, and nothing mutates it afterwards.

use crate::db::backend::Backend;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_USER: &str = "root";

// Pool configuration defaults
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MAX_CONNECTIONS_SQLITE: u32 = 1;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

// Write defaults
pub const DEFAULT_WRITE_CHUNK_ROWS: usize = 50_000;

/// Width used for a text column whose values are all NULL when no ceiling
/// was supplied to [`crate::Table::text_widths`].
pub const DEFAULT_TEXT_WIDTH: u32 = 255;

/// Connection pool tuning options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolOptions {
    /// Maximum connections in the pool (default: 5, or 1 for SQLite).
    pub max_connections: Option<u32>,
    /// Minimum connections in the pool (default: 1).
    pub min_connections: Option<u32>,
    /// Connection acquire timeout in seconds (default: 30).
    pub acquire_timeout_secs: Option<u64>,
    /// Idle timeout in seconds (default: 600).
    pub idle_timeout_secs: Option<u64>,
}

impl PoolOptions {
    pub fn max_connections_or_default(&self, is_sqlite: bool) -> u32 {
        self.max_connections.unwrap_or(if is_sqlite {
            DEFAULT_MAX_CONNECTIONS_SQLITE
        } else {
            DEFAULT_MAX_CONNECTIONS
        })
    }

    pub fn min_connections_or_default(&self) -> u32 {
        self.min_connections.unwrap_or(DEFAULT_MIN_CONNECTIONS)
    }

    pub fn acquire_timeout_or_default(&self) -> u64 {
        self.acquire_timeout_secs
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS)
    }

    pub fn idle_timeout_or_default(&self) -> u64 {
        self.idle_timeout_secs.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS)
    }
}

/// Connection parameters and backend chain for a [`crate::TableClient`].
///
/// The database name is not part of the configuration; it is supplied per
/// operation, and each operation binds a fresh connection to
/// `(config, database)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Contains sensitive data - never log
    #[serde(skip_serializing)]
    pub password: String,
    /// Prioritized backend chain tried in order at connect time.
    pub backends: Vec<Backend>,
    #[serde(default)]
    pub pool: PoolOptions,
}

impl ClientConfig {
    /// Create a configuration with the default backend chain (`[MySql]`).
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            backends: vec![Backend::MySql],
            pool: PoolOptions::default(),
        }
    }

    /// Replace the backend chain. Backends are attempted in the given order
    /// until one connects.
    pub fn with_backends(mut self, backends: Vec<Backend>) -> Self {
        self.backends = backends;
        self
    }

    /// Replace the pool tuning options.
    pub fn with_pool(mut self, pool: PoolOptions) -> Self {
        self.pool = pool;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER, "")
    }
}
