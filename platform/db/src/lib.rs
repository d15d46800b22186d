//! Storage primitives: the key-value store abstraction and its backends,
//! plus connection settings for the SQL backend.

mod store;

use std::path::PathBuf;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::info;

pub use store::{DbStore, FileStore, KeyValueStore, MemoryStore};

/// Shared sea-orm connection alias.
pub type DbPool = DatabaseConnection;

/// Used when `DATABASE_URL` is not set. `mode=rwc` creates the file on first use.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://employees.db?mode=rwc";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("stored value for {0:?} is not valid UTF-8")]
    InvalidUtf8(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Connection settings for the SQL backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseSettings {
    url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_URL)
    }
}

impl DatabaseSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Reads `DATABASE_URL` through `lookup`; blank or missing means the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Where the employee list is persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local map; contents vanish on exit.
    Memory,
    /// One JSON file per key under the given directory.
    File(PathBuf),
    /// A `kv_entries` table reached through sea-orm.
    Database(DatabaseSettings),
}

impl StoreBackend {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::File(_) => "file",
            StoreBackend::Database(_) => "database",
        }
    }
}

/// Open a connection for the SQL backend.
pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let mut options = ConnectOptions::new(settings.url().to_owned());
    options.sqlx_logging(false);
    // Every connection to an in-memory SQLite URL opens its own database.
    if settings.url().contains(":memory:") {
        options.max_connections(1);
    }
    let pool = Database::connect(options).await?;
    info!(backend = ?pool.get_database_backend(), "database connected");
    Ok(pool)
}
