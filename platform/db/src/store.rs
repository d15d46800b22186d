use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use chrono::Utc;
use entity::kv_entries;
use sea_orm::{ActiveValue::Set, EntityTrait, sea_query::OnConflict};
use tracing::debug;

use crate::{DbError, DbPool, DbResult};

/// String-keyed durable storage holding opaque text values.
///
/// Implementations only move bytes; interpreting the value (JSON, schema
/// checks) is the caller's business.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns `None` when the key has never been written or was removed.
    async fn get(&self, key: &str) -> DbResult<Option<String>>;

    /// Replaces whatever was stored under `key`.
    async fn set(&self, key: &str, value: &str) -> DbResult<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> DbResult<()>;
}

/// In-process backend used by tests and the `memory` store setting.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a key, e.g. with a hand-written payload.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::default();
        store.lock().insert(key.into(), value.into());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> DbResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Keeps each key in `<root>/<key>.json`.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// The directory is created lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> DbResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DbError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| DbError::InvalidUtf8(key.to_owned())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root).await?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, value).await?;
        tokio::fs::rename(&staging, &path).await?;
        debug!(path = %path.display(), bytes = value.len(), "store file written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> DbResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Rows of the `kv_entries` table; works against SQLite and Postgres.
#[derive(Clone, Debug)]
pub struct DbStore {
    pool: DbPool,
}

impl DbStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for DbStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let row = kv_entries::Entity::find_by_id(key.to_owned())
            .one(&self.pool)
            .await?;
        Ok(row.map(|model| model.value))
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        let model = kv_entries::ActiveModel {
            key: Set(key.to_owned()),
            value: Set(value.to_owned()),
            updated_at: Set(Utc::now().into()),
        };
        kv_entries::Entity::insert(model)
            .on_conflict(
                OnConflict::column(kv_entries::Column::Key)
                    .update_columns([kv_entries::Column::Value, kv_entries::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> DbResult<()> {
        kv_entries::Entity::delete_by_id(key.to_owned())
            .exec(&self.pool)
            .await?;
        Ok(())
    }
}
