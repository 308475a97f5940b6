//! Named artifact storage.
//!
//! [`SqliteValueStore`] keeps artifacts next to the dataset of the run,
//! [`DirectoryValueStore`] writes them as plain files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::error_handling::StoreError;
use crate::orchestrator::ValueStore;
use crate::utils::sanitize_key;

/// A stored artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Stores artifacts in the `key_value_records` table, scoped to one run.
///
/// Storing under an existing key replaces the previous value.
pub struct SqliteValueStore {
    pool: Arc<SqlitePool>,
    run_id: String,
}

impl SqliteValueStore {
    pub fn new(pool: Arc<SqlitePool>, run_id: impl Into<String>) -> Self {
        Self {
            pool,
            run_id: run_id.into(),
        }
    }

    /// Reads an artifact back.
    pub async fn get_value(&self, name: &str) -> Result<Option<StoredValue>, StoreError> {
        let row = sqlx::query(
            "SELECT content_type, value FROM key_value_records WHERE run_id = ? AND key = ?",
        )
        .bind(&self.run_id)
        .bind(name)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|row| StoredValue {
            content_type: row.get("content_type"),
            bytes: row.get("value"),
        }))
    }
}

#[async_trait]
impl ValueStore for SqliteValueStore {
    async fn set_value(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidKey("empty key".to_string()));
        }

        sqlx::query(
            "INSERT INTO key_value_records (run_id, key, content_type, value, created_at_ms)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(run_id, key) DO UPDATE SET
                 content_type=excluded.content_type,
                 value=excluded.value,
                 created_at_ms=excluded.created_at_ms",
        )
        .bind(&self.run_id)
        .bind(name)
        .bind(content_type)
        .bind(bytes)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(self.pool.as_ref())
        .await?;

        log::debug!("Stored {name} ({content_type}, {} bytes)", bytes.len());
        Ok(())
    }
}

/// Writes artifacts as files inside a directory.
///
/// The key is sanitized into a single safe file name, so a key can never
/// escape the directory. The content type is not recorded.
pub struct DirectoryValueStore {
    dir: PathBuf,
}

impl DirectoryValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the artifact named `name` is written to.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        let file_name = sanitize_key(name)
            .ok_or_else(|| StoreError::InvalidKey(format!("'{name}' has no usable characters")))?;
        Ok(self.dir.join(file_name))
    }
}

#[async_trait]
impl ValueStore for DirectoryValueStore {
    async fn set_value(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, bytes).await?;
        log::debug!(
            "Wrote {} ({content_type}, {} bytes)",
            path.display(),
            bytes.len()
        );
        Ok(())
    }
}
