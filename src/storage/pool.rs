//! Database connection pool management.
//!
//! This module initializes and configures the SQLite connection pool with:
//! - WAL mode enabled
//! - Automatic database file creation

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};
use sqlx::{Pool, Sqlite, SqlitePool};

use crate::config::WAL_CHECKPOINT_TIMEOUT;
use crate::error_handling::DatabaseError;

/// Initializes and returns a database connection pool for `db_path`.
///
/// Creates the database file if it doesn't exist and enables WAL mode so
/// records written mid-run are durable without blocking readers.
pub async fn init_db_pool_with_path(db_path: &Path) -> Result<Arc<Pool<Sqlite>>, DatabaseError> {
    let db_path_str = db_path.to_string_lossy().to_string();
    match OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(db_path)
    {
        Ok(_) => info!("Database file created: {db_path_str}"),
        Err(ref e) if e.kind() == ErrorKind::AlreadyExists => {
            info!("Using existing database: {db_path_str}")
        }
        Err(e) => {
            error!("Failed to create database file: {e}");
            return Err(DatabaseError::FileCreationError(format!(
                "{db_path_str}: {e}"
            )));
        }
    }

    let pool = SqlitePool::connect(&format!("sqlite:{db_path_str}"))
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {e}");
            DatabaseError::SqlError(e)
        })?;

    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await
        .map_err(|e| {
            error!("Failed to set WAL mode: {e}");
            DatabaseError::SqlError(e)
        })?;

    Ok(Arc::new(pool))
}

/// Checkpoints the WAL into the main database file.
///
/// Bounded by `WAL_CHECKPOINT_TIMEOUT`. Failure only leaves the `-wal` file
/// behind, so it is logged rather than returned.
pub async fn checkpoint_wal(pool: &SqlitePool) {
    match tokio::time::timeout(
        WAL_CHECKPOINT_TIMEOUT,
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)").execute(pool),
    )
    .await
    {
        Ok(Ok(_)) => log::debug!("WAL checkpoint completed"),
        Ok(Err(e)) => warn!("Failed to checkpoint WAL: {e}"),
        Err(_) => warn!(
            "WAL checkpoint timed out after {}s",
            WAL_CHECKPOINT_TIMEOUT.as_secs()
        ),
    }
}
