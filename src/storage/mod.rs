//! SQLite storage.
//!
//! This module provides:
//! - Connection pool setup and schema migrations
//! - Run metadata and final statistics
//! - [`SqliteRecordSink`], the append-only dataset
//! - [`SqliteValueStore`] and [`DirectoryValueStore`] for named artifacts

mod migrations;
mod pool;
mod run;
mod sink;
mod value_store;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use migrations::run_migrations;
pub use pool::{checkpoint_wal, init_db_pool_with_path};
pub use run::{
    insert_run_metadata, new_run_id, query_run_history, update_run_stats, RunMetadata, RunStats,
    RunSummary,
};
pub use sink::{query_dataset_items, DatasetItemRow, SqliteRecordSink};
pub use value_store::{DirectoryValueStore, SqliteValueStore, StoredValue};
