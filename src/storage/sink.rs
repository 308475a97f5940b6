//! SQLite-backed record sink.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{Row, SqlitePool};

use crate::error_handling::{DatabaseError, SinkError};
use crate::models::DatasetRecord;
use crate::orchestrator::RecordSink;

/// Appends dataset records of one run to the `dataset_items` table.
///
/// Every record gets the next sequence number of the run, so reading back in
/// `seq` order reproduces the order the records were written in.
pub struct SqliteRecordSink {
    pool: Arc<SqlitePool>,
    run_id: String,
    next_seq: AtomicI64,
}

impl SqliteRecordSink {
    pub fn new(pool: Arc<SqlitePool>, run_id: impl Into<String>) -> Self {
        Self {
            pool,
            run_id: run_id.into(),
            next_seq: AtomicI64::new(0),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

#[async_trait]
impl RecordSink for SqliteRecordSink {
    async fn append(&self, record: &DatasetRecord) -> Result<(), SinkError> {
        let data = serde_json::to_string(record)?;
        let (record_type, target, success, timestamp) = match record {
            DatasetRecord::Item(item) => (
                "item",
                Some(item.target()),
                Some(item.is_success()),
                item.timestamp(),
            ),
            DatasetRecord::Summary { summary } => {
                ("summary", None, None, summary.finished_at.as_str())
            }
        };
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);

        sqlx::query(
            "INSERT INTO dataset_items (run_id, seq, record_type, target, success, timestamp, data)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.run_id)
        .bind(seq)
        .bind(record_type)
        .bind(target)
        .bind(success)
        .bind(timestamp)
        .bind(&data)
        .execute(self.pool.as_ref())
        .await?;

        log::debug!("Stored {record_type} record #{seq} for run {}", self.run_id);
        Ok(())
    }
}

/// A stored dataset record.
#[derive(Debug, Clone)]
pub struct DatasetItemRow {
    pub seq: i64,
    /// `item` or `summary`.
    pub record_type: String,
    pub target: Option<String>,
    pub success: Option<bool>,
    pub timestamp: String,
    pub data: serde_json::Value,
}

impl DatasetItemRow {
    /// Decodes the stored JSON back into a [`DatasetRecord`].
    pub fn record(&self) -> Result<DatasetRecord, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

/// Returns every record of `run_id` in write order.
pub async fn query_dataset_items(
    pool: &SqlitePool,
    run_id: &str,
) -> Result<Vec<DatasetItemRow>, DatabaseError> {
    let mut rows = sqlx::query(
        "SELECT seq, record_type, target, success, timestamp, data
         FROM dataset_items
         WHERE run_id = ?
         ORDER BY seq, id",
    )
    .bind(run_id)
    .fetch(pool);

    let mut items = Vec::new();
    while let Some(row) = rows.try_next().await? {
        let data: String = row.get("data");
        let data = serde_json::from_str(&data).unwrap_or_else(|e| {
            log::warn!("Stored record for run {run_id} is not valid JSON: {e}");
            serde_json::Value::String(data)
        });
        items.push(DatasetItemRow {
            seq: row.get("seq"),
            record_type: row.get("record_type"),
            target: row.get("target"),
            success: row.get("success"),
            timestamp: row.get("timestamp"),
            data,
        });
    }
    Ok(items)
}
