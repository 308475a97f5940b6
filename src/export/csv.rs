//! CSV report export.
//!
//! One row per result. Fixed columns come first, followed by the union of the
//! top-level payload keys of successful results in first-seen order.

use async_trait::async_trait;
use csv::Writer;
use serde_json::Value;

use crate::error_handling::ExportError;
use crate::models::ItemResult;
use crate::orchestrator::{ReportArtifact, ReportExporter};

/// Content type of the generated artifact.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

const FIXED_COLUMNS: [&str; 5] = ["target", "status", "timestamp", "error_message", "error_type"];

/// Column holding payloads that are not JSON objects.
const RAW_PAYLOAD_COLUMN: &str = "payload";

/// Exports results as CSV.
#[derive(Debug, Clone, Default)]
pub struct CsvReportExporter;

impl CsvReportExporter {
    pub fn new() -> Self {
        Self
    }

    /// Encodes `records` into CSV bytes.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] if a row cannot be written or flushed.
    pub fn to_csv(&self, records: &[ItemResult]) -> Result<Vec<u8>, ExportError> {
        let payload_columns = payload_columns(records);

        let mut writer = Writer::from_writer(Vec::new());
        let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
        header.extend(payload_columns.iter().map(|key| column_name(key)));
        writer.write_record(&header)?;

        for record in records {
            let mut row: Vec<String> = Vec::with_capacity(header.len());
            row.push(record.target().to_string());
            row.push(if record.is_success() { "success" } else { "failure" }.to_string());
            row.push(record.timestamp().to_string());
            match record {
                ItemResult::Success { payload, .. } => {
                    row.push(String::new());
                    row.push(String::new());
                    for key in &payload_columns {
                        row.push(payload_cell(payload, key)?);
                    }
                }
                ItemResult::Failure {
                    error_message,
                    error_type,
                    ..
                } => {
                    row.push(error_message.clone());
                    row.push(error_type.clone());
                    row.extend(std::iter::repeat(String::new()).take(payload_columns.len()));
                }
            }
            writer.write_record(&row)?;
        }

        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| ExportError::IoError(e.into_error()))
    }
}

#[async_trait]
impl ReportExporter for CsvReportExporter {
    async fn generate(&self, records: &[ItemResult]) -> Result<ReportArtifact, ExportError> {
        let bytes = self.to_csv(records)?;
        log::debug!(
            "Generated CSV report: {} row(s), {} bytes",
            records.len(),
            bytes.len()
        );
        Ok(ReportArtifact {
            bytes,
            content_type: CSV_CONTENT_TYPE.to_string(),
        })
    }
}

/// Payload keys in first-seen order. Non-object payloads share one raw column.
fn payload_columns(records: &[ItemResult]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        let ItemResult::Success { payload, .. } = record else {
            continue;
        };
        match payload {
            Value::Object(map) => {
                for key in map.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
            Value::Null => {}
            _ => {
                if !columns.iter().any(|c| c == RAW_PAYLOAD_COLUMN) {
                    columns.push(RAW_PAYLOAD_COLUMN.to_string());
                }
            }
        }
    }
    columns
}

/// Payload keys that clash with a fixed column get a `payload.` prefix.
fn column_name(key: &str) -> String {
    if FIXED_COLUMNS.contains(&key) {
        format!("payload.{key}")
    } else {
        key.to_string()
    }
}

fn payload_cell(payload: &Value, key: &str) -> Result<String, ExportError> {
    let value = match payload {
        Value::Object(map) => map.get(key),
        Value::Null => None,
        other if key == RAW_PAYLOAD_COLUMN => Some(other),
        _ => None,
    };
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested) => serde_json::to_string(nested)?,
    })
}
