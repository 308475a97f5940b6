//! Data model of a batch run.
//!
//! A [`BatchRequest`] is built once by the input layer and never mutated. The
//! orchestrator produces one [`ItemResult`] per processed target and a single
//! [`BatchSummary`] at the end; both reach the record sink wrapped in a
//! [`DatasetRecord`].

use std::time::Duration;

use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{
    DEFAULT_DELAY_BETWEEN_REQUESTS_MS, DEFAULT_ITEM_TIMEOUT_SECS, REPORT_FILE_PREFIX,
};

/// Current UTC time as an RFC 3339 / ISO-8601 string with millisecond precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Default report file name for a given date, e.g. `profiles-report-2026-10-16.csv`.
pub fn default_report_file_name(date: NaiveDate) -> String {
    format!("{}-{}.csv", REPORT_FILE_PREFIX, date.format("%Y-%m-%d"))
}

/// A validated batch of targets plus everything needed to process them.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Targets in processing order. Never empty once validated.
    pub targets: Vec<String>,
    pub options: ScrapingOptions,
    pub output_options: OutputOptions,
    pub credentials: Credentials,
}

/// Options that shape how targets are acquired.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapingOptions {
    /// Pause between two consecutive targets. Zero disables pacing.
    pub delay_between_requests_ms: u64,
    /// Upper bound on a single fetch, retries included.
    pub item_timeout_secs: u64,
    /// Fetcher-specific options passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ScrapingOptions {
    fn default() -> Self {
        Self {
            delay_between_requests_ms: DEFAULT_DELAY_BETWEEN_REQUESTS_MS,
            item_timeout_secs: DEFAULT_ITEM_TIMEOUT_SECS,
            extra: Map::new(),
        }
    }
}

impl ScrapingOptions {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests_ms)
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }
}

/// Options that control what the run emits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputOptions {
    /// Append every item result to the record sink as soon as it is known.
    pub save_to_dataset: bool,
    /// Build the spreadsheet report after the loop.
    pub generate_report: bool,
    /// Key under which the report is stored.
    pub report_file_name: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            save_to_dataset: true,
            generate_report: true,
            report_file_name: default_report_file_name(Utc::now().date_naive()),
        }
    }
}

/// Opaque credentials handed to the fetcher.
///
/// Every field is optional; whether any of them is required is up to the fetcher.
/// `Debug` only reveals which fields are present.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
    pub gemini_api_key: Option<String>,
    pub jigsawstack_api_key: Option<String>,
}

impl Credentials {
    pub fn has_login(&self) -> bool {
        self.email.is_some() && self.password.is_some()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("has_email", &self.email.is_some())
            .field("has_password", &self.password.is_some())
            .field("has_gemini_api_key", &self.gemini_api_key.is_some())
            .field("has_jigsawstack_api_key", &self.jigsawstack_api_key.is_some())
            .finish()
    }
}

/// Outcome of processing a single target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemResult {
    Success {
        target: String,
        timestamp: String,
        payload: Value,
    },
    Failure {
        target: String,
        timestamp: String,
        #[serde(rename = "errorMessage")]
        error_message: String,
        #[serde(rename = "errorType")]
        error_type: String,
    },
}

impl ItemResult {
    pub fn target(&self) -> &str {
        match self {
            ItemResult::Success { target, .. } | ItemResult::Failure { target, .. } => target,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            ItemResult::Success { timestamp, .. } | ItemResult::Failure { timestamp, .. } => {
                timestamp
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemResult::Success { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ItemResult::Success { .. } => None,
            ItemResult::Failure { error_message, .. } => Some(error_message),
        }
    }
}

/// Aggregate outcome of a run. Persisted as the terminal dataset record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Targets attempted (equals the request length unless the run was cancelled).
    pub total_targets: usize,
    pub successful: usize,
    pub failed: usize,
    /// `100 * successful / total_targets`, rounded to one decimal.
    pub success_rate_percent: f64,
    pub finished_at: String,
    pub version: String,
    /// Targets never attempted because the run was cancelled.
    pub skipped: usize,
    pub cancelled: bool,
    /// Key of the stored report, when one was generated and stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_file_name: Option<String>,
}

/// A record handed to the record sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetRecord {
    Item(ItemResult),
    Summary { summary: BatchSummary },
}

impl DatasetRecord {
    /// Short label used in logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            DatasetRecord::Item(item) => item.target().to_string(),
            DatasetRecord::Summary { .. } => "summary".to_string(),
        }
    }
}
