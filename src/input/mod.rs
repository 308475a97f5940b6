//! Batch input loading and validation.
//!
//! The input is a JSON document (file or stdin) using camelCase keys:
//!
//! ```json
//! {
//!   "profileUrls": ["https://www.linkedin.com/in/someone"],
//!   "scrapingOptions": { "delayBetweenRequestsMs": 2500 },
//!   "outputOptions": { "saveToDataset": true, "generateReport": true },
//!   "email": "optional",
//!   "password": "optional"
//! }
//! ```
//!
//! Validation is fail-fast: any structural problem yields
//! [`BatchError::InvalidInput`] before a single target is fetched. Individual
//! targets are only trimmed here; whether they are usable URLs is the fetcher's call.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde_json::{Map, Value};
use tokio::io::AsyncReadExt;

use crate::error_handling::BatchError;
use crate::models::{
    default_report_file_name, BatchRequest, Credentials, OutputOptions, ScrapingOptions,
};

/// Keys accepted for the target list, in lookup order.
const TARGET_KEYS: &[&str] = &["profileUrls", "targets"];

/// Reads the raw input document from a file, or from stdin when `path` is `-`.
pub async fn load_input(path: &Path) -> Result<Value> {
    let raw = if path.as_os_str() == "-" {
        info!("Reading input from stdin");
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read input from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    };

    let value = serde_json::from_str(&raw)
        .map_err(|e| BatchError::InvalidInput(format!("input is not valid JSON: {e}")))?;
    Ok(value)
}

/// Builds a [`BatchRequest`] from a raw input document.
///
/// # Errors
///
/// Returns [`BatchError::InvalidInput`] if the document is not an object, the
/// target list is missing, not an array, empty, or contains an entry that is not
/// a non-blank string, or if an options block has the wrong shape.
pub fn parse_batch_request(input: &Value) -> Result<BatchRequest, BatchError> {
    let obj = input
        .as_object()
        .ok_or_else(|| BatchError::InvalidInput("input must be a JSON object".to_string()))?;

    let raw_targets = TARGET_KEYS
        .iter()
        .find_map(|key| obj.get(*key).filter(|value| !value.is_null()))
        .ok_or_else(|| {
            BatchError::InvalidInput(
                "profileUrls is required and must be an array with at least 1 URL".to_string(),
            )
        })?;
    let targets = parse_targets(raw_targets)?;

    let options: ScrapingOptions = parse_section(obj.get("scrapingOptions"), "scrapingOptions")?;
    let mut output_options: OutputOptions =
        parse_section(obj.get("outputOptions"), "outputOptions")?;
    if output_options.report_file_name.trim().is_empty() {
        output_options.report_file_name = default_report_file_name(chrono::Utc::now().date_naive());
    }

    let credentials: Credentials = serde_json::from_value(input.clone())
        .map_err(|e| BatchError::InvalidInput(format!("invalid credential fields: {e}")))?;

    Ok(BatchRequest {
        targets,
        options,
        output_options,
        credentials,
    })
}

fn parse_targets(raw: &Value) -> Result<Vec<String>, BatchError> {
    let entries = raw.as_array().ok_or_else(|| {
        BatchError::InvalidInput("profileUrls must be an array of strings".to_string())
    })?;
    if entries.is_empty() {
        return Err(BatchError::InvalidInput(
            "profileUrls must contain at least 1 URL".to_string(),
        ));
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| match entry.as_str().map(str::trim) {
            Some(target) if !target.is_empty() => Ok(target.to_string()),
            Some(_) => Err(BatchError::InvalidInput(format!(
                "profileUrls[{index}] is blank"
            ))),
            None => Err(BatchError::InvalidInput(format!(
                "profileUrls[{index}] must be a string"
            ))),
        })
        .collect()
}

fn parse_section<T>(raw: Option<&Value>, name: &str) -> Result<T, BatchError>
where
    T: serde::de::DeserializeOwned + Default,
{
    match raw {
        None | Some(Value::Null) => Ok(T::default()),
        // A null field means "use the default", same as an absent one.
        Some(Value::Object(fields)) => {
            let present: Map<String, Value> = fields
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            serde_json::from_value(Value::Object(present))
                .map_err(|e| BatchError::InvalidInput(format!("invalid {name}: {e}")))
        }
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| BatchError::InvalidInput(format!("invalid {name}: {e}"))),
    }
}

/// Logs what was received without revealing credential values.
pub fn log_input_summary(request: &BatchRequest) {
    info!(
        "Input received: {} target{}, delay {} ms, saveToDataset={}, generateReport={}, credentials={:?}",
        request.targets.len(),
        if request.targets.len() == 1 { "" } else { "s" },
        request.options.delay_between_requests_ms,
        request.output_options.save_to_dataset,
        request.output_options.generate_report,
        request.credentials
    );
}
