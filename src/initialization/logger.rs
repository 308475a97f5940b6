//! Logger initialization.
//!
//! This module provides functions to initialize the logger with custom formatting.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Initializes the logger on stderr with the specified level and format.
///
/// The logger reads `RUST_LOG` first; `level` then overrides the global level
/// and the level of this crate, so `--log-level` always wins while per-module
/// directives for dependencies still apply.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// # Quick debugging without CLI args
/// RUST_LOG=debug profile_harvest input.json
///
/// # Per-module filtering
/// RUST_LOG=profile_harvest=debug,reqwest=info profile_harvest input.json
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);
    let mut builder = configured_builder(level, format);
    builder.try_init().map_err(InitializationError::from)?;
    Ok(())
}

/// Initializes the logger writing to `path` (appending) instead of stderr.
///
/// Colors are disabled since the output is not a terminal.
///
/// # Errors
///
/// Returns `InitializationError::LoggerSetupError` if the file cannot be
/// opened, `LoggerError` if a logger is already installed.
pub fn init_logger_to_file(
    level: LevelFilter,
    format: LogFormat,
    path: &Path,
) -> Result<(), InitializationError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            InitializationError::LoggerSetupError(format!(
                "Failed to open log file {}: {e}",
                path.display()
            ))
        })?;

    colored::control::set_override(false);
    let mut builder = configured_builder(level, format);
    builder.target(env_logger::Target::Pipe(Box::new(file)));
    builder.try_init().map_err(InitializationError::from)?;
    Ok(())
}

fn configured_builder(level: LevelFilter, format: LogFormat) -> env_logger::Builder {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("sqlx", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("hyper_util", LevelFilter::Info);
    builder.filter_module("profile_harvest", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                    chrono::Utc::now().timestamp_millis(),
                    record.level(),
                    record.target(),
                    serde_json::to_string(&record.args().to_string())
                        .unwrap_or_else(|_| "\"\"".into())
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = record.level();
                let colored_level = match level {
                    log::Level::Error => level.to_string().red(),
                    log::Level::Warn => level.to_string().yellow(),
                    log::Level::Info => level.to_string().green(),
                    log::Level::Debug => level.to_string().blue(),
                    log::Level::Trace => level.to_string().purple(),
                };

                let emoji = match level {
                    log::Level::Error => "❌",
                    log::Level::Warn => "⚠️",
                    log::Level::Info => "✔️",
                    log::Level::Debug => "🔍",
                    log::Level::Trace => "🔬",
                };

                writeln!(
                    buf,
                    "{} {} [{}] {}",
                    emoji,
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }

    builder
}
